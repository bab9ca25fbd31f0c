//! WebSocket 전송 계층.
//!
//! 감독자는 [`Connector`]를 통해서만 소켓을 엽니다. 기본 구현은
//! `tokio-tungstenite`이며, 허용 목록에 등록된 로컬 IP로 바인딩할 수 있습니다.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::time::Duration;
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{client_async_tls, connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use versifi_core::WebSocketConfig;

/// 송신 절반.
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = ClientError> + Send>>;

/// 수신 절반.
pub type FrameStream = Pin<Box<dyn Stream<Item = ClientResult<Message>> + Send>>;

/// 스트림 엔드포인트에 소켓을 여는 방법.
#[async_trait]
pub trait Connector: Send + Sync {
    /// `url`에 연결하고 송신/수신 절반을 반환합니다.
    async fn connect(&self, url: &str) -> ClientResult<(FrameSink, FrameStream)>;
}

/// `tokio-tungstenite` 기반 커넥터.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    local_addr: Option<IpAddr>,
    handshake_timeout: Duration,
}

impl TungsteniteConnector {
    /// 핸드셰이크 타임아웃으로 생성.
    pub fn new(handshake_timeout: Duration) -> Self {
        Self {
            local_addr: None,
            handshake_timeout,
        }
    }

    /// 설정에서 생성합니다. 해석할 수 없는 `local_addr`는 경고 후 무시합니다.
    pub fn from_config(config: &WebSocketConfig) -> Self {
        let mut connector = Self::new(config.handshake_timeout());
        connector.local_addr = config.local_addr.as_deref().and_then(parse_local_addr);
        connector
    }

    /// 바인딩할 로컬 IP 설정.
    pub fn with_local_addr(mut self, addr: IpAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// 바인딩된 로컬 IP.
    pub fn local_addr(&self) -> Option<IpAddr> {
        self.local_addr
    }

    async fn dial(&self, url: &str) -> ClientResult<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        let Some(local) = self.local_addr else {
            let (ws, _) = connect_async(url).await?;
            return Ok(ws);
        };

        let request = url.into_client_request()?;
        let uri = request.uri();
        let host = uri
            .host()
            .ok_or_else(|| ClientError::Network(format!("URL has no host: {}", url)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri
            .port_u16()
            .unwrap_or(if uri.scheme_str() == Some("wss") { 443 } else { 80 });

        let remote = lookup_host((host.as_str(), port))
            .await
            .map_err(|e| ClientError::Network(format!("DNS lookup failed for {}: {}", host, e)))?
            .find(|addr| addr.is_ipv4() == local.is_ipv4())
            .ok_or_else(|| {
                ClientError::Network(format!("No address of {} matches local {}", host, local))
            })?;

        let socket = if local.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(|e| ClientError::Network(e.to_string()))?;
        socket
            .bind(SocketAddr::new(local, 0))
            .map_err(|e| ClientError::Network(format!("bind {} failed: {}", local, e)))?;
        let stream = socket
            .connect(remote)
            .await
            .map_err(|e| ClientError::Network(format!("connect {} failed: {}", remote, e)))?;

        debug!(%local, %remote, "로컬 주소 바인딩 후 연결");
        let (ws, _) = client_async_tls(request, stream).await?;
        Ok(ws)
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::from_config(&WebSocketConfig::default())
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> ClientResult<(FrameSink, FrameStream)> {
        let ws = tokio::time::timeout(self.handshake_timeout, self.dial(url))
            .await
            .map_err(|_| {
                ClientError::Timeout(format!(
                    "WebSocket handshake exceeded {:?}",
                    self.handshake_timeout
                ))
            })??;

        let (sink, stream) = ws.split();
        let sink = sink.sink_map_err(ClientError::from);
        let stream = stream.map(|msg| msg.map_err(ClientError::from));
        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// 로컬 바인딩 주소를 해석합니다. 실패하면 경고를 남기고 `None`.
pub(crate) fn parse_local_addr(addr: &str) -> Option<IpAddr> {
    match addr.trim().parse::<IpAddr>() {
        Ok(ip) => Some(ip),
        Err(e) => {
            warn!(addr, error = %e, "로컬 주소 해석 실패, 바인딩 없이 연결");
            None
        }
    }
}
