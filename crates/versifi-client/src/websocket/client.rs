//! 스트리밍 연결 감독자.
//!
//! [`WsClient`]는 하나의 WebSocket 세션을 소유하고 다음을 담당합니다:
//! - 연결 및 HMAC 인증 (인증 응답은 호출자 태스크에서 대기)
//! - 수신 루프: 프레임을 토픽 레지스트리로 동기 전달
//! - keepalive: 유휴 타임아웃의 절반 주기로 `{"op":"ping"}` 전송
//! - 연결 끊김 시 에러 핸들러 호출 및 고정 지연 재연결
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use versifi_client::{Credentials, WsClient};
//! use versifi_core::{ExecutionReport, WebSocketConfig};
//!
//! let client = WsClient::new(Credentials::new("key", "secret"), WebSocketConfig::default());
//! client.connect().await?;
//! client
//!     .subscribe_execution_report(|raw| {
//!         println!("{}", String::from_utf8_lossy(raw));
//!     })
//!     .await?;
//! ```

use super::codec::{op, Envelope, Frame, Request, WILDCARD};
use super::registry::TopicRegistry;
use super::transport::{Connector, FrameSink, FrameStream, TungsteniteConnector};
use crate::auth::{AuthChallenge, Credentials};
use crate::error::{ClientError, ClientResult};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use versifi_core::{AppConfig, WebSocketConfig};

/// 연결 끊김 등 비동기 에러를 받는 핸들러.
pub type ErrorHandler = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// 연결 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 연결 없음
    Disconnected,
    /// 소켓 연결 중
    Connecting,
    /// 소켓 연결됨, 인증 전
    Connected,
    /// 인증 응답 대기 중
    Authenticating,
    /// 인증 완료
    Authenticated,
}

impl ConnectionState {
    /// 소켓이 열려 있는지 확인.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected
                | ConnectionState::Authenticating
                | ConnectionState::Authenticated
        )
    }

    /// 인증까지 완료되었는지 확인.
    pub fn is_authenticated(&self) -> bool {
        *self == ConnectionState::Authenticated
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Authenticating => "authenticating",
            ConnectionState::Authenticated => "authenticated",
        };
        write!(f, "{}", s)
    }
}

/// 소켓 송신 절반과 상태. 하나의 잠금으로 보호됩니다.
struct Session {
    state: ConnectionState,
    sink: Option<FrameSink>,
    cancel: Option<CancellationToken>,
    /// 세션마다 증가. 이전 세션 태스크의 늦은 보고를 걸러냅니다.
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            sink: None,
            cancel: None,
            generation: 0,
            tasks: Vec::new(),
        }
    }

    async fn send(&mut self, request: &Request) -> ClientResult<()> {
        let text = request.encode()?;
        let sink = self.sink.as_mut().ok_or(ClientError::NotConnected)?;
        sink.send(Message::Text(text.into())).await
    }

    /// close 프레임을 보내고 소켓을 닫습니다. 실패는 로그만 남깁니다.
    async fn close(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!(error = %e, "close 프레임 전송 실패");
            }
            if let Err(e) = sink.close().await {
                debug!(error = %e, "소켓 닫기 실패");
            }
        }
    }

    /// 세션 자원을 해제하고 태스크 핸들을 돌려줍니다.
    fn reset(&mut self) -> Vec<JoinHandle<()>> {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.sink = None;
        self.state = ConnectionState::Disconnected;
        std::mem::take(&mut self.tasks)
    }
}

struct Inner {
    config: WebSocketConfig,
    credentials: Credentials,
    connector: Arc<dyn Connector>,
    session: Mutex<Session>,
    registry: TopicRegistry,
    auth_waiter: std::sync::Mutex<Option<oneshot::Sender<Envelope>>>,
    error_handler: RwLock<Option<ErrorHandler>>,
    reconnect_enabled: AtomicBool,
    shutdown: CancellationToken,
}

impl Inner {
    fn take_auth_waiter(&self) -> Option<oneshot::Sender<Envelope>> {
        self.auth_waiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn set_auth_waiter(&self, waiter: oneshot::Sender<Envelope>) {
        *self
            .auth_waiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(waiter);
    }

    /// 에러 핸들러로 보고합니다. 핸들러가 없으면 로그로 남깁니다.
    fn report(&self, err: &ClientError) {
        let handler = self
            .error_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(err),
            None => error!(error = %err, "Versifi WebSocket 에러"),
        }
    }

    /// 수신 프레임 하나를 처리합니다.
    fn handle_frame(&self, raw: &[u8]) {
        let frame = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "프레임 디코딩 실패, 건너뜀");
                return;
            }
        };

        match frame {
            Frame::Auth(envelope) => match self.take_auth_waiter() {
                Some(waiter) => {
                    let _ = waiter.send(envelope);
                }
                None => debug!(success = envelope.success, "대기자 없는 인증 응답 무시"),
            },
            Frame::Pong => debug!("keepalive 응답 수신"),
            Frame::SubscribeAck(envelope) => {
                if envelope.success {
                    info!(message = ?envelope.message_text(), "구독 확인");
                } else {
                    warn!(message = ?envelope.message_text(), "구독 거부");
                }
            }
            Frame::Message { topic, .. } => {
                if self.registry.dispatch(&topic, raw) == 0 {
                    debug!(topic = %topic, "등록된 핸들러 없음");
                }
            }
        }
    }

    /// 수신/keepalive 실패 시 세션을 정리합니다.
    ///
    /// 인증 완료 상태에서 끊긴 경우에만 에러 핸들러를 호출하고 재연결을 예약합니다.
    /// 인증 전 실패는 `connect()` 호출자에게 직접 반환됩니다.
    async fn on_session_lost(self: &Arc<Self>, generation: u64, err: ClientError) {
        let was_authenticated = {
            let mut session = self.session.lock().await;
            if session.generation != generation
                || session.state == ConnectionState::Disconnected
            {
                return;
            }
            let was_authenticated = session.state == ConnectionState::Authenticated;
            // 현재 태스크의 핸들도 여기 포함되므로 기다리지 않고 분리한다
            drop(session.reset());
            was_authenticated
        };
        drop(self.take_auth_waiter());

        warn!(error = %err, "Versifi WebSocket 연결 끊김");
        if !was_authenticated {
            return;
        }

        self.report(&err);
        if self.reconnect_enabled.load(Ordering::SeqCst) && !self.shutdown.is_cancelled() {
            spawn_reconnect(Arc::downgrade(self));
        }
    }
}

/// Versifi 스트리밍 클라이언트.
///
/// 복제본은 같은 세션을 공유합니다. 인스턴스마다 독립된 설정을 가지며,
/// 전역 상태는 없습니다.
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for WsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsClient")
            .field("url", &self.inner.config.url)
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

impl WsClient {
    /// 기본 `tokio-tungstenite` 커넥터로 생성합니다.
    pub fn new(credentials: Credentials, config: WebSocketConfig) -> Self {
        let connector = Arc::new(TungsteniteConnector::from_config(&config));
        Self::with_connector(credentials, config, connector)
    }

    /// 애플리케이션 설정에서 생성합니다.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(Credentials::from(&config.api), config.websocket.clone())
    }

    /// 커넥터를 지정해 생성합니다.
    pub fn with_connector(
        credentials: Credentials,
        config: WebSocketConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let reconnect = config.auto_reconnect;
        Self {
            inner: Arc::new(Inner {
                config,
                credentials,
                connector,
                session: Mutex::new(Session::new()),
                registry: TopicRegistry::new(),
                auth_waiter: std::sync::Mutex::new(None),
                error_handler: RwLock::new(None),
                reconnect_enabled: AtomicBool::new(reconnect),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// 연결하고 인증합니다.
    ///
    /// # Errors
    /// - 이미 연결되어 있거나 연결 중이면 `AlreadyConnected`
    /// - `disconnect()` 이후 호출하면 `Shutdown`
    /// - 소켓 연결 실패 (재시도하지 않음)
    /// - 인증 거부 `AuthenticationFailed`, 응답 없음 `AuthenticationTimeout`.
    ///   두 경우 모두 소켓을 닫은 뒤 반환합니다.
    pub async fn connect(&self) -> ClientResult<()> {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return Err(ClientError::Shutdown);
        }

        {
            let mut session = inner.session.lock().await;
            if session.state != ConnectionState::Disconnected {
                return Err(ClientError::AlreadyConnected);
            }
            session.state = ConnectionState::Connecting;
        }

        info!(url = %inner.config.url, "Versifi WebSocket 연결 중");
        let (sink, stream) = match inner.connector.connect(&inner.config.url).await {
            Ok(halves) => halves,
            Err(e) => {
                let mut session = inner.session.lock().await;
                if session.state == ConnectionState::Connecting {
                    session.state = ConnectionState::Disconnected;
                }
                error!(error = %e, "Versifi WebSocket 연결 실패");
                return Err(e);
            }
        };

        let (auth_tx, auth_rx) = oneshot::channel();
        let generation = {
            let mut session = inner.session.lock().await;
            if inner.shutdown.is_cancelled() || session.state != ConnectionState::Connecting {
                session.state = ConnectionState::Disconnected;
                return Err(ClientError::Shutdown);
            }

            inner.set_auth_waiter(auth_tx);
            let cancel = inner.shutdown.child_token();
            session.generation += 1;
            session.state = ConnectionState::Connected;
            session.sink = Some(sink);
            session.cancel = Some(cancel.clone());
            let generation = session.generation;
            session.tasks.push(tokio::spawn(read_loop(
                Arc::downgrade(inner),
                stream,
                cancel.clone(),
                generation,
            )));
            if inner.config.keepalive {
                session.tasks.push(tokio::spawn(keepalive_loop(
                    Arc::downgrade(inner),
                    cancel,
                    generation,
                    inner.config.keepalive_interval(),
                )));
            }
            info!("Versifi WebSocket 연결 성공, 인증 요청");

            session.state = ConnectionState::Authenticating;
            let challenge = AuthChallenge::issue(inner.credentials.signer());
            let request = Request::auth(inner.credentials.api_key(), &challenge);
            if let Err(e) = session.send(&request).await {
                let tasks = session.reset();
                drop(session);
                drop(inner.take_auth_waiter());
                join_all(tasks).await;
                return Err(e);
            }
            generation
        };

        let auth_timeout = inner.config.auth_timeout();
        let outcome = match timeout(auth_timeout, auth_rx).await {
            Ok(Ok(envelope)) if envelope.success => Ok(()),
            Ok(Ok(envelope)) => Err(ClientError::AuthenticationFailed(
                envelope
                    .message_text()
                    .unwrap_or_else(|| "rejected by server".to_string()),
            )),
            Ok(Err(_)) => Err(ClientError::Disconnected(
                "connection lost during authentication".to_string(),
            )),
            Err(_) => Err(ClientError::AuthenticationTimeout(auth_timeout)),
        };
        // 인증 대기 중 disconnect()가 호출되면 전송 오류가 아니라 종료다
        let outcome = match outcome {
            Err(_) if inner.shutdown.is_cancelled() => Err(ClientError::Shutdown),
            other => other,
        };

        let mut session = inner.session.lock().await;
        let current = session.generation == generation
            && session.state == ConnectionState::Authenticating;

        if let Err(e) = outcome {
            drop(inner.take_auth_waiter());
            let tasks = if current {
                session.close().await;
                session.reset()
            } else {
                Vec::new()
            };
            drop(session);
            join_all(tasks).await;
            if matches!(e, ClientError::Shutdown) {
                info!("인증 대기 중 연결 종료 요청");
            } else {
                error!(error = %e, "Versifi WebSocket 인증 실패");
            }
            return Err(e);
        }

        if !current {
            if inner.shutdown.is_cancelled() {
                return Err(ClientError::Shutdown);
            }
            return Err(ClientError::Disconnected(
                "connection lost during authentication".to_string(),
            ));
        }

        session.state = ConnectionState::Authenticated;
        info!("Versifi WebSocket 인증 완료");
        Ok(())
    }

    /// 연결을 종료하고 자동 재연결을 끕니다.
    ///
    /// 두 번 호출해도 안전합니다. 종료 후에는 다시 연결할 수 없습니다.
    pub async fn disconnect(&self) -> ClientResult<()> {
        let inner = &self.inner;
        inner.reconnect_enabled.store(false, Ordering::SeqCst);
        inner.shutdown.cancel();

        let tasks = {
            let mut session = inner.session.lock().await;
            if session.state == ConnectionState::Disconnected {
                return Ok(());
            }
            session.close().await;
            session.reset()
        };
        drop(inner.take_auth_waiter());
        join_all(tasks).await;

        info!("Versifi WebSocket 연결 종료");
        Ok(())
    }

    /// 토픽을 구독합니다.
    ///
    /// 핸들러를 먼저 등록한 뒤 구독 요청을 보냅니다. `"*"`는 로컬에만 등록되며
    /// 모든 비즈니스 프레임을 받습니다.
    ///
    /// # Errors
    /// 인증 전이면 아무것도 보내지 않고 `NotAuthenticated`를 반환합니다.
    pub async fn subscribe<F>(&self, topic: &str, handler: F) -> ClientResult<()>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let mut session = self.inner.session.lock().await;
        if session.state != ConnectionState::Authenticated {
            return Err(ClientError::NotAuthenticated);
        }

        self.inner.registry.register(topic, Arc::new(handler));
        if topic == WILDCARD {
            debug!("와일드카드 핸들러 등록");
            return Ok(());
        }

        session.send(&Request::subscribe(topic)).await?;
        info!(topic, "구독 요청 전송");
        Ok(())
    }

    /// `execution_report` 토픽 구독.
    pub async fn subscribe_execution_report<F>(&self, handler: F) -> ClientResult<()>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.subscribe(op::EXECUTION_REPORT, handler).await
    }

    /// `analytics` 토픽 구독.
    pub async fn subscribe_analytics<F>(&self, handler: F) -> ClientResult<()>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.subscribe(op::ANALYTICS, handler).await
    }

    /// 로컬 핸들러를 제거합니다. 서버에는 아무것도 보내지 않습니다.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        self.inner.registry.unregister(topic)
    }

    /// 등록된 토픽 목록.
    pub fn topics(&self) -> Vec<String> {
        self.inner.registry.topics()
    }

    /// 임의의 JSON 프레임을 보냅니다.
    pub async fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> ClientResult<()> {
        let text = serde_json::to_string(value)?;
        let mut session = self.inner.session.lock().await;
        if !session.state.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let sink = session.sink.as_mut().ok_or(ClientError::NotConnected)?;
        sink.send(Message::Text(text.into())).await
    }

    /// keepalive ping을 즉시 보냅니다.
    pub async fn send_ping(&self) -> ClientResult<()> {
        self.send_json(&Request::ping()).await
    }

    /// 비동기 에러 핸들러를 설정합니다.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(&ClientError) + Send + Sync + 'static,
    {
        *self
            .inner
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// 자동 재연결을 켜거나 끕니다.
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.inner.reconnect_enabled.store(enabled, Ordering::SeqCst);
    }

    /// 현재 연결 상태.
    pub async fn state(&self) -> ConnectionState {
        self.inner.session.lock().await.state
    }

    /// 소켓 연결 여부.
    pub async fn is_connected(&self) -> bool {
        self.state().await.is_connected()
    }

    /// 인증 완료 여부.
    pub async fn is_authenticated(&self) -> bool {
        self.state().await.is_authenticated()
    }

    /// 설정.
    pub fn config(&self) -> &WebSocketConfig {
        &self.inner.config
    }

    /// 등록된 토픽의 구독 요청을 다시 보냅니다.
    async fn restore_subscriptions(&self) -> ClientResult<()> {
        let mut session = self.inner.session.lock().await;
        for topic in self.inner.registry.topics() {
            if topic == WILDCARD {
                continue;
            }
            session.send(&Request::subscribe(&topic)).await?;
            debug!(topic = %topic, "구독 복원");
        }
        Ok(())
    }
}

async fn join_all(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            if e.is_panic() {
                error!(error = %e, "세션 태스크 패닉");
            }
        }
    }
}

async fn read_loop(
    weak: Weak<Inner>,
    mut stream: FrameStream,
    cancel: CancellationToken,
    generation: u64,
) {
    let reason = loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = stream.next() => next,
        };
        let Some(inner) = weak.upgrade() else {
            return;
        };

        match next {
            Some(Ok(Message::Text(text))) => inner.handle_frame(text.as_bytes()),
            Some(Ok(Message::Binary(data))) => inner.handle_frame(&data),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                debug!("WebSocket 제어 프레임 수신");
            }
            Some(Ok(Message::Close(frame))) => {
                break ClientError::Disconnected(format!("closed by server: {:?}", frame));
            }
            Some(Ok(Message::Frame(_))) => {}
            Some(Err(e)) => break e,
            None => break ClientError::Disconnected("stream ended".to_string()),
        }
    };

    if let Some(inner) = weak.upgrade() {
        inner.on_session_lost(generation, reason).await;
    }
}

async fn keepalive_loop(
    weak: Weak<Inner>,
    cancel: CancellationToken,
    generation: u64,
    period: std::time::Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let Some(inner) = weak.upgrade() else {
            return;
        };

        let result = {
            let mut session = inner.session.lock().await;
            if session.generation != generation || cancel.is_cancelled() {
                return;
            }
            session.send(&Request::ping()).await
        };

        match result {
            Ok(()) => debug!("keepalive ping 전송"),
            Err(e) => {
                warn!(error = %e, "keepalive 전송 실패");
                inner.on_session_lost(generation, e).await;
                return;
            }
        }
    }
}

fn spawn_reconnect(weak: Weak<Inner>) {
    let task: futures::future::BoxFuture<'static, ()> = Box::pin(reconnect_loop(weak));
    tokio::spawn(task);
}

/// 고정 지연 후 재연결을 시도합니다.
///
/// 인증 거부처럼 치명적인 에러나 최대 시도 횟수에 도달하면 중단합니다.
async fn reconnect_loop(weak: Weak<Inner>) {
    let mut attempt: u32 = 0;

    loop {
        let (delay, shutdown) = match weak.upgrade() {
            Some(inner) => (inner.config.reconnect_delay(), inner.shutdown.clone()),
            None => return,
        };
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = sleep(delay) => {}
        }

        let Some(inner) = weak.upgrade() else {
            return;
        };
        if !inner.reconnect_enabled.load(Ordering::SeqCst) {
            return;
        }
        attempt += 1;
        let client = WsClient { inner };

        info!(attempt, "Versifi WebSocket 재연결 시도");
        match client.connect().await {
            Ok(()) => {
                info!(attempt, "Versifi WebSocket 재연결 성공");
                if client.inner.config.restore_subscriptions {
                    if let Err(e) = client.restore_subscriptions().await {
                        warn!(error = %e, "구독 복원 실패");
                        client.inner.report(&e);
                    }
                }
                return;
            }
            Err(ClientError::AlreadyConnected) | Err(ClientError::Shutdown) => return,
            Err(_) if client.inner.shutdown.is_cancelled() => return,
            Err(e) => {
                client.inner.report(&e);
                if e.is_fatal() {
                    error!(error = %e, "치명적 에러로 재연결 중단");
                    return;
                }
                if let Some(max) = client.inner.config.max_reconnect_attempts {
                    if attempt >= max {
                        error!(attempts = attempt, "최대 재연결 시도 횟수 초과");
                        return;
                    }
                }
                warn!(
                    error = %e,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "재연결 실패, 대기 후 재시도"
                );
            }
        }
    }
}
