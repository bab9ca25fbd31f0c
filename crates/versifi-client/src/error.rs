//! 클라이언트 에러 타입.

use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Versifi 클라이언트 에러.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// WebSocket 프로토콜 에러
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// 타임아웃
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 서버가 인증을 거부함
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// 인증 응답이 제한 시간 내에 오지 않음
    #[error("Authentication timed out after {0:?}")]
    AuthenticationTimeout(Duration),

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 세션 도중 연결 끊김
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// 이미 연결되어 있거나 연결 중
    #[error("Already connected")]
    AlreadyConnected,

    /// 연결되지 않음
    #[error("Not connected")]
    NotConnected,

    /// 인증되지 않음
    #[error("Not authenticated")]
    NotAuthenticated,

    /// 명시적으로 종료된 클라이언트
    #[error("Client has been shut down")]
    Shutdown,

    /// REST API 에러 응답
    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    /// 인증/권한 에러 (REST)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 전송 전 검증 실패
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// 클라이언트 결과 타입.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_)
                | ClientError::WebSocket(_)
                | ClientError::Timeout(_)
                | ClientError::AuthenticationTimeout(_)
                | ClientError::Disconnected(_)
                | ClientError::RateLimited
        )
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::AuthenticationFailed(_)
                | ClientError::AuthenticationTimeout(_)
                | ClientError::Unauthorized(_)
                | ClientError::NotAuthenticated
        )
    }

    /// 재시도하면 안 되는 치명적 에러인지 확인.
    ///
    /// 재연결 루프는 이 에러를 만나면 중단합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::AuthenticationFailed(_)
                | ClientError::Unauthorized(_)
                | ClientError::InvalidRequest(_)
                | ClientError::Shutdown
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                ClientError::Disconnected(err.to_string())
            }
            tungstenite::Error::Io(e) => ClientError::Network(e.to_string()),
            other => ClientError::WebSocket(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ClientError::Network("reset".into()).is_retryable());
        assert!(ClientError::AuthenticationTimeout(Duration::from_secs(10)).is_retryable());
        assert!(!ClientError::AuthenticationFailed("bad key".into()).is_retryable());

        assert!(ClientError::AuthenticationFailed("bad key".into()).is_fatal());
        assert!(ClientError::Shutdown.is_fatal());
        assert!(!ClientError::Timeout("dial".into()).is_fatal());

        assert!(ClientError::NotAuthenticated.is_auth_error());
        assert!(!ClientError::NotConnected.is_auth_error());
    }

    #[test]
    fn test_tungstenite_conversion() {
        let err: ClientError = tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, ClientError::Disconnected(_)));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: ClientError = tungstenite::Error::Io(io).into();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
