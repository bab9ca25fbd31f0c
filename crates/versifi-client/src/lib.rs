//! Versifi 트레이딩 플랫폼 클라이언트.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - [`WsClient`]: 스트리밍 연결 감독자 (인증, 토픽 구독, keepalive, 재연결)
//! - [`RestClient`]: 서명된 주문 REST API
//! - [`Signer`] / [`AuthChallenge`]: HMAC-SHA256 서명

pub mod auth;
pub mod error;
pub mod rest;
pub mod websocket;

pub use auth::{AuthChallenge, Credentials, Signer};
pub use error::*;
pub use rest::RestClient;
pub use websocket::{
    op, queued_handler, ConnectionState, Connector, Envelope, Frame, TungsteniteConnector, WsClient,
    WILDCARD,
};
