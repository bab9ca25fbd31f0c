//! Versifi 스트리밍 API (WebSocket).
//!
//! - [`codec`]: 프레임 인코딩/분류
//! - [`registry`]: 토픽별 핸들러 레지스트리
//! - [`transport`]: 소켓 연결 추상화
//! - [`client`]: 연결/인증/재연결 감독자

pub mod client;
pub mod codec;
pub mod registry;
pub mod transport;

pub use client::{ConnectionState, ErrorHandler, WsClient};
pub use codec::{op, Envelope, Frame, Request, WILDCARD};
pub use registry::{queued_handler, MessageHandler, TopicRegistry};
pub use transport::{Connector, FrameSink, FrameStream, TungsteniteConnector};
