//! 스트림 프레임 인코딩/디코딩.
//!
//! 송신 프레임은 `{"op": ..., "args": [...]}`, 수신 프레임은
//! `{"op": ..., "success": ..., "message": ...}` 형태입니다. `message`는 연산마다
//! 의미가 다르므로 원본 JSON으로 보관했다가 필요할 때 해석합니다.

use crate::auth::AuthChallenge;
use crate::error::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// 와일드카드 토픽. 모든 비즈니스 프레임을 수신합니다.
pub const WILDCARD: &str = "*";

/// 알려진 연산 이름.
pub mod op {
    /// 인증
    pub const AUTH: &str = "auth";
    /// keepalive
    pub const PING: &str = "ping";
    /// 토픽 구독
    pub const SUBSCRIBE: &str = "subscribe";
    /// 주문 체결 보고
    pub const EXECUTION_REPORT: &str = "execution_report";
    /// 분석 데이터
    pub const ANALYTICS: &str = "analytics";
}

/// 송신 프레임.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub op: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl Request {
    /// 인자 없는 요청.
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            args: Vec::new(),
        }
    }

    /// 인자를 설정합니다.
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// `[api_key, "<expires>", "<signature>"]` 인증 요청.
    pub fn auth(api_key: &str, challenge: &AuthChallenge) -> Self {
        Self::new(op::AUTH).with_args([
            Value::from(api_key),
            Value::from(challenge.expires.to_string()),
            Value::from(challenge.signature.as_str()),
        ])
    }

    /// 토픽 구독 요청.
    pub fn subscribe(topic: &str) -> Self {
        Self::new(op::SUBSCRIBE).with_args([Value::from(topic)])
    }

    /// keepalive 요청.
    pub fn ping() -> Self {
        Self::new(op::PING)
    }

    /// JSON 텍스트로 인코딩합니다.
    pub fn encode(&self) -> ClientResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 수신 프레임 봉투.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// 연산 이름
    pub op: String,
    /// 성공 여부 (없으면 false)
    #[serde(default)]
    pub success: bool,
    /// 연산별 페이로드 (지연 해석)
    #[serde(default)]
    pub message: Option<Box<RawValue>>,
}

impl Envelope {
    /// 원시 바이트에서 봉투를 디코딩합니다.
    pub fn decode(raw: &[u8]) -> ClientResult<Self> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// 페이로드를 원하는 타입으로 해석합니다.
    pub fn decode_message<T: DeserializeOwned>(&self) -> ClientResult<Option<T>> {
        match &self.message {
            Some(raw) => serde_json::from_str(raw.get())
                .map(Some)
                .map_err(|e| ClientError::Parse(format!("{} payload: {}", self.op, e))),
            None => Ok(None),
        }
    }

    /// 사람이 읽을 수 있는 페이로드 요약 (문자열이면 따옴표 없이).
    pub fn message_text(&self) -> Option<String> {
        let raw = self.message.as_ref()?;
        match serde_json::from_str::<String>(raw.get()) {
            Ok(text) => Some(text),
            Err(_) => Some(raw.get().to_string()),
        }
    }
}

/// 연산별로 분류된 수신 프레임.
#[derive(Debug, Clone)]
pub enum Frame {
    /// 인증 응답
    Auth(Envelope),
    /// keepalive 응답
    Pong,
    /// 구독 응답
    SubscribeAck(Envelope),
    /// 토픽 메시지 (체결 보고, 분석 등 알려지지 않은 연산 포함)
    Message { topic: String, envelope: Envelope },
}

impl Frame {
    /// 원시 바이트를 디코딩하고 분류합니다.
    pub fn decode(raw: &[u8]) -> ClientResult<Self> {
        let envelope = Envelope::decode(raw)?;
        Ok(match envelope.op.as_str() {
            op::AUTH => Frame::Auth(envelope),
            op::PING => Frame::Pong,
            op::SUBSCRIBE => Frame::SubscribeAck(envelope),
            _ => Frame::Message {
                topic: envelope.op.clone(),
                envelope,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Signer;
    use serde_json::json;
    use versifi_core::{ExecutionReport, OrderStatus};

    #[test]
    fn test_ping_has_no_args() {
        assert_eq!(Request::ping().encode().unwrap(), r#"{"op":"ping"}"#);
    }

    #[test]
    fn test_auth_and_subscribe_frames() {
        let challenge = AuthChallenge::new(&Signer::new("secret"), 1700000300);
        let value: Value =
            serde_json::from_str(&Request::auth("my-key", &challenge).encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"op": "auth", "args": ["my-key", "1700000300", challenge.signature]})
        );

        assert_eq!(
            Request::subscribe(op::EXECUTION_REPORT).encode().unwrap(),
            r#"{"op":"subscribe","args":["execution_report"]}"#
        );
    }

    #[test]
    fn test_envelope_defaults() {
        let envelope = Envelope::decode(br#"{"op":"auth"}"#).unwrap();
        assert_eq!(envelope.op, "auth");
        assert!(!envelope.success);
        assert!(envelope.message.is_none());

        assert!(Envelope::decode(br#"{"success":true}"#).is_err());
        assert!(Envelope::decode(b"not json").is_err());
    }

    #[test]
    fn test_frame_classification() {
        assert!(matches!(
            Frame::decode(br#"{"op":"auth","success":true}"#).unwrap(),
            Frame::Auth(e) if e.success
        ));
        assert!(matches!(
            Frame::decode(br#"{"op":"ping","success":true,"message":"pong"}"#).unwrap(),
            Frame::Pong
        ));
        assert!(matches!(
            Frame::decode(br#"{"op":"subscribe","success":true}"#).unwrap(),
            Frame::SubscribeAck(_)
        ));

        let frame = Frame::decode(br#"{"op":"funding_rate","success":true,"message":{}}"#).unwrap();
        assert!(matches!(frame, Frame::Message { ref topic, .. } if topic == "funding_rate"));
    }

    #[test]
    fn test_lazy_message_decoding() {
        let frame = Frame::decode(
            br#"{"op":"execution_report","success":true,"message":{"order_id":1,"status":"FILLED"}}"#,
        )
        .unwrap();
        let Frame::Message { envelope, .. } = frame else {
            panic!("expected business message");
        };

        let report: ExecutionReport = envelope.decode_message().unwrap().unwrap();
        assert_eq!(report.order_id, 1);
        assert_eq!(report.status, OrderStatus::Filled);
    }

    #[test]
    fn test_message_text() {
        let envelope =
            Envelope::decode(br#"{"op":"auth","success":false,"message":"invalid signature"}"#)
                .unwrap();
        assert_eq!(envelope.message_text().as_deref(), Some("invalid signature"));

        let envelope = Envelope::decode(br#"{"op":"auth","message":{"code":7}}"#).unwrap();
        assert_eq!(envelope.message_text().as_deref(), Some(r#"{"code":7}"#));
    }
}
