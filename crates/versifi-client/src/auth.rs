//! API 서명 및 스트림 인증 챌린지.
//!
//! REST 요청과 WebSocket 인증은 같은 방식으로 서명합니다:
//! API 시크릿을 키로 한 HMAC-SHA256의 소문자 16진수 문자열.

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::fmt;
use versifi_core::{mask_key, ApiConfig, REDACTED};

type HmacSha256 = Hmac<Sha256>;

/// 인증 챌린지 만료까지의 여유 시간 (초).
pub const AUTH_EXPIRY_SECS: i64 = 300;

/// 스트림 인증에 서명되는 고정 접두사.
const AUTH_PAYLOAD_PREFIX: &str = "GET/realtime";

/// HMAC-SHA256 서명기.
pub struct Signer {
    secret: SecretString,
}

impl Signer {
    /// 시크릿으로 서명기를 생성합니다.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        Self {
            secret: SecretString::new(secret.into_boxed_str()),
        }
    }

    /// 페이로드에 서명하고 소문자 16진수 문자열을 반환합니다.
    pub fn sign(&self, payload: &[u8]) -> String {
        // HMAC은 임의 길이의 키를 허용
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &REDACTED)
            .finish()
    }
}

/// API 키와 서명기.
pub struct Credentials {
    api_key: String,
    signer: Signer,
}

impl Credentials {
    /// 키/시크릿으로 생성.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            signer: Signer::new(api_secret),
        }
    }

    /// API 키.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// 서명기.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }
}

impl From<&ApiConfig> for Credentials {
    fn from(config: &ApiConfig) -> Self {
        Self::new(config.api_key.clone(), config.api_secret.clone())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask_key(&self.api_key))
            .field("signer", &self.signer)
            .finish()
    }
}

/// 스트림 인증 챌린지.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// 만료 시각 (unix 초)
    pub expires: i64,
    /// `GET/realtime{expires}`의 서명
    pub signature: String,
}

impl AuthChallenge {
    /// 주어진 만료 시각으로 챌린지를 생성합니다.
    pub fn new(signer: &Signer, expires: i64) -> Self {
        let signature = signer.sign(Self::payload(expires).as_bytes());
        Self { expires, signature }
    }

    /// 현재 시각 기준 5분 뒤 만료되는 챌린지를 생성합니다.
    pub fn issue(signer: &Signer) -> Self {
        Self::new(signer, Utc::now().timestamp() + AUTH_EXPIRY_SECS)
    }

    /// 서명 대상 문자열. 구분자 없이 10진수 만료 시각을 붙입니다.
    pub fn payload(expires: i64) -> String {
        format!("{}{}", AUTH_PAYLOAD_PREFIX, expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign_known_vector() {
        let signer = Signer::new("key");
        assert_eq!(
            signer.sign(b"The quick brown fox jumps over the lazy dog"),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_auth_payload_is_byte_exact() {
        assert_eq!(AuthChallenge::payload(1700000300), "GET/realtime1700000300");

        let signer = Signer::new("secret");
        let challenge = AuthChallenge::new(&signer, 1700000300);
        assert_eq!(challenge.expires, 1700000300);
        assert_eq!(challenge.signature, signer.sign(b"GET/realtime1700000300"));
        assert_eq!(challenge.signature.len(), 64);
    }

    #[test]
    fn test_issue_expires_in_future() {
        let signer = Signer::new("secret");
        let now = Utc::now().timestamp();
        let challenge = AuthChallenge::issue(&signer);

        assert!(challenge.expires > now);
        assert!(challenge.expires <= now + AUTH_EXPIRY_SECS + 1);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = Credentials::new("abcdefghijklmnop", "top-secret");
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("abcd...mnop"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_debug_with_non_ascii_key() {
        let short = format!("{:?}", Credentials::new("aéééé", "s"));
        assert!(short.contains(REDACTED));

        let long = format!("{:?}", Credentials::new("éabcdefghé", "s"));
        assert!(long.contains("éabc...fghé"));
    }

    proptest! {
        #[test]
        fn prop_sign_is_deterministic(secret in ".{0,64}", payload in proptest::collection::vec(any::<u8>(), 0..256)) {
            let a = Signer::new(secret.clone());
            let b = Signer::new(secret);
            let sig = a.sign(&payload);

            prop_assert_eq!(&sig, &b.sign(&payload));
            prop_assert_eq!(sig.len(), 64);
            prop_assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }
}
