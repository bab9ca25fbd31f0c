//! 설정 관리.
//!
//! 클라이언트 인스턴스마다 독립된 설정을 생성자에 전달합니다. 파일(TOML 등)과
//! `VERSIFI__` 접두사 환경 변수에서 로드할 수 있습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// REST API 기본 URL.
pub const DEFAULT_REST_BASE_URL: &str = "https://api.versifi.io";

/// WebSocket 기본 URL.
pub const DEFAULT_WS_URL: &str = "wss://api.versifi.io/v1/ws";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// API 자격증명 및 REST 설정
    pub api: ApiConfig,
    /// WebSocket 설정
    pub websocket: WebSocketConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::env_source())
            .build()?
            .try_deserialize()
    }

    /// 환경 변수만으로 설정을 로드합니다.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(Self::env_source())
            .build()?
            .try_deserialize()
    }

    fn env_source() -> config::Environment {
        config::Environment::with_prefix("VERSIFI")
            .separator("__")
            .try_parsing(true)
    }
}

/// API 자격증명 및 REST 설정.
///
/// # 보안
/// - `Debug` 구현은 `api_key`, `api_secret`을 마스킹합니다.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 키
    pub api_key: String,
    /// API 시크릿
    pub api_secret: String,
    /// REST API 기본 URL
    pub rest_base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 바인딩할 로컬 IP (허용 목록에 등록된 IP가 하나뿐인 서버용)
    pub local_addr: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            timeout_secs: 30,
            local_addr: None,
        }
    }
}

/// 마스킹된 값 표시.
pub const REDACTED: &str = "***REDACTED***";

/// 로그/Debug 출력용으로 API 키를 마스킹합니다.
///
/// 8자를 넘으면 앞뒤 4자만 남기고, 그 외에는 전체를 가립니다. 문자 단위로
/// 자르므로 멀티바이트 문자가 섞여 있어도 안전합니다.
pub fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        return REDACTED.to_string();
    }

    let head: String = key.chars().take(4).collect();
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}...{}", head, tail)
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &mask_key(&self.api_key))
            .field("api_secret", &REDACTED)
            .field("rest_base_url", &self.rest_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

impl ApiConfig {
    /// 새 설정 생성.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Default::default()
        }
    }

    /// REST 기본 URL 설정.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    /// 로컬 바인딩 주소 설정.
    pub fn with_local_addr(mut self, addr: impl Into<String>) -> Self {
        self.local_addr = Some(addr.into());
        self
    }

    /// 환경 변수(`VERSIFI_API_KEY`, `VERSIFI_API_SECRET`)에서 생성.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("VERSIFI_API_KEY").ok()?;
        let api_secret = std::env::var("VERSIFI_API_SECRET").ok()?;

        let mut config = Self::new(api_key, api_secret);
        if let Ok(url) = std::env::var("VERSIFI_API_URL") {
            config.rest_base_url = url;
        }
        config.local_addr = std::env::var("VERSIFI_LOCAL_ADDR").ok();
        Some(config)
    }

    /// 요청 타임아웃.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// WebSocket 연결 설정.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// 엔드포인트 URL
    pub url: String,
    /// 유휴 타임아웃 (초). keepalive는 이 값의 절반 주기로 전송됩니다.
    pub idle_timeout_secs: u64,
    /// 애플리케이션 레벨 ping 전송 여부
    pub keepalive: bool,
    /// 연결 끊김 시 자동 재연결
    pub auto_reconnect: bool,
    /// 재연결 대기 시간 (초)
    pub reconnect_delay_secs: u64,
    /// 최대 재연결 시도 횟수 (`None`이면 무제한)
    pub max_reconnect_attempts: Option<u32>,
    /// 인증 응답 대기 시간 (초)
    pub auth_timeout_secs: u64,
    /// WebSocket 핸드셰이크 타임아웃 (초)
    pub handshake_timeout_secs: u64,
    /// 재연결 후 등록된 토픽을 다시 구독할지 여부
    pub restore_subscriptions: bool,
    /// 바인딩할 로컬 IP
    pub local_addr: Option<String>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            idle_timeout_secs: 60,
            keepalive: true,
            auto_reconnect: true,
            reconnect_delay_secs: 5,
            max_reconnect_attempts: None,
            auth_timeout_secs: 10,
            handshake_timeout_secs: 45,
            restore_subscriptions: false,
            local_addr: None,
        }
    }
}

impl WebSocketConfig {
    /// 엔드포인트 URL로 생성.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 자동 재연결 설정.
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// 재연결 대기 시간 설정 (초).
    pub fn with_reconnect_delay_secs(mut self, secs: u64) -> Self {
        self.reconnect_delay_secs = secs;
        self
    }

    /// keepalive 사용 여부 설정.
    pub fn with_keepalive(mut self, enabled: bool) -> Self {
        self.keepalive = enabled;
        self
    }

    /// 로컬 바인딩 주소 설정.
    pub fn with_local_addr(mut self, addr: impl Into<String>) -> Self {
        self.local_addr = Some(addr.into());
        self
    }

    /// keepalive 전송 주기 (유휴 타임아웃의 절반, 최소 1초).
    pub fn keepalive_interval(&self) -> Duration {
        (Duration::from_secs(self.idle_timeout_secs) / 2).max(Duration::from_secs(1))
    }

    /// 재연결 대기 시간.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// 인증 응답 대기 시간.
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    /// 핸드셰이크 타임아웃.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_websocket_defaults() {
        let config = WebSocketConfig::default();
        assert_eq!(config.keepalive_interval(), Duration::from_secs(30));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.auth_timeout(), Duration::from_secs(10));
        assert!(config.auto_reconnect);
        assert!(config.max_reconnect_attempts.is_none());
        assert!(!config.restore_subscriptions);
    }

    #[test]
    fn test_keepalive_interval_floor() {
        let config = WebSocketConfig {
            idle_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.keepalive_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_api_config_debug_masks_secrets() {
        let config = ApiConfig::new("abcdefghijklmnop", "super-secret-value");
        let debug = format!("{:?}", config);

        assert!(debug.contains("abcd...mnop"));
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("efghijkl"));
    }

    #[test]
    fn test_mask_key_counts_characters() {
        assert_eq!(mask_key("short"), REDACTED);
        assert_eq!(mask_key("12345678"), REDACTED);
        assert_eq!(mask_key("abcdefghijklmnop"), "abcd...mnop");
        // 바이트 경계가 문자 중간에 걸리는 키
        assert_eq!(mask_key("aéééé"), REDACTED);
        assert_eq!(mask_key("aééééxyzéé"), "aééé...yzéé");
        assert_eq!(mask_key("키키키키키키키키키"), "키키키키...키키키키");
    }

    #[test]
    fn test_api_config_debug_with_multibyte_key() {
        let config = ApiConfig::new("가나다라마바사아자차", "secret");
        let debug = format!("{:?}", config);

        assert!(debug.contains("가나다라...사아자차"));
        assert!(!debug.contains("마바"));
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!(
            "versifi-config-test-{}.toml",
            std::process::id()
        ));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(
                file,
                "[api]\napi_key = \"key\"\napi_secret = \"secret\"\n\n[websocket]\nreconnect_delay_secs = 2"
            )
            .unwrap();
        }

        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.api.api_key, "key");
        assert_eq!(config.api.rest_base_url, DEFAULT_REST_BASE_URL);
        assert_eq!(config.websocket.reconnect_delay_secs, 2);
        assert_eq!(config.websocket.url, DEFAULT_WS_URL);
        assert_eq!(config.logging.level, "info");
    }
}
