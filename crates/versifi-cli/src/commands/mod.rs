//! CLI 명령어 구현 모듈.

pub mod order;
pub mod stream;

use anyhow::{Context, Result};
use versifi_core::AppConfig;

/// 설정 파일이 주어지면 파일+환경 변수, 아니면 환경 변수만으로 설정을 로드합니다.
///
/// `VERSIFI_API_KEY`/`VERSIFI_API_SECRET`가 있으면 자격증명으로 사용합니다.
pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("설정 파일을 읽을 수 없습니다: {}", path))?,
        None => AppConfig::from_env().context("환경 변수 설정 해석 실패")?,
    };

    if config.api.api_key.is_empty() {
        if let Some(api) = versifi_core::ApiConfig::from_env() {
            config.api = api;
        }
    }
    Ok(config)
}

/// 자격증명이 설정되어 있는지 확인합니다.
pub fn require_credentials(config: &AppConfig) -> Result<()> {
    if config.api.api_key.is_empty() || config.api.api_secret.is_empty() {
        anyhow::bail!(
            "API credentials not found. Set VERSIFI_API_KEY and VERSIFI_API_SECRET or use --config"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_credentials() {
        let mut config = AppConfig::default();
        assert!(require_credentials(&config).is_err());

        config.api = versifi_core::ApiConfig::new("key", "secret");
        assert!(require_credentials(&config).is_ok());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        assert!(load_config(Some("/nonexistent/versifi.toml")).is_err());
    }
}
