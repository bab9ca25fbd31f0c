//! # Versifi Core
//!
//! Versifi 클라이언트가 공유하는 도메인 모델과 공통 인프라를 제공합니다:
//! - 주문/거래소/상태 열거형
//! - REST 주문 요청 및 응답 타입
//! - 체결 보고(execution report) 스트림 메시지
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use logging::*;
pub use types::*;
