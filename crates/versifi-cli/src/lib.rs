//! Versifi CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 체결 보고 스트리밍
//! - 주문 조회/목록/취소
//! - 설정 로드

pub mod commands;
