//! Versifi REST 및 스트리밍 API의 도메인 모델.

pub(crate) mod decimal;
mod execution;
mod order;

pub use execution::*;
pub use order::*;
