//! Versifi API 전반에서 사용되는 공통 열거형.

mod exchange;
mod order_kind;
mod status;

pub use exchange::*;
pub use order_kind::*;
pub use status::*;
