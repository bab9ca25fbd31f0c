//! Versifi REST API (주문 생성/조회/취소).

mod client;

pub use client::{RestClient, API_KEY_HEADER, API_SIGN_HEADER, USER_AGENT};
