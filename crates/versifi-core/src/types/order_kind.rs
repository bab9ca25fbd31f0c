//! 주문 유형 정의.
//!
//! Versifi는 세 가지 주문 계열을 제공합니다:
//! - **basic**: 거래소에 그대로 전달되는 일반 주문
//! - **algo**: TWAP/VWAP/IS 알고리즘 주문
//! - **pair**: 두 레그를 동시에 운용하는 베이시스 주문

use serde::{Deserialize, Serialize};
use std::fmt;

/// 일반 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasicOrderType {
    /// 시장가
    Market,
    /// 지정가
    Limit,
    /// 스탑
    Stop,
    /// 손절
    StopLoss,
    /// 지정가 손절
    StopLossLimit,
    /// 익절
    TakeProfit,
    /// 지정가 익절
    TakeProfitLimit,
    /// 메이커 전용 지정가
    LimitMaker,
}

impl BasicOrderType {
    /// 가격(`price`) 필드가 필요한 주문 유형인지 확인.
    pub fn requires_price(&self) -> bool {
        matches!(
            self,
            BasicOrderType::Limit
                | BasicOrderType::StopLossLimit
                | BasicOrderType::TakeProfitLimit
                | BasicOrderType::LimitMaker
        )
    }

    /// 스탑 가격(`stop_price`) 필드가 필요한 주문 유형인지 확인.
    pub fn requires_stop_price(&self) -> bool {
        matches!(
            self,
            BasicOrderType::StopLoss
                | BasicOrderType::StopLossLimit
                | BasicOrderType::TakeProfit
                | BasicOrderType::TakeProfitLimit
        )
    }
}

/// 알고리즘 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgoOrderType {
    /// 시간 가중 평균가
    Twap,
    /// 거래량 가중 평균가
    Vwap,
    /// Implementation Shortfall
    Is,
}

/// 페어 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairOrderType {
    /// 베이시스 거래
    Basis,
}

/// 페어 주문 실행 스타일.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PairStyle {
    /// 두 레그 동시 실행
    Sync,
    /// 레그별 독립 실행
    Async,
    /// 시간 분할 실행
    Twap,
}

/// 주문 유효 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Fill or Kill
    Fok,
    /// Good Till Cancel (기본값)
    Gtc,
    /// Good Till Date
    Gtd,
    /// Immediate or Cancel
    Ioc,
    /// Good Till Crossing (post only)
    Gtx,
    /// Post only
    PostOn,
}

impl Default for TimeInForce {
    fn default() -> Self {
        Self::Gtc
    }
}

/// 주문 요청 계열.
///
/// 체결 보고(execution report)의 `request_order_type` 필드로 전달되며,
/// 중첩된 `order` 페이로드의 형태를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOrderType {
    /// 일반 주문
    Basic,
    /// 알고리즘 주문
    Algo,
    /// 페어 주문
    Pair,
    /// 빈 값이나 알 수 없는 계열 (`order` 페이로드를 해석하지 않음)
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RequestOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOrderType::Basic => write!(f, "basic"),
            RequestOrderType::Algo => write!(f, "algo"),
            RequestOrderType::Pair => write!(f, "pair"),
            RequestOrderType::Unknown => write!(f, "unknown"),
        }
    }
}
