//! 주문 방향 및 거래소 정의.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 주문 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 와이어 표기 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 주문이 라우팅되는 거래소.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeType {
    /// Binance 현물
    #[serde(rename = "BINANCE_SPOT")]
    BinanceSpot,
    /// Binance 선물
    #[serde(rename = "BINANCE_FUTURES")]
    BinanceFutures,
    /// OKX 현물
    #[serde(rename = "OKX_SPOT")]
    OkxSpot,
    /// OKX 선물
    #[serde(rename = "OKX_FUTURES")]
    OkxFutures,
}

impl ExchangeType {
    /// 와이어 표기 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::BinanceSpot => "BINANCE_SPOT",
            ExchangeType::BinanceFutures => "BINANCE_FUTURES",
            ExchangeType::OkxSpot => "OKX_SPOT",
            ExchangeType::OkxFutures => "OKX_FUTURES",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire_format() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(
            serde_json::from_str::<Side>("\"SELL\"").unwrap(),
            Side::Sell
        );
        assert_eq!(Side::Buy.opposite(), Side::Sell);
    }

    #[test]
    fn test_exchange_wire_format() {
        assert_eq!(
            serde_json::to_string(&ExchangeType::BinanceFutures).unwrap(),
            "\"BINANCE_FUTURES\""
        );
        assert_eq!(
            serde_json::from_str::<ExchangeType>("\"OKX_SPOT\"").unwrap(),
            ExchangeType::OkxSpot
        );
        assert_eq!(ExchangeType::OkxFutures.to_string(), "OKX_FUTURES");
    }
}
