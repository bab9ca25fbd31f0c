//! 주문 상태.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 주문 수명 주기 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// 접수됨
    New,
    /// 부분 체결
    PartiallyFilled,
    /// 전량 체결
    Filled,
    /// 취소됨
    Canceled,
    /// 거부됨
    Rejected,
    /// 만료됨
    Expired,
}

impl OrderStatus {
    /// 와이어 표기 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        }
    }

    /// 더 이상 상태가 바뀌지 않는 최종 상태인지 확인.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }

    /// 아직 체결 대기 중인 상태인지 확인.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NEW" => Ok(OrderStatus::New),
            "PARTIALLY_FILLED" => Ok(OrderStatus::PartiallyFilled),
            "FILLED" => Ok(OrderStatus::Filled),
            "CANCELED" | "CANCELLED" => Ok(OrderStatus::Canceled),
            "REJECTED" => Ok(OrderStatus::Rejected),
            "EXPIRED" => Ok(OrderStatus::Expired),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!("filled".parse::<OrderStatus>().unwrap(), OrderStatus::Filled);
        assert_eq!(
            "PARTIALLY_FILLED".parse::<OrderStatus>().unwrap(),
            OrderStatus::PartiallyFilled
        );
        assert_eq!("cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Canceled);
        assert!("open".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(OrderStatus::New.is_open());
        assert!(OrderStatus::PartiallyFilled.is_open());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PartiallyFilled).unwrap(),
            "\"PARTIALLY_FILLED\""
        );
        assert_eq!(OrderStatus::Canceled.to_string(), "CANCELED");
    }
}
