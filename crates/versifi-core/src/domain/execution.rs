//! 체결 보고(execution report) 스트림 메시지.
//!
//! `execution_report` 토픽은 주문 수명 주기 이벤트를 전달합니다. 중첩된 `order`
//! 페이로드는 `request_order_type`에 따라 형태가 달라지므로, 원본 JSON을 보관했다가
//! [`ExecutionReport::order_detail`] 호출 시점에 해석합니다.

use crate::domain::decimal;
use crate::types::{
    AlgoOrderType, BasicOrderType, ExchangeType, OrderStatus, RequestOrderType, Side,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 체결 보고 본문 (`message` 필드).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// 주문 ID
    pub order_id: i64,
    /// 클라이언트 주문 ID
    #[serde(default)]
    pub client_order_id: i64,
    /// 주문 유형 (서버 표기)
    #[serde(default)]
    pub order_type: String,
    /// 주문 상태
    pub status: OrderStatus,
    /// 이벤트 시각
    #[serde(default)]
    pub timestamp: i64,
    /// 주문 계열 (`order` 페이로드 형태 결정)
    #[serde(default)]
    pub request_order_type: Option<RequestOrderType>,
    /// 계열별 주문 페이로드 (지연 해석)
    #[serde(default)]
    pub order: Value,
}

impl ExecutionReport {
    /// `order` 페이로드를 계열별 타입으로 해석합니다.
    ///
    /// 계열 정보나 페이로드가 없거나 알 수 없는 계열이면 `Ok(None)`을 반환합니다.
    pub fn order_detail(&self) -> Result<Option<ExecutionOrder>, serde_json::Error> {
        let Some(kind) = self.request_order_type else {
            return Ok(None);
        };
        if self.order.is_null() {
            return Ok(None);
        }

        let order = match kind {
            RequestOrderType::Basic => {
                ExecutionOrder::Basic(serde_json::from_value(self.order.clone())?)
            }
            RequestOrderType::Algo => {
                ExecutionOrder::Algo(serde_json::from_value(self.order.clone())?)
            }
            RequestOrderType::Pair => {
                ExecutionOrder::Pair(serde_json::from_value(self.order.clone())?)
            }
            RequestOrderType::Unknown => return Ok(None),
        };
        Ok(Some(order))
    }
}

/// 계열별 주문 페이로드.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOrder {
    /// 일반 주문
    Basic(BasicOrderUpdate),
    /// 알고리즘 주문
    Algo(AlgoOrderUpdate),
    /// 페어 주문
    Pair(PairOrderUpdate),
}

impl ExecutionOrder {
    /// 이 보고에 포함된 모든 체결 내역.
    pub fn fills(&self) -> Vec<&Fill> {
        match self {
            ExecutionOrder::Basic(order) => ChildOrderFills::collect(order.child_order.as_ref()),
            ExecutionOrder::Algo(order) => ChildOrderFills::collect(order.child_order.as_ref()),
            ExecutionOrder::Pair(order) => {
                let mut fills = Vec::new();
                for leg in [order.lead_leg.as_ref(), order.leg.as_ref()]
                    .into_iter()
                    .flatten()
                {
                    fills.extend(ChildOrderFills::collect(leg.child_order.as_ref()));
                }
                fills
            }
        }
    }

    /// 보고에 포함된 체결 수량 합계.
    pub fn executed_quantity(&self) -> Decimal {
        self.fills().iter().map(|f| f.executed_quantity).sum()
    }

    /// 대표 심볼 (페어 주문은 리드 레그 기준).
    pub fn symbol(&self) -> Option<&str> {
        match self {
            ExecutionOrder::Basic(order) => Some(order.symbol.as_str()),
            ExecutionOrder::Algo(order) => Some(order.symbol.as_str()),
            ExecutionOrder::Pair(order) => order.lead_leg.as_ref().map(|l| l.symbol.as_str()),
        }
    }
}

/// 일반 주문 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicOrderUpdate {
    #[serde(default, deserialize_with = "decimal::optional")]
    pub quote_order_quantity: Option<Decimal>,
    pub symbol: String,
    #[serde(default)]
    pub client_order_id: i64,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub stop_price: Option<Decimal>,
    pub exchange: ExchangeType,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub side: Side,
    pub order_type: BasicOrderType,
    #[serde(default)]
    pub child_order: Option<ChildOrderFills>,
}

/// 알고리즘 주문 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoOrderUpdate {
    #[serde(default)]
    pub id: i64,
    pub exchange: ExchangeType,
    pub order_type: AlgoOrderType,
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub quote_order_quantity: Option<Decimal>,
    pub side: Side,
    pub symbol: String,
    #[serde(default)]
    pub order_params: Option<Value>,
    #[serde(default)]
    pub child_order: Option<ChildOrderFills>,
}

/// 페어 주문 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOrderUpdate {
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub lead_leg: Option<PairLegUpdate>,
    #[serde(default)]
    pub leg: Option<PairLegUpdate>,
}

/// 페어 주문 레그 페이로드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLegUpdate {
    pub symbol: String,
    pub exchange: ExchangeType,
    #[serde(default)]
    pub order_type: String,
    #[serde(default)]
    pub leg_ratio: f64,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub max_position_long: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub max_position_short: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub max_notional_long: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub max_notional_short: Option<Decimal>,
    #[serde(default)]
    pub child_order: Option<ChildOrderFills>,
}

/// 자식 주문과 그 체결 내역.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildOrderFills {
    /// 자식 주문 ID
    pub id: i64,
    /// 체결 내역
    #[serde(default)]
    pub trades: Vec<Fill>,
}

impl ChildOrderFills {
    fn collect(child: Option<&ChildOrderFills>) -> Vec<&Fill> {
        child.map(|c| c.trades.iter().collect()).unwrap_or_default()
    }
}

/// 단일 체결.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// 체결 ID
    pub trade_id: i64,
    /// 평균 체결가
    #[serde(default, deserialize_with = "decimal::optional")]
    pub average_price: Option<Decimal>,
    /// 누적 체결 수량 (서버 필드명은 `cummulative_filled_quantity`)
    #[serde(
        default,
        rename = "cummulative_filled_quantity",
        deserialize_with = "decimal::optional"
    )]
    pub cumulative_filled_quantity: Option<Decimal>,
    /// 주문 ID
    #[serde(default)]
    pub order_id: i64,
    /// 레그 ID (페어 주문 전용)
    #[serde(default)]
    pub leg_id: Option<i64>,
    /// 체결가
    pub executed_price: Decimal,
    /// 체결 수량
    pub executed_quantity: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_minimal_report() {
        let report: ExecutionReport =
            serde_json::from_value(json!({"order_id": 1, "status": "FILLED"})).unwrap();

        assert_eq!(report.order_id, 1);
        assert_eq!(report.status, OrderStatus::Filled);
        assert!(report.order_detail().unwrap().is_none());
    }

    #[test]
    fn test_basic_report_with_fills() {
        let report: ExecutionReport = serde_json::from_value(json!({
            "order_id": 42,
            "client_order_id": 7,
            "order_type": "MARKET",
            "status": "PARTIALLY_FILLED",
            "timestamp": 1700000000,
            "request_order_type": "basic",
            "order": {
                "symbol": "BTC/USDT",
                "client_order_id": 7,
                "exchange": "BINANCE_SPOT",
                "quantity": "1.0",
                "side": "BUY",
                "order_type": "MARKET",
                "child_order": {
                    "id": 900,
                    "trades": [
                        {
                            "trade_id": 1,
                            "order_id": 42,
                            "executed_price": "42000.5",
                            "executed_quantity": "0.25",
                            "average_price": "42000.5",
                            "cummulative_filled_quantity": "0.25"
                        },
                        {
                            "trade_id": 2,
                            "order_id": 42,
                            "executed_price": "42001",
                            "executed_quantity": "0.15"
                        }
                    ]
                }
            }
        }))
        .unwrap();

        let order = report.order_detail().unwrap().unwrap();
        assert_eq!(order.symbol(), Some("BTC/USDT"));
        let fills = order.fills();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].cumulative_filled_quantity, Some(dec!(0.25)));
        assert_eq!(fills[1].average_price, None);
        assert_eq!(order.executed_quantity(), dec!(0.40));
    }

    #[test]
    fn test_pair_report_collects_both_legs() {
        let report: ExecutionReport = serde_json::from_value(json!({
            "order_id": 5,
            "status": "NEW",
            "request_order_type": "pair",
            "order": {
                "lead_leg": {
                    "symbol": "BTC/USDT",
                    "exchange": "BINANCE_SPOT",
                    "order_type": "MARKET",
                    "leg_ratio": 1.0,
                    "child_order": {"id": 1, "trades": [
                        {"trade_id": 10, "leg_id": 1, "executed_price": "100", "executed_quantity": "1"}
                    ]}
                },
                "leg": {
                    "symbol": "BTC/USDT",
                    "exchange": "BINANCE_FUTURES",
                    "order_type": "MARKET",
                    "leg_ratio": 1.0,
                    "child_order": {"id": 2, "trades": [
                        {"trade_id": 11, "leg_id": 2, "executed_price": "101", "executed_quantity": "1"}
                    ]}
                }
            }
        }))
        .unwrap();

        let order = report.order_detail().unwrap().unwrap();
        assert!(matches!(order, ExecutionOrder::Pair(_)));
        let legs: Vec<Option<i64>> = order.fills().iter().map(|f| f.leg_id).collect();
        assert_eq!(legs, vec![Some(1), Some(2)]);
        assert_eq!(order.executed_quantity(), dec!(2));
    }

    #[test]
    fn test_unknown_order_family_is_kept() {
        for family in ["", "spread"] {
            let report: ExecutionReport = serde_json::from_value(json!({
                "order_id": 9,
                "status": "NEW",
                "request_order_type": family,
                "order": {"symbol": "BTC/USDT"}
            }))
            .unwrap();

            assert_eq!(report.request_order_type, Some(RequestOrderType::Unknown));
            assert!(report.order_detail().unwrap().is_none());
        }
    }

    #[test]
    fn test_mismatched_order_payload_is_error() {
        let report: ExecutionReport = serde_json::from_value(json!({
            "order_id": 5,
            "status": "NEW",
            "request_order_type": "algo",
            "order": {"symbol": "BTC/USDT"}
        }))
        .unwrap();

        assert!(report.order_detail().is_err());
    }
}
