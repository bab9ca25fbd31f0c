//! 주문 요청 및 응답 타입.
//!
//! 이 모듈은 Versifi REST API의 주문 관련 타입을 정의합니다:
//! - `BasicOrderRequest` / `AlgoOrderRequest` / `PairOrderRequest` - 주문 생성 요청
//! - `CancelBatchRequest` - 일괄 취소 요청
//! - `ListOrdersQuery` - 주문 목록 조회 조건
//! - `OrderResponse` - 주문 생성 응답
//! - `OrderDetail` / `OrderSummary` - 주문 조회 응답

use crate::domain::decimal;
use crate::types::{
    AlgoOrderType, BasicOrderType, ExchangeType, OrderStatus, PairOrderType, PairStyle,
    RequestOrderType, Side, TimeInForce,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 알고리즘 파라미터 (예: `duration`, `slice_size`, `volume_percentage`).
pub type OrderParams = Map<String, Value>;

// ============================================================================
// 주문 생성 요청
// ============================================================================

/// 일반 주문 생성 요청 (`POST /v2/orders/basic/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicOrderRequest {
    /// 클라이언트 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<i64>,
    /// 거래소
    pub exchange: ExchangeType,
    /// 주문 유형
    pub order_type: BasicOrderType,
    /// 가격 (지정가 계열 필수)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// 수량
    pub quantity: Decimal,
    /// 주문 방향
    pub side: Side,
    /// 시작 시각 (UTC epoch 마이크로초)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// 스탑 가격 (손절/익절 계열 필수)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
    /// 심볼 (형식: 자산/통화, 예: BTC/USD)
    pub symbol: String,
    /// 유효 기간 (미지정 시 서버 기본값 GTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tif: Option<TimeInForce>,
    /// 트레일링 델타
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_delta: Option<Decimal>,
}

impl BasicOrderRequest {
    /// 새 일반 주문 요청 생성.
    pub fn new(
        exchange: ExchangeType,
        symbol: impl Into<String>,
        side: Side,
        order_type: BasicOrderType,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id: None,
            exchange,
            order_type,
            price: None,
            quantity,
            side,
            start_time: None,
            stop_price: None,
            symbol: symbol.into(),
            tif: None,
            trailing_delta: None,
        }
    }

    /// 시장가 주문.
    pub fn market(
        exchange: ExchangeType,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
    ) -> Self {
        Self::new(exchange, symbol, side, BasicOrderType::Market, quantity)
    }

    /// 지정가 주문.
    pub fn limit(
        exchange: ExchangeType,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(exchange, symbol, side, BasicOrderType::Limit, quantity).with_price(price)
    }

    /// 클라이언트 주문 ID 설정.
    pub fn with_client_order_id(mut self, id: i64) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// 가격 설정.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// 스탑 가격 설정.
    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    /// 유효 기간 설정.
    pub fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = Some(tif);
        self
    }

    /// 시작 시각 설정 (마이크로초).
    pub fn with_start_time(mut self, start_time_us: i64) -> Self {
        self.start_time = Some(start_time_us);
        self
    }

    /// 트레일링 델타 설정.
    pub fn with_trailing_delta(mut self, delta: Decimal) -> Self {
        self.trailing_delta = Some(delta);
        self
    }

    /// 전송 전 필수 필드를 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= Decimal::ZERO {
            return Err(format!("quantity must be positive: {}", self.quantity));
        }
        if self.symbol.is_empty() {
            return Err("symbol is required".to_string());
        }
        if self.order_type.requires_price() && self.price.is_none() {
            return Err(format!("{:?} order requires price", self.order_type));
        }
        if self.order_type.requires_stop_price() && self.stop_price.is_none() {
            return Err(format!("{:?} order requires stop_price", self.order_type));
        }
        Ok(())
    }
}

/// 알고리즘 주문 생성 요청 (`POST /v2/orders/algo/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoOrderRequest {
    /// 클라이언트 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<i64>,
    /// 거래소
    pub exchange: ExchangeType,
    /// 알고리즘 유형
    pub order_type: AlgoOrderType,
    /// 알고리즘 파라미터 (IS는 `duration` 필수)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<OrderParams>,
    /// 수량
    pub quantity: Decimal,
    /// 주문 방향
    pub side: Side,
    /// 심볼
    pub symbol: String,
}

impl AlgoOrderRequest {
    /// 새 알고리즘 주문 요청 생성.
    pub fn new(
        exchange: ExchangeType,
        symbol: impl Into<String>,
        side: Side,
        order_type: AlgoOrderType,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id: None,
            exchange,
            order_type,
            params: None,
            quantity,
            side,
            symbol: symbol.into(),
        }
    }

    /// 클라이언트 주문 ID 설정.
    pub fn with_client_order_id(mut self, id: i64) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// 알고리즘 파라미터 하나를 추가합니다.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// 전송 전 필수 필드를 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= Decimal::ZERO {
            return Err(format!("quantity must be positive: {}", self.quantity));
        }
        let has_duration = self
            .params
            .as_ref()
            .map_or(false, |p| p.contains_key("duration"));
        if self.order_type == AlgoOrderType::Is && !has_duration {
            return Err("IS order requires params.duration".to_string());
        }
        Ok(())
    }
}

/// 페어 주문의 레그 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLeg {
    /// 거래소
    pub exchange: ExchangeType,
    /// 심볼
    pub symbol: String,
    /// 레그 주문 유형
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    /// 레그 비율
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg_ratio: Option<f64>,
    /// 최대 롱 포지션
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position_long: Option<Decimal>,
    /// 최대 숏 포지션
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position_short: Option<Decimal>,
    /// 최대 롱 명목가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_notional_long: Option<Decimal>,
    /// 최대 숏 명목가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_notional_short: Option<Decimal>,
    /// 레그별 파라미터
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<OrderParams>,
}

impl PairLeg {
    /// 새 레그 설정 생성.
    pub fn new(exchange: ExchangeType, symbol: impl Into<String>) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            order_type: None,
            leg_ratio: None,
            max_position_long: None,
            max_position_short: None,
            max_notional_long: None,
            max_notional_short: None,
            params: None,
        }
    }

    /// 레그 비율 설정.
    pub fn with_leg_ratio(mut self, ratio: f64) -> Self {
        self.leg_ratio = Some(ratio);
        self
    }

    /// 포지션 한도 설정.
    pub fn with_position_limits(mut self, long: Decimal, short: Decimal) -> Self {
        self.max_position_long = Some(long);
        self.max_position_short = Some(short);
        self
    }

    /// 명목가 한도 설정.
    pub fn with_notional_limits(mut self, long: Decimal, short: Decimal) -> Self {
        self.max_notional_long = Some(long);
        self.max_notional_short = Some(short);
        self
    }
}

/// 페어 주문의 리드 설정.
///
/// 리드 레그의 거래소/심볼/비율은 이 객체에 평탄화되어 전송됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLeadConfig {
    /// 페어 주문 유형
    pub order_type: PairOrderType,
    /// 알고리즘 파라미터
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<OrderParams>,
    /// 리드 레그 거래소
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeType>,
    /// 리드 레그 심볼
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// 리드 레그 비율
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg_ratio: Option<f64>,
}

/// 페어 주문 생성 요청 (`POST /v2/orders/pair/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOrderRequest {
    /// 클라이언트 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<i64>,
    /// 리드 설정
    pub lead: PairLeadConfig,
    /// 세컨더리 레그
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<PairLeg>,
    /// 실행 스타일
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<PairStyle>,
}

impl PairOrderRequest {
    /// 리드/세컨더리 레그로 페어 주문 요청 생성.
    ///
    /// 리드 레그의 파라미터는 주문 파라미터에 병합되며, 같은 키는 레그 값이 우선합니다.
    pub fn new(
        order_type: PairOrderType,
        params: Option<OrderParams>,
        lead: PairLeg,
        secondary: PairLeg,
    ) -> Self {
        let mut merged = params;
        if let Some(leg_params) = lead.params {
            let target = merged.get_or_insert_with(Map::new);
            for (key, value) in leg_params {
                target.insert(key, value);
            }
        }

        Self {
            client_order_id: None,
            lead: PairLeadConfig {
                order_type,
                params: merged,
                exchange: Some(lead.exchange),
                symbol: Some(lead.symbol),
                leg_ratio: lead.leg_ratio,
            },
            secondary: Some(secondary),
            style: None,
        }
    }

    /// 클라이언트 주문 ID 설정.
    pub fn with_client_order_id(mut self, id: i64) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// 실행 스타일 설정.
    pub fn with_style(mut self, style: PairStyle) -> Self {
        self.style = Some(style);
        self
    }
}

/// 일괄 취소 요청 (`DELETE /v2/orders/batch`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBatchRequest {
    /// 취소할 주문 ID 목록
    pub ids: Vec<i64>,
}

impl CancelBatchRequest {
    /// 주문 ID 목록으로 생성.
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// 주문 ID 하나를 추가합니다.
    pub fn push(&mut self, id: i64) {
        self.ids.push(id);
    }
}

/// 주문 목록 조회 조건 (`GET /v2/orders`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOrdersQuery {
    /// 최대 건수
    pub limit: Option<u32>,
    /// 시작 위치
    pub offset: Option<u32>,
    /// 상태 필터
    pub status: Option<OrderStatus>,
}

impl ListOrdersQuery {
    /// 쿼리 파라미터 목록 (키 이름순).
    ///
    /// 0 값은 서버 기본값을 쓰도록 생략합니다.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit.filter(|v| *v > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|v| *v > 0) {
            params.push(("offset", offset.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}

// ============================================================================
// 응답
// ============================================================================

/// 페어 주문 레그 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegResponse {
    /// 레그 ID
    pub leg_id: i64,
    /// 레그 상태
    pub status: OrderStatus,
}

/// 주문 생성 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    /// 주문 ID
    pub order_id: i64,
    /// 클라이언트 주문 ID
    #[serde(default)]
    pub client_order_id: i64,
    /// 주문 상태
    pub status: OrderStatus,
    /// 리드 레그 (페어 주문)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<LegResponse>,
    /// 세컨더리 레그 (페어 주문)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<LegResponse>,
}

/// 개별 체결 내역 (주문 조회).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 체결 ID
    pub trade_id: i64,
    /// 주문 ID
    #[serde(default)]
    pub order_id: i64,
    /// 자식 주문 ID
    #[serde(default)]
    pub child_order_id: i64,
    /// 거래소 체결 ID
    #[serde(default)]
    pub exchange_trade_id: String,
    /// 거래소
    #[serde(default)]
    pub exchange: Option<ExchangeType>,
    /// 심볼
    #[serde(default)]
    pub symbol: String,
    /// 체결가
    #[serde(default, deserialize_with = "decimal::optional")]
    pub price: Option<Decimal>,
    /// 체결 수량
    #[serde(default, deserialize_with = "decimal::optional")]
    pub quantity: Option<Decimal>,
    /// 방향
    #[serde(default)]
    pub side: Option<Side>,
    /// 수수료
    #[serde(default, deserialize_with = "decimal::optional")]
    pub fee: Option<Decimal>,
    /// 레그 ID (페어 주문)
    #[serde(default)]
    pub leg_id: i64,
}

/// 자식 주문 (거래소로 실제 전송된 주문).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildOrder {
    /// ID
    #[serde(default)]
    pub id: i64,
    /// 자식 주문 ID
    #[serde(default)]
    pub child_order_id: i64,
    /// 부모 주문 ID
    #[serde(default)]
    pub order_id: i64,
    /// 거래소
    #[serde(default)]
    pub exchange: Option<ExchangeType>,
    /// 거래소 주문 ID
    #[serde(default)]
    pub exchange_order_id: String,
    /// 심볼
    #[serde(default)]
    pub symbol: String,
    /// 주문 유형
    #[serde(default)]
    pub order_type: String,
    /// 가격
    #[serde(default, deserialize_with = "decimal::optional")]
    pub price: Option<Decimal>,
    /// 수량
    #[serde(default, deserialize_with = "decimal::optional")]
    pub quantity: Option<Decimal>,
    /// 방향
    #[serde(default)]
    pub side: Option<Side>,
    /// 상태
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
    /// 평균 체결가
    #[serde(default, deserialize_with = "decimal::optional")]
    pub average_price: Option<Decimal>,
    /// 체결 수량
    #[serde(default, deserialize_with = "decimal::optional")]
    pub filled_quantity: Option<Decimal>,
    /// 거부 사유
    #[serde(default)]
    pub reject_reason: String,
    /// 레그 ID
    #[serde(default)]
    pub leg_id: i64,
    /// 체결 내역
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}

/// 일반 주문 상세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicOrderDetail {
    pub exchange: ExchangeType,
    pub order_type: BasicOrderType,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub quote_order_quantity: Option<Decimal>,
    pub side: Side,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub stop_price: Option<Decimal>,
    pub symbol: String,
    #[serde(default)]
    pub tif: Option<TimeInForce>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub trailing_delta: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub average_price: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub filled_quantity: Option<Decimal>,
    #[serde(default)]
    pub reject_reason: String,
    #[serde(default)]
    pub child_orders: Vec<ChildOrder>,
}

/// 알고리즘 주문 상세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoOrderDetail {
    pub exchange: ExchangeType,
    pub order_type: AlgoOrderType,
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub quote_order_quantity: Option<Decimal>,
    pub side: Side,
    pub symbol: String,
    #[serde(default)]
    pub order_params: Option<Value>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub average_price: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub filled_quantity: Option<Decimal>,
    #[serde(default)]
    pub reject_reason: String,
    #[serde(default)]
    pub tif: Option<TimeInForce>,
    #[serde(default)]
    pub child_orders: Vec<ChildOrder>,
}

/// 페어 주문 레그 상세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLegDetail {
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
    #[serde(default, rename = "child_order")]
    pub child_orders: Vec<ChildOrder>,
}

/// 페어 주문 상세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOrderDetail {
    #[serde(default)]
    pub lead_leg: Option<PairLegDetail>,
    #[serde(default, rename = "leg")]
    pub secondary: Option<PairLegDetail>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub reject_reason: String,
    #[serde(default)]
    pub style: Option<PairStyle>,
}

/// 주문 조회 응답 (`GET /v2/orders/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order_id: i64,
    #[serde(default)]
    pub client_order_id: i64,
    #[serde(default)]
    pub order_type: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub request_order_type: Option<RequestOrderType>,
    #[serde(default)]
    pub algo_order: Option<AlgoOrderDetail>,
    #[serde(default)]
    pub basic_order: Option<BasicOrderDetail>,
    #[serde(default)]
    pub pair_order: Option<PairOrderDetail>,
}

impl OrderDetail {
    /// 거부 사유가 있으면 반환합니다.
    pub fn reject_reason(&self) -> Option<&str> {
        let reason = self
            .basic_order
            .as_ref()
            .map(|o| o.reject_reason.as_str())
            .or_else(|| self.algo_order.as_ref().map(|o| o.reject_reason.as_str()))
            .or_else(|| self.pair_order.as_ref().map(|o| o.reject_reason.as_str()))?;
        (!reason.is_empty()).then_some(reason)
    }
}

/// 주문 목록 항목 (`GET /v2/orders`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    #[serde(default)]
    pub client_order_id: i64,
    pub status: OrderStatus,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub request_order_type: Option<RequestOrderType>,
    #[serde(default)]
    pub reject_reason: String,
}
