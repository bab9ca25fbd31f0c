//! REST 클라이언트 통합 테스트
//!
//! mockito 서버로 서명 헤더, 요청 본문, 에러 매핑을 확인

use mockito::{Matcher, Server, ServerGuard};
use rust_decimal_macros::dec;
use serde_json::json;
use versifi_client::{ClientError, RestClient, Signer};
use versifi_core::{
    ApiConfig, BasicOrderRequest, BasicOrderType, CancelBatchRequest, ExchangeType,
    ListOrdersQuery, OrderStatus, RequestOrderType, Side,
};

const KEY: &str = "test-key";
const SECRET: &str = "test-secret";

fn client(server: &ServerGuard) -> RestClient {
    RestClient::new(&ApiConfig::new(KEY, SECRET).with_base_url(server.url())).unwrap()
}

fn sign(payload: &str) -> String {
    Signer::new(SECRET).sign(payload.as_bytes())
}

#[tokio::test]
async fn test_create_basic_order_signs_body() {
    let mut server = Server::new_async().await;
    let order = BasicOrderRequest::limit(
        ExchangeType::BinanceSpot,
        "BTC/USDT",
        Side::Buy,
        dec!(0.5),
        dec!(42000),
    )
    .with_client_order_id(7);
    let body = serde_json::to_string(&order).unwrap();

    let mock = server
        .mock("POST", "/v2/orders/basic/")
        .match_header("x-versifi-api-key", KEY)
        .match_header("x-versifi-api-sign", sign(&body).as_str())
        .match_header("content-type", "application/json")
        .match_body(Matcher::JsonString(body.clone()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"order_id":101,"client_order_id":7,"status":"NEW"}"#)
        .create_async()
        .await;

    let response = client(&server).create_basic_order(&order).await.unwrap();

    assert_eq!(response.order_id, 101);
    assert_eq!(response.client_order_id, 7);
    assert_eq!(response.status, OrderStatus::New);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_order_is_not_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/orders/basic/")
        .expect(0)
        .create_async()
        .await;

    let order = BasicOrderRequest::new(
        ExchangeType::OkxSpot,
        "ETH/USDT",
        Side::Sell,
        BasicOrderType::Limit,
        dec!(1),
    );
    let err = client(&server).create_basic_order(&order).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidRequest(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_orders_signs_sorted_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/orders")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("status".into(), "NEW".into()),
        ]))
        .match_header("x-versifi-api-sign", sign("limit=10&status=NEW").as_str())
        .with_status(200)
        .with_body(
            json!([
                {"order_id": 1, "client_order_id": 11, "status": "NEW", "timestamp": 1700000000, "request_order_type": "basic", "reject_reason": ""},
                {"order_id": 2, "status": "NEW", "request_order_type": "algo"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let query = ListOrdersQuery {
        limit: Some(10),
        offset: Some(0),
        status: Some(OrderStatus::New),
    };
    let orders = client(&server).list_orders(&query).await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].client_order_id, 11);
    assert_eq!(orders[1].request_order_type, Some(RequestOrderType::Algo));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/orders/42")
        .match_header("x-versifi-api-sign", sign("").as_str())
        .with_status(200)
        .with_body(
            json!({
                "order_id": 42,
                "status": "FILLED",
                "request_order_type": "basic",
                "basic_order": {
                    "exchange": "BINANCE_FUTURES",
                    "order_type": "MARKET",
                    "quantity": "3",
                    "side": "SELL",
                    "symbol": "ETH/USDT",
                    "average_price": "2500.5",
                    "filled_quantity": "3"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let detail = client(&server).get_order(42).await.unwrap();

    assert_eq!(detail.status, OrderStatus::Filled);
    let basic = detail.basic_order.unwrap();
    assert_eq!(basic.average_price, Some(dec!(2500.5)));
    assert_eq!(basic.filled_quantity, Some(dec!(3)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_cancel_orders() {
    let mut server = Server::new_async().await;
    let single = server
        .mock("DELETE", "/v2/orders/7")
        .with_status(204)
        .create_async()
        .await;
    let batch = server
        .mock("DELETE", "/v2/orders/batch")
        .match_body(Matcher::Json(json!({"ids": [1, 2, 3]})))
        .match_header("x-versifi-api-sign", sign("").as_str())
        .with_status(204)
        .create_async()
        .await;

    let client = client(&server);
    client.cancel_order(7).await.unwrap();
    client
        .cancel_orders(&CancelBatchRequest::new([1, 2, 3]))
        .await
        .unwrap();
    assert!(matches!(
        client.cancel_orders(&CancelBatchRequest::default()).await,
        Err(ClientError::InvalidRequest(_))
    ));

    single.assert_async().await;
    batch.assert_async().await;
}

#[tokio::test]
async fn test_error_responses() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/orders/1")
        .with_status(401)
        .with_body(r#"{"code":401,"message":"invalid api key"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/orders/2")
        .with_status(429)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/orders/3")
        .with_status(404)
        .with_body(r#"{"code":2011,"message":"order not found"}"#)
        .create_async()
        .await;

    let client = client(&server);

    assert!(matches!(
        client.get_order(1).await,
        Err(ClientError::Unauthorized(ref m)) if m == "invalid api key"
    ));
    assert!(matches!(client.get_order(2).await, Err(ClientError::RateLimited)));
    assert!(matches!(
        client.get_order(3).await,
        Err(ClientError::Api { code: 2011, ref message }) if message == "order not found"
    ));
}
