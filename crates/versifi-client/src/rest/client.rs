//! 서명된 REST 요청 클라이언트.
//!
//! 모든 요청은 `X-VERSIFI-API-KEY`와 `X-VERSIFI-API-SIGN` 헤더를 가집니다.
//! 서명 대상은 GET/DELETE의 경우 정렬된 쿼리 문자열, POST/PUT의 경우 JSON 본문입니다.

use crate::auth::Credentials;
use crate::error::{ClientError, ClientResult};
use crate::websocket::transport::parse_local_addr;
use reqwest::header::{CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use versifi_core::{
    AlgoOrderRequest, ApiConfig, BasicOrderRequest, CancelBatchRequest, ListOrdersQuery,
    OrderDetail, OrderResponse, OrderSummary, PairOrderRequest,
};

/// API 키 헤더.
pub const API_KEY_HEADER: &str = "X-VERSIFI-API-KEY";

/// 서명 헤더.
pub const API_SIGN_HEADER: &str = "X-VERSIFI-API-SIGN";

/// 기본 User-Agent.
pub const USER_AGENT: &str = concat!("versifi-rs/", env!("CARGO_PKG_VERSION"));

/// API 에러 응답 본문.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Versifi REST 클라이언트.
pub struct RestClient {
    credentials: Credentials,
    base_url: String,
    client: Client,
}

impl RestClient {
    /// 새 REST 클라이언트 생성.
    ///
    /// `local_addr`가 설정되어 있으면 해당 IP로 바인딩합니다.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ClientError::Network`를 반환합니다.
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let mut builder = Client::builder().timeout(config.timeout());
        if let Some(ip) = config.local_addr.as_deref().and_then(parse_local_addr) {
            builder = builder.local_address(ip);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            credentials: Credentials::from(config),
            base_url: config.rest_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// 환경 변수에서 생성.
    pub fn from_env() -> Option<Self> {
        ApiConfig::from_env().and_then(|config| Self::new(&config).ok())
    }

    /// 기본 URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // 주문
    // ========================================================================

    /// 일반 주문 생성 (`POST /v2/orders/basic/`).
    pub async fn create_basic_order(
        &self,
        order: &BasicOrderRequest,
    ) -> ClientResult<OrderResponse> {
        order.validate().map_err(ClientError::InvalidRequest)?;
        self.post("/v2/orders/basic/", order).await
    }

    /// 알고리즘 주문 생성 (`POST /v2/orders/algo/`).
    pub async fn create_algo_order(&self, order: &AlgoOrderRequest) -> ClientResult<OrderResponse> {
        order.validate().map_err(ClientError::InvalidRequest)?;
        self.post("/v2/orders/algo/", order).await
    }

    /// 페어 주문 생성 (`POST /v2/orders/pair/`).
    pub async fn create_pair_order(&self, order: &PairOrderRequest) -> ClientResult<OrderResponse> {
        self.post("/v2/orders/pair/", order).await
    }

    /// 주문 취소 (`DELETE /v2/orders/{id}`). 결과는 체결 보고 스트림으로 전달됩니다.
    pub async fn cancel_order(&self, order_id: i64) -> ClientResult<()> {
        let endpoint = format!("/v2/orders/{}", order_id);
        self.send(Method::DELETE, &endpoint, &[], None).await?;
        Ok(())
    }

    /// 주문 일괄 취소 (`DELETE /v2/orders/batch`).
    pub async fn cancel_orders(&self, batch: &CancelBatchRequest) -> ClientResult<()> {
        if batch.ids.is_empty() {
            return Err(ClientError::InvalidRequest(
                "batch cancel requires at least one id".to_string(),
            ));
        }
        let body = serde_json::to_string(batch)?;
        self.send(Method::DELETE, "/v2/orders/batch", &[], Some(body))
            .await?;
        Ok(())
    }

    /// 주문 조회 (`GET /v2/orders/{id}`).
    pub async fn get_order(&self, order_id: i64) -> ClientResult<OrderDetail> {
        let endpoint = format!("/v2/orders/{}", order_id);
        let body = self.send(Method::GET, &endpoint, &[], None).await?;
        Self::decode(&body)
    }

    /// 주문 목록 조회 (`GET /v2/orders`).
    pub async fn list_orders(&self, query: &ListOrdersQuery) -> ClientResult<Vec<OrderSummary>> {
        let body = self
            .send(Method::GET, "/v2/orders", &query.to_params(), None)
            .await?;
        Self::decode(&body)
    }

    // ========================================================================
    // 요청 처리
    // ========================================================================

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_string(body)?;
        let response = self.send(Method::POST, endpoint, &[], Some(body)).await?;
        Self::decode(&response)
    }

    /// 서명된 요청을 보내고 성공 응답 본문을 반환합니다.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        body: Option<String>,
    ) -> ClientResult<String> {
        let url = self.build_url(endpoint, params)?;
        let payload = Self::signing_payload(&method, &url, body.as_deref());
        let signature = self.credentials.signer().sign(payload.as_bytes());

        debug!(method = %method, endpoint, "Versifi REST 요청");

        let mut request = self
            .client
            .request(method, url)
            .header(API_KEY_HEADER, self.credentials.api_key())
            .header(API_SIGN_HEADER, signature)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// 쿼리 파라미터를 키 이름순으로 정렬해 URL을 만듭니다.
    fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> ClientResult<Url> {
        let url = format!("{}{}", self.base_url, endpoint);
        let result = if params.is_empty() {
            Url::parse(&url)
        } else {
            let mut sorted = params.to_vec();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Url::parse_with_params(&url, sorted.iter().map(|(k, v)| (*k, v.as_str())))
        };
        result.map_err(|e| ClientError::InvalidRequest(format!("invalid URL {}: {}", url, e)))
    }

    /// 서명 대상: GET/DELETE는 쿼리 문자열, 그 외는 본문.
    fn signing_payload<'a>(method: &Method, url: &'a Url, body: Option<&'a str>) -> &'a str {
        if *method == Method::GET || *method == Method::DELETE {
            url.query().unwrap_or("")
        } else {
            body.unwrap_or("")
        }
    }

    async fn handle_response(response: reqwest::Response) -> ClientResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(Self::map_error(status, &body))
        }
    }

    fn map_error(status: StatusCode, body: &str) -> ClientError {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            _ => ClientError::Api {
                code: parsed
                    .map(|e| e.code)
                    .filter(|c| *c != 0)
                    .unwrap_or(status.as_u16() as i32),
                message,
            },
        }
    }

    fn decode<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
        serde_json::from_str(body).map_err(|e| {
            error!("Failed to parse response: {} - Body: {}", e, body);
            ClientError::Parse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        RestClient::new(&ApiConfig::new("key", "secret").with_base_url("https://api.test/"))
            .unwrap()
    }

    #[test]
    fn test_query_is_sorted_and_signed() {
        let client = client();
        let url = client
            .build_url(
                "/v2/orders",
                &[("status", "NEW".to_string()), ("limit", "10".to_string())],
            )
            .unwrap();

        assert_eq!(url.as_str(), "https://api.test/v2/orders?limit=10&status=NEW");
        assert_eq!(
            RestClient::signing_payload(&Method::GET, &url, None),
            "limit=10&status=NEW"
        );
    }

    #[test]
    fn test_post_signs_body() {
        let client = client();
        let url = client.build_url("/v2/orders/basic/", &[]).unwrap();

        assert_eq!(url.query(), None);
        assert_eq!(
            RestClient::signing_payload(&Method::POST, &url, Some(r#"{"a":1}"#)),
            r#"{"a":1}"#
        );
        assert_eq!(RestClient::signing_payload(&Method::DELETE, &url, Some("{}")), "");
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            RestClient::map_error(StatusCode::UNAUTHORIZED, r#"{"code":401,"message":"bad sig"}"#),
            ClientError::Unauthorized(m) if m == "bad sig"
        ));
        assert!(matches!(
            RestClient::map_error(StatusCode::TOO_MANY_REQUESTS, ""),
            ClientError::RateLimited
        ));
        assert!(matches!(
            RestClient::map_error(StatusCode::BAD_REQUEST, r#"{"code":1002,"message":"invalid symbol"}"#),
            ClientError::Api { code: 1002, ref message } if message == "invalid symbol"
        ));
        assert!(matches!(
            RestClient::map_error(StatusCode::BAD_GATEWAY, "upstream down"),
            ClientError::Api { code: 502, ref message } if message == "upstream down"
        ));
    }
}
