//! 주문 조회/목록/취소 명령.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;
use versifi_client::RestClient;
use versifi_core::{CancelBatchRequest, ListOrdersQuery, OrderDetail, OrderStatus, OrderSummary};

/// 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// 테이블 형식
    #[default]
    Table,
    /// JSON 형식
    Json,
}

impl OutputFormat {
    /// 문자열에서 출력 형식 파싱.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {}. Use: table, json", s),
        }
    }
}

/// 주문 목록 조회 설정.
#[derive(Debug, Clone, Default)]
pub struct ListConfig {
    /// 최대 건수
    pub limit: Option<u32>,
    /// 시작 위치
    pub offset: Option<u32>,
    /// 상태 필터 (NEW, FILLED, ...)
    pub status: Option<String>,
    /// 출력 형식
    pub format: OutputFormat,
}

impl ListConfig {
    /// REST 쿼리로 변환합니다.
    pub fn to_query(&self) -> Result<ListOrdersQuery> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()
            .map_err(anyhow::Error::msg)?;

        Ok(ListOrdersQuery {
            limit: self.limit,
            offset: self.offset,
            status,
        })
    }
}

/// 단일 주문을 조회하여 출력합니다.
pub async fn get_order(client: &RestClient, order_id: i64, format: OutputFormat) -> Result<()> {
    let order = client
        .get_order(order_id)
        .await
        .with_context(|| format!("주문 조회 실패: {}", order_id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&order)?),
        OutputFormat::Table => println!("{}", format_detail(&order)),
    }
    Ok(())
}

/// 주문 목록을 조회하여 출력하고 건수를 반환합니다.
pub async fn list_orders(client: &RestClient, config: &ListConfig) -> Result<usize> {
    let query = config.to_query()?;
    let orders = client
        .list_orders(&query)
        .await
        .context("주문 목록 조회 실패")?;

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&orders)?),
        OutputFormat::Table => print!("{}", format_summary_table(&orders)),
    }
    info!(count = orders.len(), "주문 목록 조회 완료");
    Ok(orders.len())
}

/// 주문을 취소합니다. ID가 여러 개면 일괄 취소를 사용합니다.
pub async fn cancel_orders(client: &RestClient, ids: &[i64]) -> Result<()> {
    match ids {
        [] => anyhow::bail!("취소할 주문 ID가 없습니다"),
        [id] => client
            .cancel_order(*id)
            .await
            .with_context(|| format!("주문 취소 실패: {}", id))?,
        _ => client
            .cancel_orders(&CancelBatchRequest::new(ids.iter().copied()))
            .await
            .context("일괄 취소 실패")?,
    }

    info!(ids = ?ids, "주문 취소 요청 완료");
    println!("Cancel requested for {} order(s)", ids.len());
    Ok(())
}

/// 서버 타임스탬프를 RFC 3339 문자열로 변환합니다.
///
/// 자릿수로 초/밀리초/마이크로초 단위를 구분합니다. 0은 "-"로 표시합니다.
pub fn format_timestamp(ts: i64) -> String {
    if ts <= 0 {
        return "-".to_string();
    }

    let parsed: Option<DateTime<Utc>> = if ts >= 100_000_000_000_000 {
        DateTime::from_timestamp_micros(ts)
    } else if ts >= 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    };

    parsed
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// 주문 목록을 테이블 문자열로 변환합니다.
pub fn format_summary_table(orders: &[OrderSummary]) -> String {
    let mut out = format!(
        "{:<12} {:<12} {:<18} {:<8} {:<20} {}\n",
        "ORDER_ID", "CLIENT_ID", "STATUS", "KIND", "TIME", "REJECT_REASON"
    );
    out.push_str(&"-".repeat(84));
    out.push('\n');

    for order in orders {
        let kind = order
            .request_order_type
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<12} {:<12} {:<18} {:<8} {:<20} {}\n",
            order.order_id,
            order.client_order_id,
            order.status,
            kind,
            format_timestamp(order.timestamp),
            order.reject_reason
        ));
    }
    out
}

fn format_detail(order: &OrderDetail) -> String {
    let mut lines = vec![
        format!("Order ID:        {}", order.order_id),
        format!("Client Order ID: {}", order.client_order_id),
        format!("Status:          {}", order.status),
        format!("Order Type:      {}", order.order_type),
        format!("Time:            {}", format_timestamp(order.timestamp)),
    ];

    if let Some(basic) = &order.basic_order {
        lines.push(format!(
            "Basic:           {} {} {} @ {} on {}",
            basic.side,
            basic.quantity,
            basic.symbol,
            basic
                .price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "MKT".to_string()),
            basic.exchange
        ));
        if let Some(filled) = basic.filled_quantity {
            lines.push(format!("Filled:          {}", filled));
        }
    }
    if let Some(algo) = &order.algo_order {
        lines.push(format!(
            "Algo:            {:?} {} {} {} on {}",
            algo.order_type, algo.side, algo.quantity, algo.symbol, algo.exchange
        ));
        if let Some(filled) = algo.filled_quantity {
            lines.push(format!("Filled:          {}", filled));
        }
    }
    if let Some(pair) = &order.pair_order {
        for (name, leg) in [("Lead", &pair.lead_leg), ("Secondary", &pair.secondary)] {
            if let Some(leg) = leg {
                lines.push(format!(
                    "{:<17}{} on {} (ratio {})",
                    format!("{}:", name),
                    leg.symbol,
                    leg.exchange,
                    leg.leg_ratio
                ));
            }
        }
    }
    if let Some(reason) = order.reject_reason() {
        lines.push(format!("Reject Reason:   {}", reason));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use versifi_core::RequestOrderType;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("TABLE").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("csv").is_err());
    }

    #[test]
    fn test_list_config_to_query() {
        let config = ListConfig {
            limit: Some(10),
            status: Some("filled".to_string()),
            ..Default::default()
        };
        let query = config.to_query().unwrap();

        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, None);
        assert_eq!(query.status, Some(OrderStatus::Filled));
    }

    #[test]
    fn test_list_config_rejects_unknown_status() {
        let config = ListConfig {
            status: Some("DONE".to_string()),
            ..Default::default()
        };
        assert!(config.to_query().is_err());
    }

    #[test]
    fn test_format_timestamp_units() {
        assert_eq!(format_timestamp(0), "-");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(1_700_000_000_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_summary_table_rows() {
        let orders = vec![OrderSummary {
            order_id: 42,
            client_order_id: 7,
            status: OrderStatus::Rejected,
            timestamp: 0,
            request_order_type: Some(RequestOrderType::Basic),
            reject_reason: "insufficient balance".to_string(),
        }];
        let table = format_summary_table(&orders);
        let rows: Vec<&str> = table.lines().collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("ORDER_ID"));
        assert!(rows[2].starts_with("42"));
        assert!(rows[2].contains("REJECTED"));
        assert!(rows[2].ends_with("insufficient balance"));
    }
}
