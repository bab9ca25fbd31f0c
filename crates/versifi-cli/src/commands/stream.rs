//! 체결 보고 스트리밍 명령.
//!
//! 연결 후 `execution_report` 토픽을 구독하고, Ctrl-C가 입력될 때까지 수신한
//! 보고를 한 줄씩 출력합니다.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use versifi_client::{op, Credentials, Envelope, WsClient, WILDCARD};
use versifi_core::{AppConfig, ExecutionReport};

/// 스트리밍 설정.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// 모든 토픽을 원문 그대로 출력
    pub all: bool,
    /// 분석 토픽 구독
    pub analytics: bool,
}

/// 스트림을 실행하고 수신한 체결 보고 건수를 반환합니다.
pub async fn run_stream(app: &AppConfig, config: StreamConfig) -> Result<usize> {
    super::require_credentials(app)?;

    // CLI는 재연결 후에도 같은 토픽을 계속 받아야 한다.
    let mut ws_config = app.websocket.clone();
    ws_config.restore_subscriptions = true;

    let client = WsClient::new(Credentials::from(&app.api), ws_config);
    client.set_error_handler(|e| error!(error = %e, "스트림 오류"));

    info!(url = %client.config().url, "Versifi 스트림 연결 중");
    client.connect().await.context("스트림 연결 실패")?;

    let received = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&received);
    client
        .subscribe_execution_report(move |raw| {
            counter.fetch_add(1, Ordering::Relaxed);
            match format_report(raw) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(error = %e, "체결 보고 해석 실패"),
            }
        })
        .await
        .context("체결 보고 구독 실패")?;

    if config.analytics {
        client
            .subscribe_analytics(|raw| println!("[analytics] {}", String::from_utf8_lossy(raw)))
            .await
            .context("분석 토픽 구독 실패")?;
    }

    if config.all {
        client
            .subscribe(WILDCARD, |raw| {
                if let Some(line) = format_raw(raw) {
                    println!("{}", line);
                }
            })
            .await?;
    }

    info!(topics = ?client.topics(), "구독 완료. Ctrl-C로 종료합니다");
    tokio::signal::ctrl_c()
        .await
        .context("종료 신호 대기 실패")?;

    client.disconnect().await?;
    let count = received.load(Ordering::Relaxed);
    info!(count, "스트림 종료");
    Ok(count)
}

/// 체결 보고 프레임을 한 줄 요약으로 변환합니다.
pub fn format_report(raw: &[u8]) -> Result<String> {
    let envelope = Envelope::decode(raw)?;
    let report: ExecutionReport = envelope
        .decode_message()?
        .context("message 필드가 없는 체결 보고")?;

    let mut line = format!(
        "order={} client_order={} status={}",
        report.order_id, report.client_order_id, report.status
    );
    if let Some(order) = report.order_detail()? {
        if let Some(symbol) = order.symbol() {
            line.push_str(&format!(" symbol={}", symbol));
        }
        let fills = order.fills();
        if !fills.is_empty() {
            line.push_str(&format!(
                " fills={} executed={}",
                fills.len(),
                order.executed_quantity()
            ));
        }
    }
    Ok(line)
}

/// 와일드카드 핸들러 출력. 체결 보고는 전용 핸들러가 출력하므로 건너뜁니다.
fn format_raw(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    match Envelope::decode(raw) {
        Ok(envelope) if envelope.op == op::EXECUTION_REPORT => None,
        Ok(envelope) => Some(format!("[{}] {}", envelope.op, text)),
        Err(_) => Some(format!("[?] {}", text)),
    }
}
