//! Versifi CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 체결 보고 스트리밍 (Ctrl-C로 종료)
//! versifi stream
//!
//! # 모든 토픽 원문 출력
//! versifi stream --all
//!
//! # 주문 조회/목록/취소
//! versifi order get 42
//! versifi order list --limit 20 --status FILLED
//! versifi order cancel 42 43 44
//! ```

use clap::{Parser, Subcommand};
use tracing::info;
use versifi_cli::commands::order::{cancel_orders, get_order, list_orders, ListConfig, OutputFormat};
use versifi_cli::commands::stream::{run_stream, StreamConfig};
use versifi_cli::commands::{load_config, require_credentials};
use versifi_client::RestClient;
use versifi_core::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "versifi")]
#[command(about = "Versifi CLI - 주문 관리 및 체결 보고 스트리밍", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (없으면 환경 변수 사용)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 체결 보고 스트리밍 (Ctrl-C로 종료)
    Stream {
        /// 모든 토픽을 원문 그대로 출력
        #[arg(long)]
        all: bool,

        /// 분석 토픽도 구독
        #[arg(long)]
        analytics: bool,
    },

    /// 주문 관리
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
}

#[derive(Subcommand)]
enum OrderCommands {
    /// 단일 주문 조회
    Get {
        /// 주문 ID
        id: i64,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 주문 목록 조회
    List {
        /// 최대 건수
        #[arg(short, long)]
        limit: Option<u32>,

        /// 시작 위치
        #[arg(short, long)]
        offset: Option<u32>,

        /// 상태 필터 (NEW, PARTIALLY_FILLED, FILLED, CANCELED, REJECTED, EXPIRED)
        #[arg(short, long)]
        status: Option<String>,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 주문 취소 (ID가 여러 개면 일괄 취소)
    Cancel {
        /// 주문 ID 목록
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    match cli.command {
        Commands::Stream { all, analytics } => {
            let count = run_stream(&config, StreamConfig { all, analytics }).await?;
            info!(count, "수신한 체결 보고");
        }
        Commands::Order { command } => {
            require_credentials(&config)?;
            let client = RestClient::new(&config.api)?;

            match command {
                OrderCommands::Get { id, format } => {
                    get_order(&client, id, OutputFormat::parse(&format)?).await?;
                }
                OrderCommands::List {
                    limit,
                    offset,
                    status,
                    format,
                } => {
                    let list = ListConfig {
                        limit,
                        offset,
                        status,
                        format: OutputFormat::parse(&format)?,
                    };
                    list_orders(&client, &list).await?;
                }
                OrderCommands::Cancel { ids } => {
                    cancel_orders(&client, &ids).await?;
                }
            }
        }
    }

    Ok(())
}
