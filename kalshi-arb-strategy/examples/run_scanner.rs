//! Continuous opportunity scanner for Kalshi markets.
//!
//! Wires together:
//! - Kalshi REST transport (paced, RSA-PSS signed when credentials are present)
//! - Probability arbitrage analysis & spread crossing detection
//! - Optional spread execution
//!
//! Usage:
//!   # Set environment variables in .env
//!   KALSHI_API_KEY=...
//!   KALSHI_PRIVATE_KEY_PATH=./kalshi-priv.pem
//!   KALSHI_DEMO=true               (optional)
//!   MIN_PROFIT_CENTS=2             (optional, see ScannerConfig::from_env)
//!   SCAN_INTERVAL_SECS=30          (optional)
//!   MAX_SCANS=10                   (optional, unbounded by default)
//!   AUTO_EXECUTE=false             (optional)
//!
//!   cargo run -p kalshi-arb-strategy --example run_scanner

use kalshi_arb_execution::client::kalshi::{KalshiExecution, KalshiExecutionConfig};
use kalshi_arb_strategy::{OpportunityScanner, Recommendation, ScanReport, ScannerConfig};
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_logging();

    let transport_config =
        KalshiExecutionConfig::from_env().expect("Invalid Kalshi transport configuration");
    let config = ScannerConfig::from_env().expect("Invalid scanner configuration");

    let scan_interval = Duration::from_secs(env_or("SCAN_INTERVAL_SECS", DEFAULT_SCAN_INTERVAL_SECS));
    let max_scans = std::env::var("MAX_SCANS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok());
    let auto_execute = env_or("AUTO_EXECUTE", false);

    info!(
        base_url = %transport_config.base_url,
        authenticated = transport_config.credentials.is_some(),
        market_limit = config.market_limit,
        ?scan_interval,
        ?max_scans,
        auto_execute,
        "Starting opportunity scanner"
    );

    let limit = config.market_limit;
    let mut scanner = OpportunityScanner::new(KalshiExecution::new(transport_config), config);

    let mut interval = tokio::time::interval(scan_interval);
    let mut scans = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
            _ = interval.tick() => {
                scans += 1;
                let report = scanner.scan_all(limit, auto_execute).await;
                log_report(scans, &report);

                if max_scans.is_some_and(|max| scans >= max) {
                    info!(scans, "Reached maximum number of scans");
                    break;
                }
            }
        }
    }

    let log = scanner.execution_log();
    info!(
        scans,
        executions = log.len(),
        realized_net_profit = %log.total_realized_net_profit(),
        requests = scanner.coordinator().transport().request_count(),
        "Scanner stopped"
    );
}

fn log_report(scan: u64, report: &ScanReport) {
    for opportunity in report.arbitrage.iter().take(5) {
        info!(
            ticker = %opportunity.ticker,
            total_probability_pct = %opportunity.total_probability_pct.round_dp(2),
            net_profit = %opportunity.net_profit.round_dp(4),
            days = %opportunity.days_to_expiration.round_dp(2),
            profit_per_day = %opportunity.profit_per_day.round_dp(4),
            "Arbitrage opportunity"
        );
    }

    for opportunity in report.spreads.iter().take(5) {
        info!(
            ticker = %opportunity.ticker,
            side = %opportunity.side,
            buy = opportunity.buy_price,
            sell = opportunity.sell_price,
            quantity = opportunity.quantity,
            net_profit = %opportunity.net_profit.round_dp(4),
            "Spread opportunity"
        );
    }

    match report.recommendation() {
        Recommendation::SpreadTrade { ticker, net_profit } => {
            info!(scan, %ticker, %net_profit, "Recommendation: spread trade")
        }
        Recommendation::ProbabilityArbitrage {
            ticker,
            profit_per_day,
            expected_total_profit,
        } => info!(
            scan,
            %ticker,
            %profit_per_day,
            %expected_total_profit,
            "Recommendation: probability arbitrage"
        ),
        Recommendation::None => warn!(scan, "No opportunities found"),
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init()
}
