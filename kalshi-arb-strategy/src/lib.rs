//! Opportunity Detection & Costing Engine for Kalshi Prediction Markets
//!
//! This crate scans Kalshi markets for two kinds of opportunity, prices them net of Kalshi's
//! price-banded fees, and optionally executes spread trades against the venue.
//!
//! # Key Components
//!
//! - [`FeeCalculator`]: Price-banded taker/maker fee schedule
//! - [`ArbitrageAnalyzer`]: Probability arbitrage across complementary contracts
//! - [`SpreadDetector`]: Same-side bid/ask crossing, refined against orderbook depth
//! - [`ExecutionCoordinator`]: Sequenced buy-then-sell execution of spread opportunities
//! - [`OpportunityScanner`]: Fetch, filter, analyse & execute in one pass
//!
//! # Example
//!
//! ```rust,ignore
//! use kalshi_arb_execution::client::kalshi::{KalshiExecution, KalshiExecutionConfig};
//! use kalshi_arb_strategy::{OpportunityScanner, ScannerConfig};
//!
//! let transport = KalshiExecution::new(KalshiExecutionConfig::from_env()?);
//! let mut scanner = OpportunityScanner::new(transport, ScannerConfig::from_env()?);
//!
//! let report = scanner.scan_all(100, false).await;
//! println!("{:?}", report.recommendation());
//! ```
//!
//! # Fee Model
//!
//! Taker fee rates by price band, in cents (symmetric around 50¢):
//!
//! ```text
//!  0-4    1.0%      60-69   3.0%
//!  5-9    1.5%      70-79   2.5%
//! 10-19   2.0%      80-89   2.0%
//! 20-29   2.5%      90-94   1.5%
//! 30-39   3.0%      95-100  1.0%
//! 40-59   3.5%
//! ```
//!
//! Makers pay 50% of the taker rate. Fee = price * quantity * rate / 100 dollars.
//!
//! # Opportunity Model
//!
//! Probability arbitrage: complementary contracts whose implied probabilities do not sum to 1.
//!
//! ```text
//! Sum > 1: sell every contract, Sum < 1: buy every contract
//! Profit per day = net profit / max(days to expiration, 0.01)
//! ```
//!
//! Spread crossing: best bid above best ask on the same contract side.
//!
//! ```text
//! Buy at ask + Sell at bid = (bid - ask) * quantity / 100, less taker fees on both legs
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod execution;
pub mod fees;
pub mod opportunity;
pub mod scanner;
pub mod spread;

// Re-exports for convenience
pub use analyzer::{ArbitrageAnalyzer, resolver::PriceResolver};
pub use config::{ExecutionConfig, ScannerConfig, SpreadConfig};
pub use error::{AnalysisError, ConfigError, ExecutionError};
pub use execution::{ExecutionCoordinator, ExecutionLog, ExecutionRecord};
pub use fees::FeeCalculator;
pub use opportunity::{ArbitrageOpportunity, ContractPriceSource, SpreadOpportunity, TradeLeg};
pub use scanner::{OpportunityScanner, Recommendation, ScanReport};
pub use spread::SpreadDetector;
