use kalshi_arb_data::Side;
use kalshi_arb_execution::OrderConfirmation;
use smol_str::SmolStr;
use thiserror::Error;

/// Market data that cannot be analysed.
///
/// Distinct from "no opportunity", which is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("market {ticker}: unparseable expiration {raw:?}")]
    InvalidExpiration { ticker: SmolStr, raw: String },
}

/// Failure to execute a spread opportunity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// Buy leg was rejected. No position was opened and the sell leg was never attempted.
    #[error("market {ticker}: buy leg failed: {reason}")]
    BuyLegFailed { ticker: SmolStr, reason: String },

    /// Buy leg filled but the sell leg failed: the bought contracts are an open position.
    #[error(
        "market {ticker}: sell leg failed after buy order {}, {open_quantity} {side} contracts left unhedged: {reason}",
        .buy_confirmation.order_id
    )]
    UnhedgedPosition {
        ticker: SmolStr,
        side: Side,
        open_quantity: u32,
        buy_confirmation: OrderConfirmation,
        reason: String,
    },
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
