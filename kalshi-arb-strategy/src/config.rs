//! Configuration types for the opportunity scanner.

use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr, time::Duration};

/// Configuration for the full scanning pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScannerConfig {
    pub spread: SpreadConfig,
    pub execution: ExecutionConfig,
    /// Minimum profit per day for an arbitrage opportunity to be reported (dollars)
    pub min_profit_per_day: Decimal,
    /// Minimum market liquidity (cents)
    pub min_liquidity: i64,
    /// Maximum markets fetched per scan
    pub market_limit: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            spread: SpreadConfig::default(),
            execution: ExecutionConfig::default(),
            min_profit_per_day: Decimal::new(1, 1), // $0.10
            min_liquidity: 10_000,                  // $100.00
            market_limit: 100,
        }
    }
}

impl ScannerConfig {
    /// Load the configuration from environment variables, falling back to defaults.
    ///
    /// Reads `MIN_PROFIT_CENTS`, `MAX_POSITION_SIZE`, `MIN_PROFIT_PER_DAY`, `MIN_LIQUIDITY`,
    /// `MARKET_LIMIT`, `SETTLEMENT_DELAY_MS` and `USE_MARKET_ORDERS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through the provided variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            spread: SpreadConfig {
                min_profit_cents: parse_var(
                    &lookup,
                    "MIN_PROFIT_CENTS",
                    defaults.spread.min_profit_cents,
                )?,
                max_position_size: parse_var(
                    &lookup,
                    "MAX_POSITION_SIZE",
                    defaults.spread.max_position_size,
                )?,
            },
            execution: ExecutionConfig {
                settlement_delay_ms: parse_var(
                    &lookup,
                    "SETTLEMENT_DELAY_MS",
                    defaults.execution.settlement_delay_ms,
                )?,
                use_market_orders: parse_flag(
                    &lookup,
                    "USE_MARKET_ORDERS",
                    defaults.execution.use_market_orders,
                )?,
            },
            min_profit_per_day: parse_var(
                &lookup,
                "MIN_PROFIT_PER_DAY",
                defaults.min_profit_per_day,
            )?,
            min_liquidity: parse_var(&lookup, "MIN_LIQUIDITY", defaults.min_liquidity)?,
            market_limit: parse_var(&lookup, "MARKET_LIMIT", defaults.market_limit)?,
        })
    }
}

/// Spread detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpreadConfig {
    /// Minimum bid - ask spread (cents)
    pub min_profit_cents: u32,
    /// Maximum contracts per opportunity
    pub max_position_size: u32,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            min_profit_cents: 2,
            max_position_size: 1000,
        }
    }
}

/// Spread execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Delay between the buy and sell legs (milliseconds)
    pub settlement_delay_ms: u64,
    /// Place market orders instead of limit orders at the quoted prices
    pub use_market_orders: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            settlement_delay_ms: 500,
            use_market_orders: false,
        }
    }
}

impl ExecutionConfig {
    pub fn settlement_delay(&self) -> Duration {
        Duration::from_millis(self.settlement_delay_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|error: T::Err| ConfigError::InvalidValue {
                key,
                reason: error.to_string(),
                value,
            }),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key).filter(|value| !value.trim().is_empty()) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}
