//! Probability arbitrage detection.
//!
//! A binary market's yes & no contracts together always pay out exactly $1. If their prices
//! sum above 100¢ both can be sold for a guaranteed profit; if they sum below 100¢ both can be
//! bought for one:
//!
//! ```text
//! Overpricing:  YES bid 52c + NO bid 50c = 102% -> sell both, 2% gross
//! Underpricing: YES ask 48c + NO ask 50c =  98% -> buy both,  2% gross
//! ```
//!
//! Multi-contract markets are evaluated the same way over their flat contract list.

use crate::{
    error::AnalysisError,
    fees::FeeCalculator,
    opportunity::{ArbitrageOpportunity, ContractPriceSource, TradeLeg},
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use kalshi_arb_data::MarketSnapshot;
use kalshi_arb_execution::Action;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tracing::{debug, warn};

/// Ordered contract price resolvers.
pub mod resolver;

use self::resolver::{PriceResolver, default_resolvers};

/// Contracts allocated across the legs of an arbitrage basket.
pub const BASE_QUANTITY: u32 = 100;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Scores markets for probability arbitrage.
#[derive(Debug)]
pub struct ArbitrageAnalyzer {
    resolvers: Vec<Box<dyn PriceResolver>>,
}

impl Default for ArbitrageAnalyzer {
    fn default() -> Self {
        Self::new(default_resolvers())
    }
}

impl ArbitrageAnalyzer {
    /// Construct an analyzer trying the provided resolvers in order.
    pub fn new(resolvers: Vec<Box<dyn PriceResolver>>) -> Self {
        Self { resolvers }
    }

    /// Analyse a market as of now.
    pub fn analyze(
        &self,
        market: &MarketSnapshot,
    ) -> Result<Option<ArbitrageOpportunity>, AnalysisError> {
        self.analyze_at(market, Utc::now())
    }

    /// Analyse a market as of the provided instant.
    ///
    /// `Ok(None)` means there is no opportunity (missing data, expired market, no resolvable
    /// prices or no profit after fees). `Err` means the market data itself is malformed.
    pub fn analyze_at(
        &self,
        market: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Option<ArbitrageOpportunity>, AnalysisError> {
        let Some(raw_expiration) = market.expiration() else {
            return Ok(None);
        };

        let expiration =
            parse_expiration(raw_expiration).ok_or_else(|| AnalysisError::InvalidExpiration {
                ticker: market.ticker.clone(),
                raw: raw_expiration.to_string(),
            })?;

        let days_to_expiration = days_between(now, expiration);
        if days_to_expiration <= Decimal::ZERO {
            return Ok(None);
        }

        let Some((resolver, sources)) = self.resolve(market) else {
            return Ok(None);
        };

        let total_probability: Decimal = sources.iter().map(|source| source.probability).sum();
        if total_probability <= Decimal::ZERO {
            return Ok(None);
        }

        // Every leg shares a single direction, including multi-contract markets
        let action = if total_probability > Decimal::ONE {
            Action::Sell
        } else {
            Action::Buy
        };

        let trade_legs = allocate(&sources, total_probability, action);
        if trade_legs.is_empty() {
            return Ok(None);
        }

        let deviation = (total_probability - Decimal::ONE).abs();
        let gross_profit = deviation * Decimal::from(BASE_QUANTITY);
        let net_profit = FeeCalculator::net_profit(gross_profit, &trade_legs, true);

        if net_profit <= Decimal::ZERO {
            debug!(
                ticker = %market.ticker,
                resolver,
                %gross_profit,
                %net_profit,
                "Arbitrage deviation consumed by fees"
            );
            return Ok(None);
        }

        Ok(Some(ArbitrageOpportunity {
            ticker: market.ticker.clone(),
            title: market.title.clone(),
            total_probability_pct: total_probability * Decimal::ONE_HUNDRED,
            deviation_pct: deviation * Decimal::ONE_HUNDRED,
            expiration,
            trade_legs,
            gross_profit,
            net_profit,
            days_to_expiration,
            profit_per_day: ArbitrageOpportunity::calculate_profit_per_day(
                net_profit,
                days_to_expiration,
            ),
        }))
    }

    /// Analyse every market as of now. See [`Self::find_opportunities_at`].
    pub fn find_opportunities(&self, markets: &[MarketSnapshot]) -> Vec<ArbitrageOpportunity> {
        self.find_opportunities_at(markets, Utc::now())
    }

    /// Analyse every market independently, sorted by profit per day (highest first).
    ///
    /// A market that fails analysis is logged and skipped.
    pub fn find_opportunities_at(
        &self,
        markets: &[MarketSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<ArbitrageOpportunity> {
        let opportunities: Vec<_> = markets
            .iter()
            .filter_map(|market| match self.analyze_at(market, now) {
                Ok(opportunity) => opportunity,
                Err(error) => {
                    warn!(ticker = %market.ticker, %error, "Skipping market that failed analysis");
                    None
                }
            })
            .sorted_by(|a, b| b.profit_per_day.cmp(&a.profit_per_day))
            .collect();

        debug!(
            markets = markets.len(),
            opportunities = opportunities.len(),
            "Arbitrage analysis complete"
        );

        opportunities
    }

    fn resolve(&self, market: &MarketSnapshot) -> Option<(&'static str, Vec<ContractPriceSource>)> {
        self.resolvers.iter().find_map(|resolver| {
            resolver
                .resolve(market)
                .filter(|sources| !sources.is_empty())
                .map(|sources| (resolver.name(), sources))
        })
    }
}

/// Split [`BASE_QUANTITY`] across the sources proportionally to their probability.
///
/// Each leg gets floor(100 * probability / total). Zero-quantity legs are discarded.
fn allocate(
    sources: &[ContractPriceSource],
    total_probability: Decimal,
    action: Action,
) -> Vec<TradeLeg> {
    let base = Decimal::from(BASE_QUANTITY);

    sources
        .iter()
        .filter_map(|source| {
            let quantity = (base * source.probability / total_probability)
                .floor()
                .to_u32()?;

            (quantity > 0).then(|| {
                TradeLeg::new(
                    source.contract_id.clone(),
                    source.side,
                    action,
                    source.price_cents,
                    quantity,
                )
            })
        })
        .collect()
}

/// Parse a Kalshi expiration timestamp.
///
/// RFC 3339 keeps its offset; naive timestamps and bare dates are taken as UTC.
pub fn parse_expiration(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(expiration) = DateTime::parse_from_rfc3339(raw) {
        return Some(expiration);
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc().fixed_offset());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Fractional days from `now` until `expiration`. Negative once expired.
fn days_between(now: DateTime<Utc>, expiration: DateTime<FixedOffset>) -> Decimal {
    let millis = expiration
        .with_timezone(&Utc)
        .signed_duration_since(now)
        .num_milliseconds();

    Decimal::from(millis) / Decimal::from(MILLIS_PER_DAY)
}
