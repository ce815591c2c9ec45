//! Opportunity representation: price sources, trade legs, arbitrage & spread opportunities.

use crate::fees::FeeCalculator;
use chrono::{DateTime, FixedOffset};
use derive_more::Constructor;
use kalshi_arb_data::Side;
use kalshi_arb_execution::Action;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Floor applied to days-to-expiration when computing profit per day.
pub const MIN_DAYS_TO_EXPIRATION: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Resolved price of one contract, used to derive implied probability.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContractPriceSource {
    pub contract_id: SmolStr,
    pub side: Side,
    /// Resolved price rounded down to whole cents
    pub price_cents: u32,
    /// Unrounded resolved price / 100
    pub probability: Decimal,
}

impl ContractPriceSource {
    /// Build a source from a (possibly fractional, eg/ blended mid) price in cents.
    pub fn new(contract_id: impl Into<SmolStr>, side: Side, price: Decimal) -> Self {
        Self {
            contract_id: contract_id.into(),
            side,
            price_cents: price.floor().to_u32().unwrap_or(0),
            probability: price / Decimal::ONE_HUNDRED,
        }
    }
}

/// Single leg of a recommended trade basket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Constructor, Deserialize, Serialize)]
pub struct TradeLeg {
    pub contract_id: SmolStr,
    pub side: Side,
    pub action: Action,
    pub price_cents: u32,
    pub quantity: u32,
}

/// Probability arbitrage: a market whose complementary prices do not sum to 100¢.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArbitrageOpportunity {
    pub ticker: SmolStr,
    pub title: String,
    /// Sum of implied probabilities, in percent
    pub total_probability_pct: Decimal,
    /// |total probability - 1| in percent
    pub deviation_pct: Decimal,
    pub expiration: DateTime<FixedOffset>,
    pub trade_legs: Vec<TradeLeg>,
    /// Profit before fees, in dollars
    pub gross_profit: Decimal,
    /// Profit after maker fees, in dollars
    pub net_profit: Decimal,
    pub days_to_expiration: Decimal,
    pub profit_per_day: Decimal,
}

impl ArbitrageOpportunity {
    /// Profit per day of a position held until expiration.
    ///
    /// Formula: net_profit / max(days_to_expiration, 0.01)
    pub fn calculate_profit_per_day(net_profit: Decimal, days_to_expiration: Decimal) -> Decimal {
        net_profit / days_to_expiration.max(MIN_DAYS_TO_EXPIRATION)
    }

    /// Profit expected over the remaining life of the market.
    pub fn expected_total_profit(&self) -> Decimal {
        self.profit_per_day * self.days_to_expiration
    }
}

/// Spread crossing: best bid above best ask on the same contract side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpreadOpportunity {
    pub ticker: SmolStr,
    pub title: String,
    pub side: Side,
    /// Ask we buy at, in cents
    pub buy_price: u32,
    /// Bid we sell at, in cents
    pub sell_price: u32,
    pub quantity: u32,
    pub gross_profit: Decimal,
    /// Profit after taker fees on both legs
    pub net_profit: Decimal,
    /// sell_price - buy_price, in cents
    pub spread: u32,
}

impl SpreadOpportunity {
    /// Price a buy-at-ask / sell-at-bid round trip. Both legs pay taker fees.
    ///
    /// `sell_price` must not be below `buy_price`.
    pub fn new(
        ticker: impl Into<SmolStr>,
        title: impl Into<String>,
        side: Side,
        buy_price: u32,
        sell_price: u32,
        quantity: u32,
    ) -> Self {
        let spread = sell_price.saturating_sub(buy_price);
        let (gross_profit, net_profit) = Self::profit(buy_price, sell_price, quantity);

        Self {
            ticker: ticker.into(),
            title: title.into(),
            side,
            buy_price,
            sell_price,
            quantity,
            gross_profit,
            net_profit,
            spread,
        }
    }

    /// Re-price the round trip for a different quantity.
    pub fn with_quantity(self, quantity: u32) -> Self {
        let (gross_profit, net_profit) = Self::profit(self.buy_price, self.sell_price, quantity);
        Self {
            quantity,
            gross_profit,
            net_profit,
            ..self
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.net_profit > Decimal::ZERO
    }

    fn profit(buy_price: u32, sell_price: u32, quantity: u32) -> (Decimal, Decimal) {
        let gross = (Decimal::from(sell_price) - Decimal::from(buy_price)) / Decimal::ONE_HUNDRED
            * Decimal::from(quantity);
        let buy_fee = FeeCalculator::fee(i64::from(buy_price), i64::from(quantity), false);
        let sell_fee = FeeCalculator::fee(i64::from(sell_price), i64::from(quantity), false);

        (gross, gross - buy_fee - sell_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_contract_price_source_rounds_price_not_probability() {
        let source = ContractPriceSource::new("KXTEST", Side::Yes, dec!(41.5));
        assert_eq!(source.price_cents, 41);
        assert_eq!(source.probability, dec!(0.415));
    }

    #[test]
    fn test_profit_per_day_floors_days() {
        assert_eq!(
            ArbitrageOpportunity::calculate_profit_per_day(dec!(1), dec!(10)),
            dec!(0.1)
        );
        assert_eq!(
            ArbitrageOpportunity::calculate_profit_per_day(dec!(1), dec!(0.001)),
            dec!(100)
        );
    }

    #[test]
    fn test_spread_opportunity_pricing() {
        // Buy 50c, sell 60c, 100 contracts:
        // Gross = 0.10 * 100 = 10
        // Fees = 50 * 100 * 0.035 / 100 + 60 * 100 * 0.03 / 100 = 1.75 + 1.80
        let opportunity = SpreadOpportunity::new("KXTEST", "Test", Side::Yes, 50, 60, 100);
        assert_eq!(opportunity.spread, 10);
        assert_eq!(opportunity.gross_profit, dec!(10));
        assert_eq!(opportunity.net_profit, dec!(6.45));
        assert!(opportunity.is_profitable());

        // Re-priced for 30 contracts: 3 - 0.525 - 0.54
        let refined = opportunity.with_quantity(30);
        assert_eq!(refined.quantity, 30);
        assert_eq!(refined.gross_profit, dec!(3));
        assert_eq!(refined.net_profit, dec!(1.935));
    }

    #[test]
    fn test_one_cent_spread_is_eaten_by_fees() {
        let opportunity = SpreadOpportunity::new("KXTEST", "Test", Side::Yes, 42, 43, 100);
        assert_eq!(opportunity.spread, 1);
        assert_eq!(opportunity.gross_profit, dec!(1));
        assert!(!opportunity.is_profitable());
    }
}
