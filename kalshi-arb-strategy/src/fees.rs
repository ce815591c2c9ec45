//! Kalshi trading fee schedule.
//!
//! Uses rust_decimal for exact precision in financial calculations.

use crate::opportunity::TradeLeg;
use rust_decimal::Decimal;

/// Fee calculator for Kalshi contracts.
///
/// The fee rate depends on the contract price band: highest (3.5%) around 50¢ and lowest (1%)
/// at the extremes. Maker (resting) orders pay half the taker rate.
pub struct FeeCalculator;

impl FeeCalculator {
    /// Rate applied to a price that matches no band. Unreachable after clamping.
    pub const DEFAULT_RATE: Decimal = Decimal::from_parts(35, 0, 0, false, 3);

    /// Fraction of the taker rate paid by maker orders.
    pub const MAKER_FEE_MULTIPLIER: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

    /// Fee rate for a contract price.
    ///
    /// Bands are half-open (`low <= price < high`), except the last band which includes 100.
    ///
    /// # Arguments
    /// * `price_cents` - Contract price in cents, clamped to 0-100
    /// * `is_maker` - Whether the order rests on the book
    ///
    /// # Returns
    /// Fee rate as a decimal (e.g., 0.035 = 3.5%)
    pub fn fee_rate(price_cents: i64, is_maker: bool) -> Decimal {
        let base = match price_cents.clamp(0, 100) {
            0..5 => Decimal::new(1, 2),
            5..10 => Decimal::new(15, 3),
            10..20 => Decimal::new(2, 2),
            20..30 => Decimal::new(25, 3),
            30..40 => Decimal::new(3, 2),
            40..50 | 50..60 => Decimal::new(35, 3),
            60..70 => Decimal::new(3, 2),
            70..80 => Decimal::new(25, 3),
            80..90 => Decimal::new(2, 2),
            90..95 => Decimal::new(15, 3),
            95..=100 => Decimal::new(1, 2),
            _ => Self::DEFAULT_RATE,
        };

        if is_maker {
            base * Self::MAKER_FEE_MULTIPLIER
        } else {
            base
        }
    }

    /// Total fee for a trade.
    ///
    /// Formula: price_cents * quantity * rate / 100
    ///
    /// # Returns
    /// Fee amount in dollars, zero for a non-positive quantity
    pub fn fee(price_cents: i64, quantity: i64, is_maker: bool) -> Decimal {
        if quantity <= 0 {
            return Decimal::ZERO;
        }

        let rate = Self::fee_rate(price_cents, is_maker);
        Decimal::from(price_cents) * Decimal::from(quantity) * rate / Decimal::ONE_HUNDRED
    }

    /// Gross profit minus the fees of every leg.
    pub fn net_profit(gross_profit: Decimal, legs: &[TradeLeg], all_maker: bool) -> Decimal {
        let total_fees: Decimal = legs
            .iter()
            .map(|leg| {
                Self::fee(
                    i64::from(leg.price_cents),
                    i64::from(leg.quantity),
                    all_maker,
                )
            })
            .sum();

        gross_profit - total_fees
    }
}
