//! Spread crossing detection.
//!
//! When a contract's best bid sits above its best ask, buying at the ask and immediately
//! selling at the bid locks in the difference. Both legs cross the book so both pay taker fees.

use crate::{config::SpreadConfig, opportunity::SpreadOpportunity};
use kalshi_arb_data::{MarketSnapshot, OrderbookSnapshot, Side};
use kalshi_arb_execution::KalshiTransport;
use tracing::{debug, warn};

/// Contracts assumed tradeable before orderbook depth is known.
pub const BASE_QUANTITY: u32 = 100;

/// Detects spread crossing opportunities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadDetector {
    config: SpreadConfig,
}

impl SpreadDetector {
    pub fn new(config: SpreadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpreadConfig {
        &self.config
    }

    /// Tentative opportunity for one side: spread gate and sizing only, before fees.
    ///
    /// Requires a bid and an ask with `bid - ask >= min_profit_cents`. Sized at
    /// `min(max_position_size, 100)` contracts.
    pub fn candidate(&self, market: &MarketSnapshot, side: Side) -> Option<SpreadOpportunity> {
        let (bid, ask) = (market.bid(side)?, market.ask(side)?);
        let spread = bid.checked_sub(ask)?;

        if spread < self.config.min_profit_cents {
            return None;
        }

        let quantity = self.config.max_position_size.min(BASE_QUANTITY);
        Some(SpreadOpportunity::new(
            market.ticker.clone(),
            market.title.clone(),
            side,
            ask,
            bid,
            quantity,
        ))
    }

    /// Profitable opportunities of a market, yes side first.
    ///
    /// When an orderbook is supplied each opportunity is refined once against its depth.
    pub fn detect(
        &self,
        market: &MarketSnapshot,
        orderbook: Option<&OrderbookSnapshot>,
    ) -> Vec<SpreadOpportunity> {
        Side::ALL
            .into_iter()
            .filter_map(|side| self.candidate(market, side))
            .filter(SpreadOpportunity::is_profitable)
            .filter_map(|opportunity| match orderbook {
                Some(book) => self.refine(opportunity, book),
                None => Some(opportunity),
            })
            .collect()
    }

    /// Re-size an opportunity to the depth available at the top of its side's book.
    ///
    /// Quantity becomes `min(best ask depth, best bid depth, max_position_size)`. A side with no
    /// book data, or missing bids or asks, keeps the unrefined opportunity. Returns `None` if
    /// the refined quantity is zero or no longer profitable.
    pub fn refine(
        &self,
        opportunity: SpreadOpportunity,
        orderbook: &OrderbookSnapshot,
    ) -> Option<SpreadOpportunity> {
        let Some((best_bid, best_ask)) = orderbook
            .side(opportunity.side)
            .and_then(|book| book.best_bid().zip(book.best_ask()))
        else {
            return Some(opportunity);
        };

        let quantity = best_ask
            .depth()
            .min(best_bid.depth())
            .min(self.config.max_position_size);

        if quantity == 0 {
            debug!(ticker = %opportunity.ticker, side = %opportunity.side, "No depth at top of book");
            return None;
        }

        let refined = opportunity.with_quantity(quantity);
        refined.is_profitable().then_some(refined)
    }

    /// Detect opportunities across markets, refining against live orderbooks.
    ///
    /// An orderbook is only fetched for markets with at least one tentative opportunity. A
    /// failed fetch or absent book keeps the unrefined opportunities. Results are in
    /// discovery order.
    pub async fn scan<Transport>(
        &self,
        markets: &[MarketSnapshot],
        transport: &Transport,
    ) -> Vec<SpreadOpportunity>
    where
        Transport: KalshiTransport + ?Sized,
    {
        let mut opportunities = Vec::new();

        for market in markets {
            if market.ticker.is_empty() {
                debug!(title = %market.title, "Skipping market without ticker");
                continue;
            }

            let tentative = self.detect(market, None);
            if tentative.is_empty() {
                continue;
            }

            match transport.fetch_orderbook(&market.ticker).await {
                Ok(Some(book)) => opportunities.extend(
                    tentative
                        .into_iter()
                        .filter_map(|opportunity| self.refine(opportunity, &book)),
                ),
                Ok(None) => {
                    debug!(ticker = %market.ticker, "No orderbook, keeping unrefined opportunities");
                    opportunities.extend(tentative);
                }
                Err(error) => {
                    warn!(
                        ticker = %market.ticker,
                        %error,
                        "Failed to fetch orderbook, keeping unrefined opportunities"
                    );
                    opportunities.extend(tentative);
                }
            }
        }

        debug!(
            markets = markets.len(),
            opportunities = opportunities.len(),
            "Spread scan complete"
        );

        opportunities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalshi_arb_data::{BookLevel, BookSide};
    use rust_decimal_macros::dec;

    fn detector() -> SpreadDetector {
        SpreadDetector::default()
    }

    fn market(yes: (Option<u32>, Option<u32>), no: (Option<u32>, Option<u32>)) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "KXTEST".into(),
            title: "Test market".to_string(),
            market_type: MarketSnapshot::BINARY.to_string(),
            yes_bid: yes.0,
            yes_ask: yes.1,
            no_bid: no.0,
            no_ask: no.1,
            ..Default::default()
        }
    }

    fn yes_book(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> OrderbookSnapshot {
        OrderbookSnapshot {
            yes: Some(BookSide::new(bids, asks)),
            no: None,
        }
    }

    #[test]
    fn test_candidate_spread_gate_and_sizing() {
        let detector = SpreadDetector::new(SpreadConfig {
            min_profit_cents: 1,
            max_position_size: 1000,
        });

        // 1c spread passes the gate at min_profit_cents = 1, fees make it unprofitable
        let market = market((Some(43), Some(42)), (None, None));
        let candidate = detector.candidate(&market, Side::Yes).unwrap();
        assert_eq!(candidate.spread, 1);
        assert_eq!(candidate.quantity, 100);
        assert_eq!(candidate.buy_price, 42);
        assert_eq!(candidate.sell_price, 43);
        assert!(detector.detect(&market, None).is_empty());
    }

    #[test]
    fn test_candidate_rejects_narrow_or_inverted_spreads() {
        let detector = detector();
        assert!(detector.candidate(&market((Some(43), Some(42)), (None, None)), Side::Yes).is_none());
        assert!(detector.candidate(&market((Some(40), Some(42)), (None, None)), Side::Yes).is_none());
        assert!(detector.candidate(&market((Some(60), None), (None, None)), Side::Yes).is_none());
    }

    #[test]
    fn test_candidate_quantity_capped_by_max_position() {
        let detector = SpreadDetector::new(SpreadConfig {
            min_profit_cents: 2,
            max_position_size: 40,
        });
        let candidate = detector
            .candidate(&market((Some(60), Some(50)), (None, None)), Side::Yes)
            .unwrap();
        assert_eq!(candidate.quantity, 40);
    }

    #[test]
    fn test_detect_both_sides() {
        let market = market((Some(60), Some(50)), (Some(55), Some(45)));
        let opportunities = detector().detect(&market, None);

        let sides: Vec<_> = opportunities.iter().map(|o| o.side).collect();
        assert_eq!(sides, vec![Side::Yes, Side::No]);
        assert_eq!(opportunities[0].net_profit, dec!(6.45));
    }

    #[test]
    fn test_refine_to_top_of_book_depth() {
        let market = market((Some(60), Some(50)), (None, None));
        let book = yes_book(
            vec![BookLevel::new(60, Some(50))],
            vec![BookLevel::new(50, Some(30))],
        );

        let opportunities = detector().detect(&market, Some(&book));
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].quantity, 30);
        assert_eq!(opportunities[0].gross_profit, dec!(3));
        assert_eq!(opportunities[0].net_profit, dec!(1.935));
    }

    #[test]
    fn test_refine_levels_without_count_use_default_depth() {
        let detector = SpreadDetector::new(SpreadConfig {
            min_profit_cents: 2,
            max_position_size: 1000,
        });
        let opportunity = detector
            .candidate(&market((Some(60), Some(50)), (None, None)), Side::Yes)
            .unwrap();
        let book = yes_book(vec![BookLevel::new(60, None)], vec![BookLevel::new(50, None)]);

        let refined = detector.refine(opportunity, &book).unwrap();
        assert_eq!(refined.quantity, 100);
    }

    #[test]
    fn test_refine_keeps_opportunity_without_usable_book() {
        let detector = detector();
        let opportunity = detector
            .candidate(&market((Some(60), Some(50)), (None, None)), Side::Yes)
            .unwrap();

        let no_side = OrderbookSnapshot::default();
        assert_eq!(
            detector.refine(opportunity.clone(), &no_side),
            Some(opportunity.clone())
        );

        let one_sided = yes_book(vec![BookLevel::new(60, Some(5))], vec![]);
        assert_eq!(
            detector.refine(opportunity.clone(), &one_sided),
            Some(opportunity)
        );
    }

    #[test]
    fn test_refine_drops_zero_depth() {
        let detector = detector();
        let opportunity = detector
            .candidate(&market((Some(60), Some(50)), (None, None)), Side::Yes)
            .unwrap();

        let empty_level = yes_book(
            vec![BookLevel::new(60, Some(0))],
            vec![BookLevel::new(50, Some(30))],
        );
        assert_eq!(detector.refine(opportunity, &empty_level), None);
    }

    #[test]
    fn test_refine_drops_unprofitable() {
        let detector = detector();

        // 2c spread at 50/52: 0.02 gross per contract against 0.0357 in taker fees
        let narrow = detector
            .candidate(&market((Some(52), Some(50)), (None, None)), Side::Yes)
            .unwrap();
        let thin = yes_book(vec![BookLevel::new(52, Some(1))], vec![BookLevel::new(50, Some(1))]);
        assert_eq!(detector.refine(narrow, &thin), None);
    }
}
