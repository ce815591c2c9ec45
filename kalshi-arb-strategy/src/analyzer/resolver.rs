use crate::opportunity::ContractPriceSource;
use kalshi_arb_data::{MarketSnapshot, Side};
use rust_decimal::Decimal;
use std::fmt::Debug;

/// Resolves the contract prices of a market into [`ContractPriceSource`]s.
///
/// The [`ArbitrageAnalyzer`](super::ArbitrageAnalyzer) tries its resolvers in order; the first
/// one returning `Some` non-empty set of sources wins.
pub trait PriceResolver: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, market: &MarketSnapshot) -> Option<Vec<ContractPriceSource>>;
}

/// Resolvers in evaluation order.
pub fn default_resolvers() -> Vec<Box<dyn PriceResolver>> {
    vec![
        Box::new(BidOverpricing),
        Box::new(AskUnderpricing),
        Box::new(BlendedMid),
        Box::new(ContractList),
    ]
}

/// Yes & no bids summing above 100¢: both contracts can be sold for more than they pay out.
#[derive(Debug, Copy, Clone, Default)]
pub struct BidOverpricing;

impl PriceResolver for BidOverpricing {
    fn name(&self) -> &'static str {
        "bid_overpricing"
    }

    fn resolve(&self, market: &MarketSnapshot) -> Option<Vec<ContractPriceSource>> {
        if !binary_quotes_apply(market) {
            return None;
        }

        let (yes, no) = (market.yes_bid?, market.no_bid?);
        (yes + no > 100).then(|| binary_sources(market, yes.into(), no.into()))
    }
}

/// Yes & no asks summing below 100¢: both contracts can be bought for less than they pay out.
#[derive(Debug, Copy, Clone, Default)]
pub struct AskUnderpricing;

impl PriceResolver for AskUnderpricing {
    fn name(&self) -> &'static str {
        "ask_underpricing"
    }

    fn resolve(&self, market: &MarketSnapshot) -> Option<Vec<ContractPriceSource>> {
        if !binary_quotes_apply(market) {
            return None;
        }

        let (yes, no) = (market.yes_ask?, market.no_ask?);
        (yes + no < 100).then(|| binary_sources(market, yes.into(), no.into()))
    }
}

/// Per side mid of bid & ask, or whichever of the two is quoted.
#[derive(Debug, Copy, Clone, Default)]
pub struct BlendedMid;

impl PriceResolver for BlendedMid {
    fn name(&self) -> &'static str {
        "blended_mid"
    }

    fn resolve(&self, market: &MarketSnapshot) -> Option<Vec<ContractPriceSource>> {
        if !binary_quotes_apply(market) {
            return None;
        }

        let yes = blend(market.yes_bid, market.yes_ask)?;
        let no = blend(market.no_bid, market.no_ask)?;
        Some(binary_sources(market, yes, no))
    }
}

/// Flat contract list of a multi-contract market, all priced on the yes side.
///
/// Each contract resolves to its last price, else its yes bid/ask blend.
#[derive(Debug, Copy, Clone, Default)]
pub struct ContractList;

impl PriceResolver for ContractList {
    fn name(&self) -> &'static str {
        "contract_list"
    }

    fn resolve(&self, market: &MarketSnapshot) -> Option<Vec<ContractPriceSource>> {
        let sources: Vec<_> = market
            .contract_quotes()
            .iter()
            .filter_map(|contract| {
                let price = contract
                    .last_price
                    .map(Decimal::from)
                    .or_else(|| blend(contract.yes_bid, contract.yes_ask))?;

                let contract_id = contract
                    .ticker
                    .clone()
                    .unwrap_or_else(|| market.ticker.clone());

                Some(ContractPriceSource::new(contract_id, Side::Yes, price))
            })
            .collect();

        (!sources.is_empty()).then_some(sources)
    }
}

/// Binary resolvers only apply to binary markets quoting at least one yes price.
fn binary_quotes_apply(market: &MarketSnapshot) -> bool {
    market.is_binary() && (market.yes_bid.is_some() || market.yes_ask.is_some())
}

fn blend(bid: Option<u32>, ask: Option<u32>) -> Option<Decimal> {
    match (bid, ask) {
        (Some(bid), Some(ask)) => Some((Decimal::from(bid) + Decimal::from(ask)) / Decimal::TWO),
        (Some(price), None) | (None, Some(price)) => Some(Decimal::from(price)),
        (None, None) => None,
    }
}

fn binary_sources(market: &MarketSnapshot, yes: Decimal, no: Decimal) -> Vec<ContractPriceSource> {
    vec![
        ContractPriceSource::new(market.ticker.clone(), Side::Yes, yes),
        ContractPriceSource::new(market.ticker.clone(), Side::No, no),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kalshi_arb_data::ContractQuote;
    use rust_decimal_macros::dec;

    fn binary(
        yes_bid: Option<u32>,
        yes_ask: Option<u32>,
        no_bid: Option<u32>,
        no_ask: Option<u32>,
    ) -> MarketSnapshot {
        MarketSnapshot {
            ticker: "KXTEST".into(),
            market_type: MarketSnapshot::BINARY.to_string(),
            yes_bid,
            yes_ask,
            no_bid,
            no_ask,
            ..Default::default()
        }
    }

    fn prices(sources: &[ContractPriceSource]) -> Vec<(Side, u32, Decimal)> {
        sources
            .iter()
            .map(|source| (source.side, source.price_cents, source.probability))
            .collect()
    }

    #[test]
    fn test_bid_overpricing() {
        let market = binary(Some(52), None, Some(50), None);
        let sources = BidOverpricing.resolve(&market).unwrap();
        assert_eq!(
            prices(&sources),
            vec![(Side::Yes, 52, dec!(0.52)), (Side::No, 50, dec!(0.50))]
        );

        // Exactly 100 is not overpriced
        let market = binary(Some(50), None, Some(50), None);
        assert!(BidOverpricing.resolve(&market).is_none());
    }

    #[test]
    fn test_ask_underpricing() {
        let market = binary(None, Some(48), None, Some(50));
        let sources = AskUnderpricing.resolve(&market).unwrap();
        assert_eq!(
            prices(&sources),
            vec![(Side::Yes, 48, dec!(0.48)), (Side::No, 50, dec!(0.50))]
        );

        let market = binary(None, Some(50), None, Some(51));
        assert!(AskUnderpricing.resolve(&market).is_none());
    }

    #[test]
    fn test_blended_mid() {
        let market = binary(Some(40), Some(43), Some(58), None);
        let sources = BlendedMid.resolve(&market).unwrap();
        assert_eq!(
            prices(&sources),
            vec![(Side::Yes, 41, dec!(0.415)), (Side::No, 58, dec!(0.58))]
        );

        // Both sides are required
        let market = binary(Some(40), Some(43), None, None);
        assert!(BlendedMid.resolve(&market).is_none());
    }

    #[test]
    fn test_binary_resolvers_require_binary_market_with_yes_quote() {
        let mut market = binary(None, None, Some(60), Some(62));
        assert!(BlendedMid.resolve(&market).is_none());

        market.yes_bid = Some(55);
        market.market_type = "scalar".to_string();
        assert!(BidOverpricing.resolve(&market).is_none());
        assert!(BlendedMid.resolve(&market).is_none());
    }

    #[test]
    fn test_contract_list() {
        let market = MarketSnapshot {
            ticker: "KXELECTION".into(),
            outcomes: vec![
                ContractQuote {
                    ticker: Some("KXELECTION-A".into()),
                    last_price: Some(40),
                    yes_bid: Some(10),
                    yes_ask: Some(90),
                },
                ContractQuote {
                    ticker: None,
                    last_price: None,
                    yes_bid: Some(30),
                    yes_ask: Some(35),
                },
                ContractQuote {
                    ticker: Some("KXELECTION-C".into()),
                    last_price: None,
                    yes_bid: None,
                    yes_ask: Some(20),
                },
                ContractQuote::default(),
            ],
            ..Default::default()
        };

        let sources = ContractList.resolve(&market).unwrap();
        let ids: Vec<_> = sources.iter().map(|s| s.contract_id.as_str()).collect();
        assert_eq!(ids, vec!["KXELECTION-A", "KXELECTION", "KXELECTION-C"]);
        assert!(sources.iter().all(|s| s.side == Side::Yes));
        assert_eq!(
            sources.iter().map(|s| s.probability).sum::<Decimal>(),
            dec!(0.925)
        );
        assert_eq!(sources[1].price_cents, 32);
    }

    #[test]
    fn test_contract_list_empty() {
        assert!(ContractList.resolve(&MarketSnapshot::default()).is_none());
    }

    #[test]
    fn test_default_resolver_order() {
        let names: Vec<_> = default_resolvers().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["bid_overpricing", "ask_underpricing", "blended_mid", "contract_list"]
        );
    }
}
