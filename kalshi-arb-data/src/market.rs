use crate::Side;
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

/// Snapshot of a single Kalshi market as returned by `GET /markets`.
///
/// Every quote is optional: Kalshi omits (or nulls) the bid/ask of a side with no resting
/// liquidity. Prices are integer cents (0-100). A `null` ticker, title, type or contract list
/// reads as empty.
///
/// ### Raw Payload
/// ```json
/// {
///   "ticker": "KXBTC-25JAN31-T100000",
///   "title": "Bitcoin above $100k on Jan 31?",
///   "market_type": "binary",
///   "status": "open",
///   "expiration_time": "2025-01-31T22:00:00Z",
///   "yes_bid": 52,
///   "yes_ask": 54,
///   "no_bid": 46,
///   "no_ask": 48,
///   "last_price": 53,
///   "liquidity": 1250000
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
pub struct MarketSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticker: SmolStr,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expiration_time: Option<String>,
    /// Legacy expiration field, consulted when `expiration_time` is absent.
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub yes_bid: Option<u32>,
    #[serde(default)]
    pub yes_ask: Option<u32>,
    #[serde(default)]
    pub no_bid: Option<u32>,
    #[serde(default)]
    pub no_ask: Option<u32>,
    #[serde(default)]
    pub last_price: Option<u32>,
    /// Market liquidity in cents.
    #[serde(default)]
    pub liquidity: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contracts: Vec<ContractQuote>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outcomes: Vec<ContractQuote>,
}

impl MarketSnapshot {
    /// Market type tag Kalshi uses for two-sided yes/no markets.
    pub const BINARY: &'static str = "binary";

    pub fn is_binary(&self) -> bool {
        self.market_type == Self::BINARY
    }

    /// Raw expiration timestamp, preferring `expiration_time` over `expiration_date`.
    pub fn expiration(&self) -> Option<&str> {
        self.expiration_time
            .as_deref()
            .or(self.expiration_date.as_deref())
            .filter(|raw| !raw.trim().is_empty())
    }

    /// Best bid for the provided [`Side`], in cents.
    pub fn bid(&self, side: Side) -> Option<u32> {
        match side {
            Side::Yes => self.yes_bid,
            Side::No => self.no_bid,
        }
    }

    /// Best ask for the provided [`Side`], in cents.
    pub fn ask(&self, side: Side) -> Option<u32> {
        match side {
            Side::Yes => self.yes_ask,
            Side::No => self.no_ask,
        }
    }

    /// Flat contract list of a multi-contract market.
    ///
    /// `contracts` takes precedence; `outcomes` is used only when `contracts` is empty.
    pub fn contract_quotes(&self) -> &[ContractQuote] {
        if self.contracts.is_empty() {
            &self.outcomes
        } else {
            &self.contracts
        }
    }

    /// True if at least one side quotes both a bid and an ask at different prices.
    pub fn has_tradeable_quotes(&self) -> bool {
        Side::ALL.into_iter().any(|side| match (self.bid(side), self.ask(side)) {
            (Some(bid), Some(ask)) => bid != ask,
            _ => false,
        })
    }
}

/// A contract entry of a market's flat `contracts` / `outcomes` list.
///
/// Quotes are yes-side prices in cents.
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
pub struct ContractQuote {
    #[serde(default)]
    pub ticker: Option<SmolStr>,
    #[serde(default)]
    pub last_price: Option<u32>,
    #[serde(default)]
    pub yes_bid: Option<u32>,
    #[serde(default)]
    pub yes_ask: Option<u32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
