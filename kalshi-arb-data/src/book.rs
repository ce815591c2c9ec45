use crate::Side;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Depth assumed for a level that carries no count.
///
/// Some venue code paths publish a bare price instead of a `{price, count}` level.
pub const DEFAULT_LEVEL_DEPTH: u32 = 100;

/// Single orderbook level: price in cents and (optionally) the contracts available.
///
/// Deserialises from any of the shapes Kalshi has been observed to publish:
/// `{"price": 42, "count": 30}`, `[42, 30]` or a bare `42`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Constructor, Deserialize, Serialize)]
#[serde(from = "RawLevel")]
pub struct BookLevel {
    /// Price in cents (0-100)
    pub price: u32,
    /// Contracts available at this price, if published
    pub count: Option<u32>,
}

impl BookLevel {
    /// Contracts available at this level, falling back to [`DEFAULT_LEVEL_DEPTH`].
    pub fn depth(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_LEVEL_DEPTH)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Pair(u32, u32),
    Object {
        price: u32,
        #[serde(default, alias = "quantity", alias = "amount")]
        count: Option<u32>,
    },
    Price(u32),
}

impl From<RawLevel> for BookLevel {
    fn from(raw: RawLevel) -> Self {
        match raw {
            RawLevel::Pair(price, count) => Self::new(price, Some(count)),
            RawLevel::Object { price, count } => Self::new(price, count),
            RawLevel::Price(price) => Self::new(price, None),
        }
    }
}

/// Bid and ask ladders of one contract side, best level first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Constructor, Deserialize, Serialize)]
pub struct BookSide {
    #[serde(default)]
    pub bids: Vec<BookLevel>,
    #[serde(default)]
    pub asks: Vec<BookLevel>,
}

impl BookSide {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Orderbook snapshot of a binary market, per contract [`Side`].
///
/// A side the venue did not publish is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct OrderbookSnapshot {
    #[serde(default)]
    pub yes: Option<BookSide>,
    #[serde(default)]
    pub no: Option<BookSide>,
}

impl OrderbookSnapshot {
    pub fn side(&self, side: Side) -> Option<&BookSide> {
        match side {
            Side::Yes => self.yes.as_ref(),
            Side::No => self.no.as_ref(),
        }
    }

    /// Build a snapshot from Kalshi's native REST orderbook.
    ///
    /// Kalshi only publishes resting bids per side. Buying YES at `p` is the same as selling
    /// NO at `100 - p`, so each side's asks are the opposite side's bids mirrored around 100.
    pub fn from_native(native: &KalshiNativeOrderbook) -> Self {
        let yes_bids = native.orderbook.yes.as_deref().unwrap_or_default();
        let no_bids = native.orderbook.no.as_deref().unwrap_or_default();

        let build = |own: &[(u32, u32)], opposite: &[(u32, u32)]| {
            let mut bids: Vec<BookLevel> = own
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|&(price, count)| BookLevel::new(price, Some(count)))
                .collect();
            bids.sort_by(|a, b| b.price.cmp(&a.price));

            let mut asks: Vec<BookLevel> = opposite
                .iter()
                .filter(|(price, count)| *count > 0 && *price <= 100)
                .map(|&(price, count)| BookLevel::new(100 - price, Some(count)))
                .collect();
            asks.sort_by(|a, b| a.price.cmp(&b.price));

            let side = BookSide::new(bids, asks);
            (!side.is_empty()).then_some(side)
        };

        let snapshot = Self {
            yes: build(yes_bids, no_bids),
            no: build(no_bids, yes_bids),
        };

        debug!(
            yes_levels = yes_bids.len(),
            no_levels = no_bids.len(),
            "Converted native Kalshi orderbook"
        );

        snapshot
    }
}

/// Response from `GET /markets/{ticker}/orderbook`.
///
/// ### Raw Payload
/// ```json
/// {
///   "orderbook": {
///     "yes": [[38, 120], [40, 100]],
///     "no": [[55, 80], [58, 30]]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct KalshiNativeOrderbook {
    #[serde(default)]
    pub orderbook: KalshiNativeLevels,
}

/// Native resting bids per side: `(price_cents, quantity)`. A side with no bids is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct KalshiNativeLevels {
    #[serde(default)]
    pub yes: Option<Vec<(u32, u32)>>,
    #[serde(default)]
    pub no: Option<Vec<(u32, u32)>>,
}
