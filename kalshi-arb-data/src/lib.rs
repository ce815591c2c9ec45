//! Normalised Kalshi market data for opportunity detection.
//!
//! The detection engine only ever reads two shapes of venue data:
//!
//! - [`MarketSnapshot`]: the fields of a single market as returned by `GET /markets`.
//! - [`OrderbookSnapshot`]: bid & ask ladders per contract [`Side`], best level first.
//!
//! Both are read-only snapshots. Kalshi's native REST orderbook only publishes resting bids;
//! [`OrderbookSnapshot::from_native`] derives the ask ladders from the opposite side's bids.

/// [`OrderbookSnapshot`] types and native Kalshi orderbook conversion.
pub mod book;

/// [`MarketSnapshot`] and [`ContractQuote`] types.
pub mod market;

pub use book::{BookLevel, BookSide, KalshiNativeOrderbook, OrderbookSnapshot, DEFAULT_LEVEL_DEPTH};
pub use market::{ContractQuote, MarketSnapshot};

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Contract side of a binary Kalshi market.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[display("yes")]
    Yes,
    #[display("no")]
    No,
}

impl Side {
    /// Both sides, in evaluation order.
    pub const ALL: [Side; 2] = [Side::Yes, Side::No];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display_and_serde() {
        assert_eq!(Side::Yes.to_string(), "yes");
        assert_eq!(Side::No.to_string(), "no");
        assert_eq!(serde_json::to_string(&Side::No).unwrap(), "\"no\"");
        assert_eq!(serde_json::from_str::<Side>("\"yes\"").unwrap(), Side::Yes);
    }
}
