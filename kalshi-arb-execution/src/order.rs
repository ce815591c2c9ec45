use derive_more::{Constructor, Display};
use kalshi_arb_data::Side;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Direction of an order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[display("buy")]
    Buy,
    #[display("sell")]
    Sell,
}

/// Kalshi order type.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    #[default]
    #[display("limit")]
    Limit,
    #[display("market")]
    Market,
}

impl OrderKind {
    pub fn from_market_flag(use_market_orders: bool) -> Self {
        if use_market_orders {
            Self::Market
        } else {
            Self::Limit
        }
    }
}

/// Single order to place on a Kalshi market.
///
/// `price_cents` is the limit price for [`OrderKind::Limit`] and the worst acceptable price for
/// [`OrderKind::Market`].
#[derive(Clone, Eq, PartialEq, Debug, Constructor, Deserialize, Serialize)]
pub struct OrderRequest {
    pub ticker: SmolStr,
    pub side: Side,
    pub action: Action,
    pub kind: OrderKind,
    pub quantity: u32,
    pub price_cents: u32,
}

/// Venue acknowledgement of a placed order.
///
/// `raw` retains the full response body for audit.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct OrderConfirmation {
    pub order_id: SmolStr,
    pub status: Option<String>,
    pub raw: serde_json::Value,
}

impl OrderConfirmation {
    /// An acknowledgement without an order id does not represent a resting or filled order.
    pub fn is_empty(&self) -> bool {
        self.order_id.trim().is_empty()
    }
}
