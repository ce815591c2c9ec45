use crate::{
    error::TransportError,
    order::{OrderConfirmation, OrderRequest},
};
use async_trait::async_trait;
use kalshi_arb_data::{MarketSnapshot, OrderbookSnapshot};

/// Kalshi REST implementation of [`KalshiTransport`].
pub mod kalshi;

/// Venue operations the opportunity engine depends on.
///
/// Every failure is returned as a [`TransportError`] value; callers decide how to degrade.
#[async_trait]
pub trait KalshiTransport: Send + Sync {
    /// Fetch up to `limit` markets with the provided status (eg/ "open").
    async fn fetch_markets(
        &self,
        limit: usize,
        status: &str,
    ) -> Result<Vec<MarketSnapshot>, TransportError>;

    /// Fetch the current orderbook of a market. `Ok(None)` if the venue has no book for it.
    async fn fetch_orderbook(
        &self,
        ticker: &str,
    ) -> Result<Option<OrderbookSnapshot>, TransportError>;

    /// Place a single order.
    async fn place_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, TransportError>;
}
