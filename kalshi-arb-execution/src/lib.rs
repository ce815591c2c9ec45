//! Transport collaborator of the Kalshi opportunity engine.
//!
//! The engine only needs three things from the venue:
//!
//! - Market snapshots: [`KalshiTransport::fetch_markets`].
//! - Orderbook depth for a single market: [`KalshiTransport::fetch_orderbook`].
//! - Order placement returning an [`OrderConfirmation`]: [`KalshiTransport::place_order`].
//!
//! [`KalshiExecution`](client::kalshi::KalshiExecution) implements these over the Kalshi
//! Trade API v2 with RSA-PSS signed requests, request pacing and `429` back-off.

/// [`KalshiTransport`] trait and the Kalshi REST implementation.
pub mod client;

/// [`TransportError`] returned by every transport operation.
pub mod error;

/// Order request & confirmation types.
pub mod order;

pub use client::KalshiTransport;
pub use error::TransportError;
pub use order::{Action, OrderConfirmation, OrderKind, OrderRequest};
