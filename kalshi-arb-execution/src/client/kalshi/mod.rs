//! Kalshi REST transport for the opportunity engine.
//!
//! Prices are integer cents (0-100) end to end; Kalshi's native orderbook is converted into
//! bid/ask ladders with [`OrderbookSnapshot::from_native`].

pub mod auth;
pub mod http;
pub mod model;

use self::{
    auth::KalshiCredentials,
    http::{KALSHI_API_BASE, KALSHI_DEMO_API_BASE, KalshiHttpClient},
    model::{KalshiCreateOrder, KalshiOrderResponse},
};
use super::KalshiTransport;
use crate::{
    error::TransportError,
    order::{OrderConfirmation, OrderRequest},
};
use async_trait::async_trait;
use kalshi_arb_data::{MarketSnapshot, OrderbookSnapshot};
use smol_str::SmolStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default minimum interval between consecutive requests.
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the Kalshi transport.
#[derive(Debug, Clone)]
pub struct KalshiExecutionConfig {
    /// Request signing credentials. Without them only public endpoints succeed.
    pub credentials: Option<KalshiCredentials>,
    pub base_url: Url,
    pub min_request_interval: Duration,
}

impl KalshiExecutionConfig {
    /// Load the configuration from environment variables.
    ///
    /// Reads:
    /// - `KALSHI_API_KEY`: API key ID
    /// - `KALSHI_PRIVATE_KEY_PATH`: Path to PEM file (preferred)
    /// - `KALSHI_PRIVATE_KEY_PEM`: PEM string (fallback)
    /// - `KALSHI_API_BASE_URL`: Trade API v2 base URL (default production)
    /// - `KALSHI_DEMO`: `true` selects the demo environment when no base URL is set
    /// - `API_MIN_INTERVAL_MS`: minimum interval between requests (default 100)
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through the provided variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TransportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let credentials = match get("KALSHI_API_KEY") {
            Some(api_key) => {
                if let Some(path) = get("KALSHI_PRIVATE_KEY_PATH") {
                    Some(KalshiCredentials::from_file(api_key, path)?)
                } else if let Some(pem) = get("KALSHI_PRIVATE_KEY_PEM") {
                    Some(KalshiCredentials::from_pem(api_key, &pem)?)
                } else {
                    return Err(TransportError::Auth(
                        "Neither KALSHI_PRIVATE_KEY_PATH nor KALSHI_PRIVATE_KEY_PEM is set".into(),
                    ));
                }
            }
            None => {
                warn!("KALSHI_API_KEY not set, only public market data endpoints are available");
                None
            }
        };

        let demo = get("KALSHI_DEMO")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let base_url = match get("KALSHI_API_BASE_URL") {
            Some(raw) => raw,
            None if demo => KALSHI_DEMO_API_BASE.to_string(),
            None => KALSHI_API_BASE.to_string(),
        };
        let base_url = Url::parse(&base_url).map_err(|e| {
            TransportError::Request(format!("invalid KALSHI_API_BASE_URL {base_url}: {e}"))
        })?;

        let min_request_interval = match get("API_MIN_INTERVAL_MS") {
            Some(raw) => raw.trim().parse().map(Duration::from_millis).map_err(|_| {
                TransportError::Request(format!("invalid API_MIN_INTERVAL_MS: {raw}"))
            })?,
            None => DEFAULT_MIN_REQUEST_INTERVAL,
        };

        Ok(Self {
            credentials,
            base_url,
            min_request_interval,
        })
    }
}

/// [`KalshiTransport`] over the Kalshi Trade API v2.
#[derive(Debug, Clone)]
pub struct KalshiExecution {
    http: KalshiHttpClient,
}

impl KalshiExecution {
    pub fn new(config: KalshiExecutionConfig) -> Self {
        info!(
            base_url = %config.base_url,
            authenticated = config.credentials.is_some(),
            min_interval_ms = config.min_request_interval.as_millis() as u64,
            "Initialising Kalshi transport"
        );

        Self {
            http: KalshiHttpClient::new(
                config.credentials,
                config.base_url,
                config.min_request_interval,
            ),
        }
    }

    /// Total requests issued so far, retries included.
    pub fn request_count(&self) -> u64 {
        self.http.request_count()
    }
}

#[async_trait]
impl KalshiTransport for KalshiExecution {
    async fn fetch_markets(
        &self,
        limit: usize,
        status: &str,
    ) -> Result<Vec<MarketSnapshot>, TransportError> {
        let page = self.http.fetch_markets(limit, status).await?;
        let fetched = page.markets.len();
        let markets = page.into_snapshots();
        debug!(fetched, parsed = markets.len(), %status, "Fetched Kalshi markets");
        Ok(markets)
    }

    async fn fetch_orderbook(
        &self,
        ticker: &str,
    ) -> Result<Option<OrderbookSnapshot>, TransportError> {
        match self.http.fetch_orderbook(ticker).await {
            Ok(native) => Ok(Some(OrderbookSnapshot::from_native(&native))),
            Err(TransportError::Api { status: 404, .. }) => {
                debug!(%ticker, "Kalshi has no orderbook for market");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn place_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, TransportError> {
        let raw = self
            .http
            .create_order(&KalshiCreateOrder::from(request))
            .await?;
        let response: KalshiOrderResponse = serde_json::from_value(raw.clone())?;

        debug!(
            ticker = %request.ticker,
            side = %request.side,
            action = %request.action,
            order_id = %response.order.order_id,
            filled = response.order.filled_count(),
            "Kalshi order placed"
        );

        Ok(OrderConfirmation {
            order_id: SmolStr::new(&response.order.order_id),
            status: response.order.status,
            raw,
        })
    }
}
