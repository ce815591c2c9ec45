//! Kalshi REST HTTP client with RSA signature authentication and request pacing.

use super::{
    auth::{KalshiAuthHeaders, KalshiCredentials},
    model::{KalshiCreateOrder, KalshiMarketsPage},
};
use crate::error::TransportError;
use chrono::Utc;
use kalshi_arb_data::KalshiNativeOrderbook;
use parking_lot::Mutex;
use reqwest::{
    Client, Method, RequestBuilder, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error, warn};
use url::Url;

pub const KALSHI_API_BASE: &str = "https://api.elections.kalshi.com/trade-api/v2";
pub const KALSHI_DEMO_API_BASE: &str = "https://demo-api.kalshi.co/trade-api/v2";

/// Cooldown applied when a `429` response carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Request pacing state shared by every clone of a [`KalshiHttpClient`].
///
/// Enforces a minimum interval between consecutive requests and an optional cooldown after the
/// venue rate limits us.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Option<Instant>,
    cooldown_until: Option<Instant>,
    request_count: u64,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
            cooldown_until: None,
            request_count: 0,
        }
    }

    /// Reserve the next request slot, returning how long the caller must wait before sending.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let mut start = now;

        if let Some(until) = self.cooldown_until {
            if until > now {
                start = until;
            } else {
                self.cooldown_until = None;
            }
        }

        if let Some(last) = self.last_request {
            start = start.max(last + self.min_interval);
        }

        self.last_request = Some(start);
        self.request_count += 1;
        start.duration_since(now)
    }

    /// Block every request until `until`. An existing later cooldown is kept.
    pub fn cool_down(&mut self, until: Instant) {
        self.cooldown_until = Some(match self.cooldown_until {
            Some(current) => current.max(until),
            None => until,
        });
    }

    /// Number of requests reserved so far.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }
}

/// Kalshi REST client.
///
/// Requests are signed when [`KalshiCredentials`] are configured; public market data endpoints
/// are also reachable without them.
#[derive(Debug, Clone)]
pub struct KalshiHttpClient {
    client: Client,
    credentials: Option<KalshiCredentials>,
    base_url: Url,
    pacer: Arc<Mutex<RequestPacer>>,
}

impl KalshiHttpClient {
    pub fn new(
        credentials: Option<KalshiCredentials>,
        base_url: Url,
        min_request_interval: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url,
            pacer: Arc::new(Mutex::new(RequestPacer::new(min_request_interval))),
        }
    }

    /// Total requests issued by this client (and its clones), retries included.
    pub fn request_count(&self) -> u64 {
        self.pacer.lock().request_count()
    }

    /// Fetch a page of markets: `GET /markets?limit=&status=`.
    pub async fn fetch_markets(
        &self,
        limit: usize,
        status: &str,
    ) -> Result<KalshiMarketsPage, TransportError> {
        let query = [("limit", limit.to_string()), ("status", status.to_string())];
        self.send(Method::GET, "/markets", &query, None).await
    }

    /// Fetch a market's native orderbook: `GET /markets/{ticker}/orderbook`.
    pub async fn fetch_orderbook(
        &self,
        ticker: &str,
    ) -> Result<KalshiNativeOrderbook, TransportError> {
        let path = format!("/markets/{ticker}/orderbook");
        self.send(Method::GET, &path, &[], None).await
    }

    /// Create an order: `POST /portfolio/orders`. Returns the raw response body.
    pub async fn create_order(
        &self,
        order: &KalshiCreateOrder,
    ) -> Result<serde_json::Value, TransportError> {
        let body = serde_json::to_value(order)?;
        self.send(Method::POST, "/portfolio/orders", &[], Some(&body))
            .await
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&raw).map_err(|e| TransportError::Request(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Build a request, adding authentication headers if credentials are configured.
    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, "application/json");

        match &self.credentials {
            Some(credentials) => {
                // Signature covers the full path (eg/ /trade-api/v2/portfolio/orders), no query
                let headers =
                    credentials.sign(method.as_str(), url.path(), Utc::now().timestamp_millis());
                builder
                    .header(KalshiAuthHeaders::KEY_HEADER, headers.api_key)
                    .header(KalshiAuthHeaders::SIGNATURE_HEADER, headers.signature)
                    .header(KalshiAuthHeaders::TIMESTAMP_HEADER, headers.timestamp)
            }
            None => builder,
        }
    }

    async fn pace(&self) {
        let wait = self.pacer.lock().reserve(Instant::now());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Pacing Kalshi request");
            tokio::time::sleep(wait).await;
        }
    }

    /// Send a paced request. A `429` sets the shared cooldown and is retried once.
    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path, query)?;
        let mut retried = false;

        loop {
            self.pace().await;

            let mut request = self.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = retry_after_secs(response.headers());
                self.pacer
                    .lock()
                    .cool_down(Instant::now() + Duration::from_secs(retry_after_secs));

                if retried {
                    error!(%path, retry_after_secs, "Kalshi rate limit persisted after retry");
                    return Err(TransportError::RateLimited { retry_after_secs });
                }

                warn!(%path, retry_after_secs, "Kalshi rate limit hit, cooling down before retry");
                retried = true;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                debug!(%path, status = status.as_u16(), %body, "Kalshi request failed");
                return Err(TransportError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(response.json().await?);
        }
    }
}

fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
