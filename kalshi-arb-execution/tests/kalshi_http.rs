//! Kalshi REST transport tests against a local stub venue.
//!
//! The stub answers each accepted connection with the next scripted response, then closes it.
//! Pacing is disabled and every response carries `Retry-After: 0`, so retries run immediately.

use kalshi_arb_data::{BookLevel, Side};
use kalshi_arb_execution::{
    KalshiTransport, TransportError,
    client::kalshi::{KalshiExecution, KalshiExecutionConfig, http::KalshiHttpClient},
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::{sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use url::Url;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MARKETS_PAGE: &str = r#"{"markets":[{"ticker":"KXTEST","market_type":"binary","yes_bid":52}],"cursor":null}"#;

struct StubVenue {
    base_url: Url,
    paths: Arc<Mutex<Vec<String>>>,
}

impl StubVenue {
    async fn serve(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let paths = Arc::new(Mutex::new(Vec::new()));

        let served = Arc::clone(&paths);
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();

                let head = read_request_head(&mut stream).await;
                if let Some(path) = head.split_whitespace().nth(1) {
                    served.lock().push(path.to_string());
                }

                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|status| status.canonical_reason())
                    .unwrap_or_default();
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Retry-After: 0\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/trade-api/v2")).unwrap(),
            paths,
        }
    }

    fn http_client(&self) -> KalshiHttpClient {
        KalshiHttpClient::new(None, self.base_url.clone(), Duration::ZERO)
    }

    fn transport(&self) -> KalshiExecution {
        KalshiExecution::new(KalshiExecutionConfig {
            credentials: None,
            base_url: self.base_url.clone(),
            min_request_interval: Duration::ZERO,
        })
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }
}

async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buffer = [0u8; 1024];

    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).await.unwrap();
        if read == 0 {
            break;
        }
        head.extend_from_slice(&buffer[..read]);
    }

    String::from_utf8_lossy(&head).into_owned()
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rate_limited_request_is_retried_once() {
    let venue = StubVenue::serve(vec![(429, "{}"), (200, MARKETS_PAGE)]).await;
    let client = venue.http_client();

    let page = client.fetch_markets(10, "open").await.unwrap();

    assert_eq!(page.into_snapshots()[0].ticker, "KXTEST");
    assert_eq!(client.request_count(), 2);
    assert_eq!(
        venue.paths(),
        vec![
            "/trade-api/v2/markets?limit=10&status=open".to_string(),
            "/trade-api/v2/markets?limit=10&status=open".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_persistent_rate_limit_surfaces_error() {
    let venue = StubVenue::serve(vec![(429, "{}"), (429, "{}")]).await;
    let client = venue.http_client();

    let error = client.fetch_markets(10, "open").await.unwrap_err();

    assert_eq!(error, TransportError::RateLimited { retry_after_secs: 0 });
    assert_eq!(client.request_count(), 2);
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_markets_skips_malformed_market() {
    let page = r#"{
        "markets": [
            {"ticker": "KXGOOD", "market_type": "binary", "yes_bid": 52, "no_bid": 50},
            {"ticker": "KXBAD", "title": null, "contracts": null, "yes_ask": -4},
            {"ticker": "KXNULLS", "title": null, "contracts": null}
        ]
    }"#;
    let venue = StubVenue::serve(vec![(200, page)]).await;

    let markets = venue.transport().fetch_markets(3, "open").await.unwrap();

    let tickers: Vec<_> = markets.iter().map(|m| m.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["KXGOOD", "KXNULLS"]);
}

#[tokio::test]
async fn test_unparseable_markets_body_is_parse_error() {
    let venue = StubVenue::serve(vec![(200, "not json")]).await;

    let error = venue.transport().fetch_markets(3, "open").await.unwrap_err();
    assert!(matches!(error, TransportError::Parse(_)));
}

// ---------------------------------------------------------------------------
// Orderbooks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_orderbook_is_none() {
    let venue = StubVenue::serve(vec![(404, r#"{"error":"market not found"}"#)]).await;

    let book = venue.transport().fetch_orderbook("KXGONE").await;

    assert_eq!(book, Ok(None));
    assert_eq!(venue.paths(), vec!["/trade-api/v2/markets/KXGONE/orderbook".to_string()]);
}

#[tokio::test]
async fn test_orderbook_server_error_surfaces_status() {
    let venue = StubVenue::serve(vec![(500, "boom")]).await;

    let error = venue.transport().fetch_orderbook("KXTEST").await.unwrap_err();
    assert_eq!(
        error,
        TransportError::Api {
            status: 500,
            body: "boom".to_string(),
        }
    );
}

#[tokio::test]
async fn test_native_orderbook_converted_to_ladders() {
    let venue =
        StubVenue::serve(vec![(200, r#"{"orderbook":{"yes":[[40,100]],"no":[[55,20]]}}"#)]).await;

    let book = venue
        .transport()
        .fetch_orderbook("KXTEST")
        .await
        .unwrap()
        .unwrap();

    let yes = book.side(Side::Yes).unwrap();
    assert_eq!(yes.best_bid(), Some(&BookLevel::new(40, Some(100))));
    assert_eq!(yes.best_ask(), Some(&BookLevel::new(45, Some(20))));
}
