//! Kalshi Trade API v2 request/response models.

use crate::order::{OrderKind, OrderRequest};
use kalshi_arb_data::{MarketSnapshot, Side};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Response page from `GET /markets`.
///
/// Markets are kept as raw JSON so one malformed entry cannot fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KalshiMarketsPage {
    #[serde(default)]
    pub markets: Vec<serde_json::Value>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl KalshiMarketsPage {
    /// Convert every entry into a [`MarketSnapshot`], skipping entries that fail to parse.
    pub fn into_snapshots(self) -> Vec<MarketSnapshot> {
        self.markets
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                let ticker = raw
                    .get("ticker")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                match serde_json::from_value::<MarketSnapshot>(raw) {
                    Ok(market) => Some(market),
                    Err(error) => {
                        warn!(index, %ticker, %error, "Skipping malformed Kalshi market");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Request body for `POST /portfolio/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KalshiCreateOrder {
    pub ticker: String,
    /// "buy" or "sell"
    pub action: String,
    /// "yes" or "no"
    pub side: String,
    /// "limit" or "market"
    #[serde(rename = "type")]
    pub order_type: String,
    pub count: u32,
    /// Price in cents (1-99)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_price: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_price: Option<u32>,
}

impl From<&OrderRequest> for KalshiCreateOrder {
    fn from(request: &OrderRequest) -> Self {
        let (yes_price, no_price) = match request.side {
            Side::Yes => (Some(request.price_cents), None),
            Side::No => (None, Some(request.price_cents)),
        };

        Self {
            ticker: request.ticker.to_string(),
            action: request.action.to_string(),
            side: request.side.to_string(),
            order_type: match request.kind {
                OrderKind::Limit => "limit",
                OrderKind::Market => "market",
            }
            .to_string(),
            count: request.quantity,
            yes_price,
            no_price,
        }
    }
}

/// Response from `POST /portfolio/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiOrderResponse {
    pub order: KalshiOrder,
}

/// A Kalshi order.
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiOrder {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub remaining_count: Option<u32>,
}

impl KalshiOrder {
    /// Filled count = original count - remaining count.
    pub fn filled_count(&self) -> u32 {
        let total = self.count.unwrap_or(0);
        let remaining = self.remaining_count.unwrap_or(0);
        total.saturating_sub(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Action;
    use smol_str::SmolStr;

    #[test]
    fn test_create_order_prices_by_side() {
        let request = OrderRequest::new(
            SmolStr::new("KXBTC-25JAN31"),
            Side::No,
            Action::Sell,
            OrderKind::Market,
            25,
            58,
        );

        let body = serde_json::to_value(KalshiCreateOrder::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "ticker": "KXBTC-25JAN31",
                "action": "sell",
                "side": "no",
                "type": "market",
                "count": 25,
                "no_price": 58
            })
        );
    }

    mod de {
        use super::*;

        #[test]
        fn test_markets_page_skips_malformed_market() {
            let input = r#"
            {
                "markets": [
                    {
                        "ticker": "KXGOOD",
                        "market_type": "binary",
                        "yes_bid": 52,
                        "no_bid": 50
                    },
                    {
                        "ticker": "KXBAD",
                        "market_type": "binary",
                        "yes_bid": "fifty"
                    },
                    {
                        "ticker": "KXNULLS",
                        "title": null,
                        "contracts": null
                    }
                ],
                "cursor": "abc"
            }
            "#;

            let page: KalshiMarketsPage = serde_json::from_str(input).unwrap();
            assert_eq!(page.cursor.as_deref(), Some("abc"));

            let markets = page.into_snapshots();
            let tickers: Vec<_> = markets.iter().map(|m| m.ticker.as_str()).collect();
            assert_eq!(tickers, vec!["KXGOOD", "KXNULLS"]);
            assert_eq!(markets[0].yes_bid, Some(52));
            assert_eq!(markets[1].title, "");
            assert!(markets[1].contract_quotes().is_empty());
        }

        #[test]
        fn test_order_response() {
            let input = r#"
            {
                "order": {
                    "order_id": "ee7d5e7a-2d5c-4c55-a4a8-0d3c4b6e2b1c",
                    "ticker": "KXBTC-25JAN31",
                    "status": "executed",
                    "action": "buy",
                    "side": "yes",
                    "type": "limit",
                    "yes_price": 48,
                    "count": 50,
                    "remaining_count": 10
                }
            }
            "#;

            let response: KalshiOrderResponse = serde_json::from_str(input).unwrap();
            assert_eq!(response.order.order_id, "ee7d5e7a-2d5c-4c55-a4a8-0d3c4b6e2b1c");
            assert_eq!(response.order.status.as_deref(), Some("executed"));
            assert_eq!(response.order.filled_count(), 40);
        }
    }
}
