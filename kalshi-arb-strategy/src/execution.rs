//! Two-leg execution of spread opportunities.

use crate::{error::ExecutionError, opportunity::SpreadOpportunity, spread::SpreadDetector};
use chrono::{DateTime, Utc};
use kalshi_arb_data::MarketSnapshot;
use kalshi_arb_execution::{
    Action, KalshiTransport, OrderConfirmation, OrderKind, OrderRequest, TransportError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Record of a fully executed spread round trip.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub opportunity: SpreadOpportunity,
    pub buy_confirmation: OrderConfirmation,
    pub sell_confirmation: OrderConfirmation,
    pub realized_net_profit: Decimal,
}

impl ExecutionRecord {
    /// Human readable one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "Executed {} {} contracts on {}: bought at {}c, sold at {}c, net profit ${}",
            self.opportunity.quantity,
            self.opportunity.side,
            self.opportunity.ticker,
            self.opportunity.buy_price,
            self.opportunity.sell_price,
            self.realized_net_profit.round_dp(2),
        )
    }
}

/// Append-only log of successful executions.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    records: Vec<ExecutionRecord>,
}

impl ExecutionLog {
    fn append(&mut self, record: ExecutionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_realized_net_profit(&self) -> Decimal {
        self.records
            .iter()
            .map(|record| record.realized_net_profit)
            .sum()
    }
}

/// Executes spread opportunities as a buy leg followed by a sell leg.
///
/// `execute` takes `&mut self`: the legs of one execution are never interleaved with another.
#[derive(Debug)]
pub struct ExecutionCoordinator<Transport> {
    transport: Transport,
    detector: SpreadDetector,
    log: ExecutionLog,
    settlement_delay: Duration,
}

impl<Transport> ExecutionCoordinator<Transport>
where
    Transport: KalshiTransport,
{
    pub fn new(
        transport: Transport,
        detector: SpreadDetector,
        log: ExecutionLog,
        settlement_delay: Duration,
    ) -> Self {
        Self {
            transport,
            detector,
            log,
            settlement_delay,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn detector(&self) -> &SpreadDetector {
        &self.detector
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Execute a spread opportunity.
    ///
    /// 1. Buy `quantity` at `buy_price`. Failure: [`ExecutionError::BuyLegFailed`], no sell.
    /// 2. Wait the settlement delay.
    /// 3. Sell `quantity` at `sell_price`. Failure: [`ExecutionError::UnhedgedPosition`]; the
    ///    bought contracts are left open and no unwind is attempted.
    /// 4. Append the [`ExecutionRecord`] to the log.
    pub async fn execute(
        &mut self,
        opportunity: &SpreadOpportunity,
        use_market_orders: bool,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let kind = OrderKind::from_market_flag(use_market_orders);

        let buy = OrderRequest::new(
            opportunity.ticker.clone(),
            opportunity.side,
            Action::Buy,
            kind,
            opportunity.quantity,
            opportunity.buy_price,
        );

        info!(
            ticker = %opportunity.ticker,
            side = %opportunity.side,
            quantity = opportunity.quantity,
            price = opportunity.buy_price,
            %kind,
            "Placing spread buy leg"
        );

        let buy_confirmation = confirmed(self.transport.place_order(&buy).await).map_err(|reason| {
            warn!(ticker = %opportunity.ticker, %reason, "Spread buy leg failed");
            ExecutionError::BuyLegFailed {
                ticker: opportunity.ticker.clone(),
                reason,
            }
        })?;

        if !self.settlement_delay.is_zero() {
            tokio::time::sleep(self.settlement_delay).await;
        }

        let sell = OrderRequest {
            action: Action::Sell,
            price_cents: opportunity.sell_price,
            ..buy
        };

        let sell_confirmation = match confirmed(self.transport.place_order(&sell).await) {
            Ok(confirmation) => confirmation,
            Err(reason) => {
                error!(
                    ticker = %opportunity.ticker,
                    side = %opportunity.side,
                    open_quantity = opportunity.quantity,
                    buy_order_id = %buy_confirmation.order_id,
                    %reason,
                    "Spread sell leg failed, position left unhedged"
                );
                return Err(ExecutionError::UnhedgedPosition {
                    ticker: opportunity.ticker.clone(),
                    side: opportunity.side,
                    open_quantity: opportunity.quantity,
                    buy_confirmation,
                    reason,
                });
            }
        };

        let record = ExecutionRecord {
            timestamp: Utc::now(),
            opportunity: opportunity.clone(),
            buy_confirmation,
            sell_confirmation,
            realized_net_profit: opportunity.net_profit,
        };

        info!(
            ticker = %opportunity.ticker,
            buy_order_id = %record.buy_confirmation.order_id,
            sell_order_id = %record.sell_confirmation.order_id,
            net_profit = %record.realized_net_profit,
            "{}",
            record.summary()
        );

        self.log.append(record.clone());
        Ok(record)
    }

    /// Scan markets for spread opportunities and optionally execute each with limit orders.
    ///
    /// With `auto_execute`, opportunities that fail to execute are logged and dropped from the
    /// result. Nothing is retried within a scan.
    pub async fn scan_and_execute(
        &mut self,
        markets: &[MarketSnapshot],
        auto_execute: bool,
    ) -> Vec<SpreadOpportunity> {
        let opportunities = self.detector.scan(markets, &self.transport).await;
        if !auto_execute {
            return opportunities;
        }

        let mut executed = Vec::with_capacity(opportunities.len());
        for opportunity in opportunities {
            match self.execute(&opportunity, false).await {
                Ok(_) => executed.push(opportunity),
                Err(error) => {
                    warn!(ticker = %opportunity.ticker, %error, "Dropping spread opportunity that failed to execute");
                }
            }
        }

        executed
    }
}

/// Accept a placed order only if the venue returned a non-empty confirmation.
fn confirmed(
    result: Result<OrderConfirmation, TransportError>,
) -> Result<OrderConfirmation, String> {
    match result {
        Ok(confirmation) if !confirmation.is_empty() => Ok(confirmation),
        Ok(_) => Err("empty order confirmation".to_string()),
        Err(error) => Err(error.to_string()),
    }
}
