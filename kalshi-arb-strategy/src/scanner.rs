//! Market scanning: fetch, filter, analyse, and optionally execute.

use crate::{
    analyzer::ArbitrageAnalyzer,
    config::ScannerConfig,
    execution::{ExecutionCoordinator, ExecutionLog},
    opportunity::{ArbitrageOpportunity, SpreadOpportunity},
    spread::SpreadDetector,
};
use kalshi_arb_data::MarketSnapshot;
use kalshi_arb_execution::KalshiTransport;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{info, warn};

/// Market status requested from the venue.
pub const OPEN_STATUS: &str = "open";

/// Results of a full scan.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ScanReport {
    /// Arbitrage opportunities, highest profit per day first
    pub arbitrage: Vec<ArbitrageOpportunity>,
    /// Spread opportunities, highest net profit first
    pub spreads: Vec<SpreadOpportunity>,
    /// Spread opportunities executed during the scan
    pub executed: usize,
}

/// Which kind of opportunity a scan favours.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Recommendation {
    /// Best spread's immediate net profit beats the best arbitrage's total expected profit.
    SpreadTrade { ticker: SmolStr, net_profit: Decimal },
    /// Best arbitrage's expected profit until expiration is the better return.
    ProbabilityArbitrage {
        ticker: SmolStr,
        profit_per_day: Decimal,
        expected_total_profit: Decimal,
    },
    None,
}

impl ScanReport {
    /// Compare the best spread trade against the best probability arbitrage.
    pub fn recommendation(&self) -> Recommendation {
        let spread = self.spreads.first();
        let arbitrage = self.arbitrage.first();

        let spread_trade = |best: &SpreadOpportunity| Recommendation::SpreadTrade {
            ticker: best.ticker.clone(),
            net_profit: best.net_profit,
        };
        let probability_arbitrage = |best: &ArbitrageOpportunity| {
            Recommendation::ProbabilityArbitrage {
                ticker: best.ticker.clone(),
                profit_per_day: best.profit_per_day,
                expected_total_profit: best.expected_total_profit(),
            }
        };

        match (spread, arbitrage) {
            (Some(spread), Some(arbitrage)) => {
                if spread.net_profit > arbitrage.expected_total_profit() {
                    spread_trade(spread)
                } else if arbitrage.profit_per_day > Decimal::ZERO {
                    probability_arbitrage(arbitrage)
                } else {
                    Recommendation::None
                }
            }
            (Some(spread), None) if spread.is_profitable() => spread_trade(spread),
            (None, Some(arbitrage)) if arbitrage.profit_per_day > Decimal::ZERO => {
                probability_arbitrage(arbitrage)
            }
            _ => Recommendation::None,
        }
    }
}

/// Runs arbitrage & spread detection over the venue's open markets.
#[derive(Debug)]
pub struct OpportunityScanner<Transport> {
    config: ScannerConfig,
    analyzer: ArbitrageAnalyzer,
    coordinator: ExecutionCoordinator<Transport>,
}

impl<Transport> OpportunityScanner<Transport>
where
    Transport: KalshiTransport,
{
    /// Construct a scanner with the default analyzer and an empty [`ExecutionLog`].
    pub fn new(transport: Transport, config: ScannerConfig) -> Self {
        let coordinator = ExecutionCoordinator::new(
            transport,
            SpreadDetector::new(config.spread),
            ExecutionLog::default(),
            config.execution.settlement_delay(),
        );

        Self::from_parts(config, ArbitrageAnalyzer::default(), coordinator)
    }

    pub fn from_parts(
        config: ScannerConfig,
        analyzer: ArbitrageAnalyzer,
        coordinator: ExecutionCoordinator<Transport>,
    ) -> Self {
        Self {
            config,
            analyzer,
            coordinator,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator<Transport> {
        &self.coordinator
    }

    pub fn execution_log(&self) -> &ExecutionLog {
        self.coordinator.log()
    }

    /// Fetch open markets with enough liquidity and a tradeable two-sided quote.
    ///
    /// A transport failure degrades to an empty list.
    pub async fn fetch_tradeable_markets(&self, limit: usize) -> Vec<MarketSnapshot> {
        let markets = match self
            .coordinator
            .transport()
            .fetch_markets(limit, OPEN_STATUS)
            .await
        {
            Ok(markets) => markets,
            Err(error) => {
                warn!(%error, "Failed to fetch markets");
                return Vec::new();
            }
        };

        let fetched = markets.len();
        let tradeable: Vec<_> = markets
            .into_iter()
            .filter(|market| market.liquidity.unwrap_or(0) >= self.config.min_liquidity)
            .filter(MarketSnapshot::has_tradeable_quotes)
            .collect();

        info!(
            fetched,
            tradeable = tradeable.len(),
            min_liquidity = self.config.min_liquidity,
            "Filtered markets by liquidity"
        );

        tradeable
    }

    /// Arbitrage opportunities meeting the minimum profit per day.
    pub async fn scan_arbitrage(&self, limit: usize) -> Vec<ArbitrageOpportunity> {
        let markets = self.fetch_tradeable_markets(limit).await;
        self.arbitrage(&markets)
    }

    /// Spread opportunities, optionally executed, sorted by net profit (highest first).
    pub async fn scan_spreads(&mut self, limit: usize, auto_execute: bool) -> Vec<SpreadOpportunity> {
        let markets = self.fetch_tradeable_markets(limit).await;
        let mut spreads = self
            .coordinator
            .scan_and_execute(&markets, auto_execute)
            .await;
        sort_spreads(&mut spreads);
        spreads
    }

    /// Scan one market fetch for both arbitrage and spreads.
    ///
    /// With `auto_execute`, every profitable spread is executed after detection and counted.
    pub async fn scan_all(&mut self, limit: usize, auto_execute: bool) -> ScanReport {
        let markets = self.fetch_tradeable_markets(limit).await;
        let arbitrage = self.arbitrage(&markets);

        let mut spreads = self.coordinator.scan_and_execute(&markets, false).await;
        sort_spreads(&mut spreads);

        let mut executed = 0;
        if auto_execute {
            let use_market_orders = self.config.execution.use_market_orders;
            for spread in spreads.iter().filter(|spread| spread.is_profitable()) {
                match self.coordinator.execute(spread, use_market_orders).await {
                    Ok(_) => executed += 1,
                    Err(error) => warn!(ticker = %spread.ticker, %error, "Auto-execution failed"),
                }
            }
        }

        info!(
            markets = markets.len(),
            arbitrage = arbitrage.len(),
            spreads = spreads.len(),
            executed,
            "Scan complete"
        );

        ScanReport {
            arbitrage,
            spreads,
            executed,
        }
    }

    fn arbitrage(&self, markets: &[MarketSnapshot]) -> Vec<ArbitrageOpportunity> {
        let min_profit_per_day = self.config.min_profit_per_day;
        self.analyzer
            .find_opportunities(markets)
            .into_iter()
            .filter(|opportunity| opportunity.profit_per_day >= min_profit_per_day)
            .collect()
    }
}

fn sort_spreads(spreads: &mut [SpreadOpportunity]) {
    spreads.sort_by(|a, b| b.net_profit.cmp(&a.net_profit));
}
