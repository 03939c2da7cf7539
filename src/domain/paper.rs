//! Paper trading: engine wiring and tick replay.

use std::collections::HashMap;

use super::engine::{EngineSummary, ExecutionEngine, SignalAdvisor, TradingConfig};
use super::market::Tick;
use super::portfolio::{Portfolio, PortfolioManager};
use super::risk::{RiskConfig, RiskManager};
use super::trade::Trade;
use crate::strategies::Strategy;

/// Simulated trading session: wires a fresh portfolio, portfolio manager
/// and risk manager around the execution engine. No real money moves.
pub struct PaperTrader {
    engine: ExecutionEngine,
}

impl PaperTrader {
    pub fn new(
        trading: &TradingConfig,
        risk: RiskConfig,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Self {
        let portfolio = Portfolio::new(trading.initial_balance);
        let portfolio_manager = PortfolioManager::new(portfolio, risk.fee_rate);
        let risk_manager = RiskManager::new(risk, trading.initial_balance);
        PaperTrader {
            engine: ExecutionEngine::new(
                trading.buy_amount,
                portfolio_manager,
                risk_manager,
                strategies,
            ),
        }
    }

    pub fn with_advisor(mut self, advisor: Box<dyn SignalAdvisor>) -> Self {
        self.engine = self.engine.with_advisor(advisor);
        self
    }

    pub fn process_tick(&mut self, tick: &Tick) -> Vec<Trade> {
        self.engine.process_tick(tick)
    }

    pub fn portfolio(&self) -> &Portfolio {
        self.engine.portfolio()
    }

    pub fn trade_log(&self) -> &[Trade] {
        self.engine.trade_log()
    }

    pub fn summary(&self) -> EngineSummary {
        self.engine.summary()
    }
}

/// Default rolling-history bound: seven days of hourly points.
pub const DEFAULT_HISTORY_LIMIT: usize = 168;

/// Replays raw ticks through a [`PaperTrader`], accumulating the bounded
/// per-ticker price/volume history a live feed collaborator would supply.
/// Histories are ordered oldest to newest and include the current tick as
/// their last point.
pub struct ReplaySession {
    trader: PaperTrader,
    history_limit: usize,
    price_history: HashMap<String, Vec<f64>>,
    volume_history: HashMap<String, Vec<f64>>,
}

impl ReplaySession {
    pub fn new(trader: PaperTrader) -> Self {
        ReplaySession {
            trader,
            history_limit: DEFAULT_HISTORY_LIMIT,
            price_history: HashMap::new(),
            volume_history: HashMap::new(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(2);
        self
    }

    pub fn feed(&mut self, tick: &Tick) -> Vec<Trade> {
        if !tick.is_valid() {
            return self.trader.process_tick(tick);
        }

        let prices = self.price_history.entry(tick.ticker.clone()).or_default();
        prices.push(tick.price);
        if prices.len() > self.history_limit {
            let excess = prices.len() - self.history_limit;
            prices.drain(..excess);
        }

        let mut enriched = tick.clone();
        enriched.price_history = prices.clone();

        if let Some(volume) = tick.volume {
            let volumes = self.volume_history.entry(tick.ticker.clone()).or_default();
            volumes.push(volume);
            if volumes.len() > self.history_limit {
                let excess = volumes.len() - self.history_limit;
                volumes.drain(..excess);
            }
            enriched.volume_history = volumes.clone();
        }

        self.trader.process_tick(&enriched)
    }

    pub fn trader(&self) -> &PaperTrader {
        &self.trader
    }
}
