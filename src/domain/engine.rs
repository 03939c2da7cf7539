//! Per-tick execution engine: strategy evaluation, risk gating, order
//! execution.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::error::CoinTraderError;
use super::market::{MarketView, Tick};
use super::portfolio::{Portfolio, PortfolioManager};
use super::risk::RiskManager;
use super::signal::{Signal, SignalType};
use super::trade::Trade;
use crate::strategies::Strategy;

/// Session-level trading parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingConfig {
    pub initial_balance: f64,
    /// Fixed quote amount committed per entry.
    pub buy_amount: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            initial_balance: 1_000_000.0,
            buy_amount: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisorVerdict {
    Execute,
    Skip,
    Modify,
}

/// An external advisor's judgement on a pending signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorDecision {
    pub verdict: AdvisorVerdict,
    /// Confidence in [0, 1], enforced at construction.
    pub confidence: f64,
    pub reasoning: String,
}

impl AdvisorDecision {
    pub fn new(
        verdict: AdvisorVerdict,
        confidence: f64,
        reasoning: String,
    ) -> Result<Self, CoinTraderError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CoinTraderError::Validation {
                reason: format!("advisor confidence {confidence} outside [0, 1]"),
            });
        }
        Ok(AdvisorDecision {
            verdict,
            confidence,
            reasoning,
        })
    }
}

/// Injection point for an external advisory layer. Consulted before risk
/// gating; a `Skip` verdict suppresses execution of the signal.
pub trait SignalAdvisor {
    fn review(&self, signal: &Signal, market: &MarketView) -> AdvisorDecision;
}

/// Snapshot of session results for reporting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSummary {
    pub quote_balance: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub open_positions: usize,
    pub trade_log_len: usize,
}

/// Core trading engine. Owns the portfolio manager and risk manager and
/// drives one synchronous state machine per tick:
///
/// 1. reject invalid ticks;
/// 2. update the trailing high;
/// 3. evaluate risk exits (stop-loss, take-profit, trailing stop) and, if
///    one fires, execute it and finish the tick; strategies are not
///    consulted on a tick that exited;
/// 4. otherwise evaluate each strategy in registration order and route any
///    signal through advisory review and risk gating to execution.
pub struct ExecutionEngine {
    buy_amount: f64,
    portfolio: PortfolioManager,
    risk: RiskManager,
    strategies: Vec<Box<dyn Strategy>>,
    advisor: Option<Box<dyn SignalAdvisor>>,
    trade_log: Vec<Trade>,
}

impl ExecutionEngine {
    pub fn new(
        buy_amount: f64,
        portfolio: PortfolioManager,
        risk: RiskManager,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Self {
        ExecutionEngine {
            buy_amount,
            portfolio,
            risk,
            strategies,
            advisor: None,
            trade_log: Vec::new(),
        }
    }

    pub fn with_advisor(mut self, advisor: Box<dyn SignalAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio.portfolio
    }

    pub fn trade_log(&self) -> &[Trade] {
        &self.trade_log
    }

    /// Process a single tick through exits and all strategies. Returns the
    /// trades executed on this tick, in execution order.
    pub fn process_tick(&mut self, tick: &Tick) -> Vec<Trade> {
        if !tick.is_valid() {
            debug!("ignoring invalid tick: {:?}/{}", tick.ticker, tick.price);
            return Vec::new();
        }

        let ticker = tick.ticker.clone();
        let price = tick.price;
        let mut trades = Vec::new();

        self.portfolio.update_highest_price(&ticker, price);

        if let Some(exit) = self.check_risk_exits(&ticker, price) {
            if let Some(profit) = exit.profit {
                self.risk.record_trade_pnl(profit);
            }
            self.trade_log.push(exit.clone());
            trades.push(exit);
            // Entries are not evaluated on a tick that exited, so a fresh
            // signal cannot immediately re-enter the same move.
            return trades;
        }

        for i in 0..self.strategies.len() {
            // Rebuilt per strategy: an earlier entry this tick changes
            // has_position for the next evaluator.
            let view = self.market_view(&ticker, tick);
            let strategy = &self.strategies[i];
            let signal = match strategy.evaluate(&ticker, &view) {
                Ok(signal) => signal,
                Err(err) => {
                    warn!(
                        "strategy {} failed on {ticker}, treating as no signal: {err}",
                        strategy.name()
                    );
                    None
                }
            };
            let Some(signal) = signal else { continue };

            if let Some(trade) = self.execute_signal(&signal, price, &view) {
                trades.push(trade);
            }
        }

        trades
    }

    pub fn summary(&self) -> EngineSummary {
        let portfolio = self.portfolio();
        EngineSummary {
            quote_balance: portfolio.quote_balance,
            total_trades: portfolio.total_trades,
            winning_trades: portfolio.winning_trades,
            win_rate: portfolio.win_rate(),
            total_profit: portfolio.total_profit,
            open_positions: portfolio.open_position_count(),
            trade_log_len: self.trade_log.len(),
        }
    }

    /// Evaluate exits in fixed order: stop-loss, take-profit, trailing
    /// stop. The first trigger wins and is executed immediately.
    fn check_risk_exits(&mut self, ticker: &str, price: f64) -> Option<Trade> {
        let position = self.portfolio.open_position(ticker)?;

        let triggered = [
            self.risk.check_stop_loss(position, price),
            self.risk.check_take_profit(position, price),
            self.risk.check_trailing_stop(position, price),
        ]
        .into_iter()
        .find(|check| check.allowed)?;

        let strategy_name = position.strategy_name.clone();
        info!("risk exit on {ticker}: {}", triggered.reason);
        self.portfolio
            .execute_sell(&strategy_name, ticker, price, &triggered.reason)
    }

    fn execute_signal(&mut self, signal: &Signal, price: f64, view: &MarketView) -> Option<Trade> {
        if let Some(advisor) = &self.advisor {
            let decision = advisor.review(signal, view);
            if decision.verdict == AdvisorVerdict::Skip {
                info!(
                    "advisor skipped {} on {} ({:.2}): {}",
                    signal.strategy_name, signal.ticker, decision.confidence, decision.reasoning
                );
                return None;
            }
        }

        match signal.signal_type {
            SignalType::Buy => {
                let check = self
                    .risk
                    .check_buy(signal, &self.portfolio.portfolio, self.buy_amount);
                if !check.allowed {
                    info!("buy blocked on {}: {}", signal.ticker, check.reason);
                    return None;
                }
                let trade = self.portfolio.execute_buy(
                    &signal.strategy_name,
                    &signal.ticker,
                    price,
                    self.buy_amount,
                    &signal.reason,
                )?;
                self.trade_log.push(trade.clone());
                // Entries realize nothing; record a zero so the daily
                // trade count still moves.
                self.risk.record_trade_pnl(0.0);
                Some(trade)
            }
            SignalType::Sell => {
                let check = self.risk.check_sell(signal, &self.portfolio.portfolio);
                if !check.allowed {
                    info!("sell blocked on {}: {}", signal.ticker, check.reason);
                    return None;
                }
                let trade = self.portfolio.execute_sell(
                    &signal.strategy_name,
                    &signal.ticker,
                    price,
                    &signal.reason,
                )?;
                if let Some(profit) = trade.profit {
                    self.risk.record_trade_pnl(profit);
                }
                self.trade_log.push(trade.clone());
                Some(trade)
            }
        }
    }

    fn market_view(&self, ticker: &str, tick: &Tick) -> MarketView {
        let position = self.portfolio.open_position(ticker);
        MarketView::from_tick(
            tick,
            position.is_some(),
            position.map(|p| p.entry_price),
        )
    }
}
