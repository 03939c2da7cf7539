//! Risk management rules.

use chrono::{NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::portfolio::Portfolio;
use super::position::Position;
use super::signal::{Signal, SignalType};

/// Risk rule thresholds. Loss-side percentages (`stop_loss_pct`,
/// `max_daily_loss_pct`, `max_drawdown_pct`) are negative; `fee_rate` is a
/// percentage (0.05 meaning 0.05%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub trailing_stop_pct: f64,
    pub max_daily_loss_pct: f64,
    pub max_drawdown_pct: f64,
    pub max_positions: usize,
    pub fee_rate: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            stop_loss_pct: -5.0,
            take_profit_pct: 10.0,
            trailing_stop_pct: 3.0,
            max_daily_loss_pct: -3.0,
            max_drawdown_pct: -15.0,
            max_positions: 5,
            fee_rate: 0.05,
        }
    }
}

/// Outcome of one rule evaluation. For gating checks `allowed` means the
/// order may proceed; for exit checks it means the exit triggered, with a
/// human-readable reason either way.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskCheck {
    pub allowed: bool,
    pub reason: String,
}

impl RiskCheck {
    fn allow() -> Self {
        RiskCheck {
            allowed: true,
            reason: String::new(),
        }
    }

    fn allow_because(reason: String) -> Self {
        RiskCheck {
            allowed: true,
            reason,
        }
    }

    fn block(reason: String) -> Self {
        RiskCheck {
            allowed: false,
            reason,
        }
    }
}

/// Rolling daily realized-PnL aggregate, reset lazily when the UTC date
/// rolls over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub realized_pnl: f64,
    pub trades_today: usize,
}

impl DailyPnl {
    fn new(date: NaiveDate) -> Self {
        DailyPnl {
            date,
            realized_pnl: 0.0,
            trades_today: 0,
        }
    }
}

/// Enforces risk rules on trading decisions. Stateless apart from the
/// daily aggregate.
#[derive(Debug, Clone)]
pub struct RiskManager {
    config: RiskConfig,
    initial_balance: f64,
    daily: DailyPnl,
}

impl RiskManager {
    pub fn new(config: RiskConfig, initial_balance: f64) -> Self {
        RiskManager {
            config,
            initial_balance,
            daily: DailyPnl::new(Utc::now().date_naive()),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn daily(&self) -> &DailyPnl {
        &self.daily
    }

    fn reset_daily_if_needed(&mut self, today: NaiveDate) {
        if self.daily.date != today {
            debug!("daily pnl reset: {} -> {}", self.daily.date, today);
            self.daily = DailyPnl::new(today);
        }
    }

    /// Gate a buy signal. Checks run in fixed precedence; the first
    /// failing rule decides the reason.
    pub fn check_buy(
        &mut self,
        signal: &Signal,
        portfolio: &Portfolio,
        buy_amount: f64,
    ) -> RiskCheck {
        self.check_buy_on(Utc::now().date_naive(), signal, portfolio, buy_amount)
    }

    pub fn check_buy_on(
        &mut self,
        today: NaiveDate,
        signal: &Signal,
        portfolio: &Portfolio,
        buy_amount: f64,
    ) -> RiskCheck {
        self.reset_daily_if_needed(today);

        if signal.signal_type != SignalType::Buy {
            return RiskCheck::block("Not a BUY signal".into());
        }

        if portfolio.open_position_count() >= self.config.max_positions {
            return RiskCheck::block(format!(
                "Max positions reached ({})",
                self.config.max_positions
            ));
        }

        if portfolio.quote_balance < buy_amount {
            return RiskCheck::block(format!(
                "Insufficient balance: {} < {}",
                portfolio.quote_balance, buy_amount
            ));
        }

        let daily_loss_pct = self.daily.realized_pnl / self.initial_balance * 100.0;
        if daily_loss_pct <= self.config.max_daily_loss_pct {
            return RiskCheck::block(format!("Daily loss limit hit: {daily_loss_pct:.2}%"));
        }

        if portfolio.total_trades > 0 {
            let return_pct = portfolio.total_profit / self.initial_balance * 100.0;
            if return_pct <= self.config.max_drawdown_pct {
                return RiskCheck::block(format!("Max drawdown hit: {return_pct:.2}%"));
            }
        }

        if let Some(position) = portfolio.positions.get(&signal.ticker) {
            if position.is_open() {
                return RiskCheck::block(format!(
                    "Already have open position in {}",
                    signal.ticker
                ));
            }
        }

        RiskCheck::allow()
    }

    /// Validate a sell signal against the current position map.
    pub fn check_sell(&self, signal: &Signal, portfolio: &Portfolio) -> RiskCheck {
        if signal.signal_type != SignalType::Sell {
            return RiskCheck::block("Not a SELL signal".into());
        }

        let Some(position) = portfolio.positions.get(&signal.ticker) else {
            return RiskCheck::block(format!("No position in {}", signal.ticker));
        };
        if !position.is_open() {
            return RiskCheck::block(format!("Position in {} is not open", signal.ticker));
        }

        RiskCheck::allow()
    }

    /// Stop-loss: triggers once the move from entry reaches
    /// `stop_loss_pct` (inclusive, `stop_loss_pct` negative).
    pub fn check_stop_loss(&self, position: &Position, current_price: f64) -> RiskCheck {
        if !position.is_open() {
            return RiskCheck::block("Position not open".into());
        }

        let change_pct = (current_price - position.entry_price) / position.entry_price * 100.0;
        if change_pct <= self.config.stop_loss_pct {
            return RiskCheck::allow_because(format!(
                "Stop-loss triggered: {change_pct:.2}% <= {}%",
                self.config.stop_loss_pct
            ));
        }
        RiskCheck::block(String::new())
    }

    /// Take-profit: triggers once the move from entry reaches
    /// `take_profit_pct` (inclusive).
    pub fn check_take_profit(&self, position: &Position, current_price: f64) -> RiskCheck {
        if !position.is_open() {
            return RiskCheck::block("Position not open".into());
        }

        let change_pct = (current_price - position.entry_price) / position.entry_price * 100.0;
        if change_pct >= self.config.take_profit_pct {
            return RiskCheck::allow_because(format!(
                "Take-profit triggered: {change_pct:.2}% >= {}%",
                self.config.take_profit_pct
            ));
        }
        RiskCheck::block(String::new())
    }

    /// Trailing stop: measured from the highest price seen since entry,
    /// not from entry itself. A new high never triggers.
    pub fn check_trailing_stop(&self, position: &Position, current_price: f64) -> RiskCheck {
        if !position.is_open() {
            return RiskCheck::block("Position not open".into());
        }

        let highest = position.highest_price;
        if current_price > highest {
            return RiskCheck::block("New high, no trailing stop".into());
        }

        let drop_from_high = (highest - current_price) / highest * 100.0;
        if drop_from_high >= self.config.trailing_stop_pct {
            return RiskCheck::allow_because(format!(
                "Trailing stop: dropped {drop_from_high:.2}% from high >= {}%",
                self.config.trailing_stop_pct
            ));
        }
        RiskCheck::block(String::new())
    }

    /// Record realized P&L into the daily aggregate.
    pub fn record_trade_pnl(&mut self, pnl: f64) {
        self.record_trade_pnl_on(Utc::now().date_naive(), pnl);
    }

    pub fn record_trade_pnl_on(&mut self, today: NaiveDate, pnl: f64) {
        self.reset_daily_if_needed(today);
        self.daily.realized_pnl += pnl;
        self.daily.trades_today += 1;
    }
}
