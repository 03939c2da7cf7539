//! Position tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// The holding in one ticker. Created open on a successful buy, mutated in
/// place only for `highest_price` tracking while open, transitioned to
/// closed on a successful sell. Never deleted; a later buy on the same
/// ticker supersedes the closed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub strategy_name: String,
    pub ticker: String,
    pub status: PositionStatus,
    pub entry_price: f64,
    pub quantity: f64,
    pub entry_time: DateTime<Utc>,
    /// Highest price seen while open; non-decreasing. Drives the trailing
    /// stop.
    pub highest_price: f64,
    pub exit_price: Option<f64>,
    pub exit_time: Option<DateTime<Utc>>,
    pub profit: Option<f64>,
    pub profit_pct: Option<f64>,
}

impl Position {
    pub fn open(strategy_name: &str, ticker: &str, entry_price: f64, quantity: f64) -> Self {
        Position {
            id: Uuid::new_v4(),
            strategy_name: strategy_name.to_string(),
            ticker: ticker.to_string(),
            status: PositionStatus::Open,
            entry_price,
            quantity,
            entry_time: Utc::now(),
            highest_price: entry_price,
            exit_price: None,
            exit_time: None,
            profit: None,
            profit_pct: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Raw cost basis: quantity at entry price, before the entry fee.
    pub fn cost(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    pub(crate) fn close(&mut self, exit_price: f64, profit: f64, profit_pct: f64) {
        self.status = PositionStatus::Closed;
        self.exit_price = Some(exit_price);
        self.exit_time = Some(Utc::now());
        self.profit = Some(profit);
        self.profit_pct = Some(profit_pct);
    }
}
