//! Portfolio state and the manager that mutates it.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::position::Position;
use super::trade::{Side, Trade};

/// Account state for one trading session: quote-currency cash, one
/// position slot per ticker, and realized-trade counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub quote_balance: f64,
    pub positions: HashMap<String, Position>,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub total_profit: f64,
}

impl Portfolio {
    pub fn new(initial_balance: f64) -> Self {
        Portfolio {
            quote_balance: initial_balance,
            positions: HashMap::new(),
            total_trades: 0,
            winning_trades: 0,
            total_profit: 0.0,
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.total_trades as f64
        }
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.values().filter(|p| p.is_open()).count()
    }

    /// Value of open positions at the supplied prices, falling back to the
    /// entry price for tickers with no quote.
    pub fn position_value(&self, prices: &HashMap<String, f64>) -> f64 {
        self.positions
            .values()
            .filter(|p| p.is_open())
            .map(|p| p.market_value(prices.get(&p.ticker).copied().unwrap_or(p.entry_price)))
            .sum()
    }

    pub fn total_value(&self, prices: &HashMap<String, f64>) -> f64 {
        self.quote_balance + self.position_value(prices)
    }
}

/// The only component permitted to mutate [`Portfolio`] state.
///
/// `fee_rate` is configured as a percentage (0.05 meaning 0.05%) and held
/// internally as a fraction.
#[derive(Debug, Clone)]
pub struct PortfolioManager {
    pub portfolio: Portfolio,
    fee_rate: f64,
}

impl PortfolioManager {
    pub fn new(portfolio: Portfolio, fee_rate_pct: f64) -> Self {
        PortfolioManager {
            portfolio,
            fee_rate: fee_rate_pct / 100.0,
        }
    }

    /// Execute a buy for a fixed quote amount. Returns `None` without any
    /// mutation when the balance cannot cover the full amount.
    ///
    /// The full `quote_amount` leaves the balance; the fee is taken out of
    /// it before conversion, so `quantity = (quote_amount - fee) / price`.
    pub fn execute_buy(
        &mut self,
        strategy_name: &str,
        ticker: &str,
        price: f64,
        quote_amount: f64,
        reason: &str,
    ) -> Option<Trade> {
        if self.portfolio.quote_balance < quote_amount {
            warn!(
                "buy rejected for {ticker}: balance {} < {}",
                self.portfolio.quote_balance, quote_amount
            );
            return None;
        }

        let fee = quote_amount * self.fee_rate;
        let net_amount = quote_amount - fee;
        let quantity = net_amount / price;

        self.portfolio.quote_balance -= quote_amount;
        debug_assert!(self.portfolio.quote_balance >= 0.0);

        // A closed position in this slot is superseded; durability of the
        // closed record is the persistence collaborator's concern.
        self.portfolio.positions.insert(
            ticker.to_string(),
            Position::open(strategy_name, ticker, price, quantity),
        );

        info!("buy {ticker}: {quantity} @ {price} (fee {fee})");
        Some(Trade {
            id: Uuid::new_v4(),
            strategy_name: strategy_name.to_string(),
            ticker: ticker.to_string(),
            side: Side::Buy,
            price,
            quantity,
            total_quote: quote_amount,
            fee,
            reason: reason.to_string(),
            profit: None,
            profit_pct: None,
            timestamp: chrono::Utc::now(),
        })
    }

    /// Execute a sell of the full open position. Returns `None` when there
    /// is no open position for the ticker.
    ///
    /// The cost basis reconstructs the entry fee, which was not recorded
    /// separately: quantity came from `(amount - buy_fee) / entry_price`,
    /// so `buy_fee = quantity * entry_price * fee_rate / (1 - fee_rate)`.
    pub fn execute_sell(
        &mut self,
        strategy_name: &str,
        ticker: &str,
        price: f64,
        reason: &str,
    ) -> Option<Trade> {
        let Some(position) = self.portfolio.positions.get_mut(ticker) else {
            warn!("sell rejected for {ticker}: no position");
            return None;
        };
        if !position.is_open() {
            return None;
        }

        let quantity = position.quantity;
        let gross = quantity * price;
        let fee = gross * self.fee_rate;
        let net = gross - fee;

        let raw_cost = position.cost();
        let buy_fee = raw_cost * self.fee_rate / (1.0 - self.fee_rate);
        let cost = raw_cost + buy_fee;
        let profit = net - cost;
        let profit_pct = if cost > 0.0 { profit / cost * 100.0 } else { 0.0 };

        position.close(price, profit, profit_pct);

        self.portfolio.quote_balance += net;
        debug_assert!(self.portfolio.quote_balance >= 0.0);
        self.portfolio.total_trades += 1;
        self.portfolio.total_profit += profit;
        if profit > 0.0 {
            self.portfolio.winning_trades += 1;
        }

        info!("sell {ticker}: {quantity} @ {price} (profit {profit:.2}, {profit_pct:.2}%)");
        Some(Trade {
            id: Uuid::new_v4(),
            strategy_name: strategy_name.to_string(),
            ticker: ticker.to_string(),
            side: Side::Sell,
            price,
            quantity,
            total_quote: net,
            fee,
            reason: reason.to_string(),
            profit: Some(profit),
            profit_pct: Some(profit_pct),
            timestamp: chrono::Utc::now(),
        })
    }

    /// Track the running high for trailing-stop purposes. No-op unless the
    /// ticker has an open position and `price` exceeds the stored high.
    pub fn update_highest_price(&mut self, ticker: &str, price: f64) {
        if let Some(position) = self.portfolio.positions.get_mut(ticker) {
            if position.is_open() && price > position.highest_price {
                position.highest_price = price;
            }
        }
    }

    pub fn open_position(&self, ticker: &str) -> Option<&Position> {
        self.portfolio
            .positions
            .get(ticker)
            .filter(|p| p.is_open())
    }

    pub fn get_open_positions(&self) -> HashMap<&str, &Position> {
        self.portfolio
            .positions
            .iter()
            .filter(|(_, p)| p.is_open())
            .map(|(t, p)| (t.as_str(), p))
            .collect()
    }
}
