//! Executed trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Append-only record of an executed order. Never mutated after creation;
/// handed read-only to persistence and reporting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub strategy_name: String,
    pub ticker: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    /// Quote currency moved by this trade: the full amount spent on a buy,
    /// the net proceeds received on a sell.
    pub total_quote: f64,
    pub fee: f64,
    pub reason: String,
    /// Realized profit, sells only. Accounts for fees on both legs.
    pub profit: Option<f64>,
    pub profit_pct: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_trade_fields() {
        let trade = Trade {
            id: Uuid::new_v4(),
            strategy_name: "dip_buy".into(),
            ticker: "KRW-BTC".into(),
            side: Side::Buy,
            price: 50_000_000.0,
            quantity: 0.002,
            total_quote: 100_000.0,
            fee: 50.0,
            reason: "Dip buy triggered".into(),
            profit: None,
            profit_pct: None,
            timestamp: Utc::now(),
        };
        assert_eq!(trade.side, Side::Buy);
        assert!((trade.total_quote - 100_000.0).abs() < f64::EPSILON);
        assert!(trade.profit.is_none());
    }

    #[test]
    fn sell_trade_with_profit() {
        let trade = Trade {
            id: Uuid::new_v4(),
            strategy_name: "dip_buy".into(),
            ticker: "KRW-BTC".into(),
            side: Side::Sell,
            price: 52_000_000.0,
            quantity: 0.002,
            total_quote: 104_000.0,
            fee: 52.0,
            reason: "Recovery +4%".into(),
            profit: Some(3_948.0),
            profit_pct: Some(3.95),
            timestamp: Utc::now(),
        };
        assert_eq!(trade.profit, Some(3_948.0));
        assert_eq!(trade.profit_pct, Some(3.95));
    }

    #[test]
    fn ids_are_unique() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(a, b);
    }
}
