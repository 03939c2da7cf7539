//! Dip-buy strategy: buy a sharp drop, sell the recovery.

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::{Signal, SignalType};

use super::{tail, Strategy, StrategyParams};

/// Buys when price has fallen at least `drop_pct` over the last
/// `timeframe_hours`, sells once price recovers `recovery_pct` from entry.
#[derive(Debug, Clone)]
pub struct DipBuy {
    drop_pct: f64,
    recovery_pct: f64,
    timeframe_hours: usize,
    name: String,
}

impl DipBuy {
    pub fn new(drop_pct: f64, recovery_pct: f64, timeframe_hours: usize) -> Self {
        let name = format!(
            "dip_buy_{}_{}_{}",
            drop_pct as i64, recovery_pct as i64, timeframe_hours
        );
        DipBuy {
            drop_pct,
            recovery_pct,
            timeframe_hours,
            name,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        DipBuy::new(
            params.get_f64("drop_pct", -7.0),
            params.get_f64("recovery_pct", 2.0),
            params.get_usize("timeframe_hours", 24),
        )
    }
}

impl Strategy for DipBuy {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &'static str {
        "dip_buy"
    }

    fn evaluate(
        &self,
        ticker: &str,
        market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        let current = market.current_price;
        if market.price_history.is_empty() || current <= 0.0 {
            return Ok(None);
        }

        let history = tail(&market.price_history, self.timeframe_hours + 1);
        if history.len() < 2 {
            return Ok(None);
        }

        let start = history[0];
        let change_pct = (current / start - 1.0) * 100.0;

        if market.has_position {
            if let Some(entry) = market.entry_price.filter(|e| *e > 0.0) {
                let profit_pct = (current / entry - 1.0) * 100.0;
                if profit_pct >= self.recovery_pct {
                    let signal = Signal::new(
                        &self.name,
                        ticker,
                        SignalType::Sell,
                        (profit_pct / (self.recovery_pct * 2.0)).min(1.0),
                        format!("Recovery {profit_pct:.1}% >= {}%", self.recovery_pct),
                    )?
                    .with_param("change_pct", change_pct)
                    .with_param("profit_pct", profit_pct)
                    .with_param("entry_price", entry);
                    return Ok(Some(signal));
                }
            }
            return Ok(None);
        }

        if change_pct <= self.drop_pct {
            let strength = (change_pct.abs() / (self.drop_pct * 2.0).abs()).min(1.0);
            let signal = Signal::new(
                &self.name,
                ticker,
                SignalType::Buy,
                strength,
                format!("Dip {change_pct:.1}% <= {}%", self.drop_pct),
            )?
            .with_param("change_pct", change_pct)
            .with_param("start_price", start)
            .with_param("current_price", current);
            return Ok(Some(signal));
        }

        Ok(None)
    }
}
