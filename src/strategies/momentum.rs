//! Momentum strategy: trend-following on recent price movement.

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::{Signal, SignalType};

use super::{tail, Strategy, StrategyParams};

/// Buys strong upward momentum over the lookback window, exits once the
/// move reverses past `exit_threshold` from entry.
#[derive(Debug, Clone)]
pub struct Momentum {
    lookback_hours: usize,
    entry_threshold: f64,
    exit_threshold: f64,
    name: String,
}

impl Momentum {
    pub fn new(lookback_hours: usize, entry_threshold: f64, exit_threshold: f64) -> Self {
        let name = format!(
            "momentum_{}_{}_{}",
            lookback_hours, entry_threshold as i64, exit_threshold as i64
        );
        Momentum {
            lookback_hours,
            entry_threshold,
            exit_threshold,
            name,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        Momentum::new(
            params.get_usize("lookback_hours", 12),
            params.get_f64("entry_threshold", 5.0),
            params.get_f64("exit_threshold", -3.0),
        )
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &'static str {
        "momentum"
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

        let history = tail(&market.price_history, self.lookback_hours + 1);
        if history.len() < 2 {
            return Ok(None);
        }

        let start = history[0];
        let change_pct = (current / start - 1.0) * 100.0;

        if market.has_position {
            if let Some(entry) = market.entry_price.filter(|e| *e > 0.0) {
                let profit_pct = (current / entry - 1.0) * 100.0;
                if profit_pct <= self.exit_threshold {
                    let signal = Signal::new(
                        &self.name,
                        ticker,
                        SignalType::Sell,
                        (profit_pct.abs() / 10.0).min(1.0),
                        format!(
                            "Momentum reversal {profit_pct:.1}% <= {}%",
                            self.exit_threshold
                        ),
                    )?;
                    return Ok(Some(signal));
                }
            }
            return Ok(None);
        }

        if change_pct >= self.entry_threshold {
            let signal = Signal::new(
                &self.name,
                ticker,
                SignalType::Buy,
                (change_pct / (self.entry_threshold * 2.0)).min(1.0),
                format!("Momentum {change_pct:.1}% >= {}%", self.entry_threshold),
            )?;
            return Ok(Some(signal));
        }

        Ok(None)
    }
}
