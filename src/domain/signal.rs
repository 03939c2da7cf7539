//! Trading signals emitted by strategies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::CoinTraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Buy,
    Sell,
}

/// A strategy's recommendation for one ticker, produced fresh per
/// evaluation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy_name: String,
    pub ticker: String,
    pub signal_type: SignalType,
    /// Confidence in [0, 1], enforced at construction.
    pub strength: f64,
    pub reason: String,
    /// Strategy-specific diagnostics (thresholds, observed percentages).
    pub params: BTreeMap<String, f64>,
}

impl Signal {
    pub fn new(
        strategy_name: &str,
        ticker: &str,
        signal_type: SignalType,
        strength: f64,
        reason: String,
    ) -> Result<Self, CoinTraderError> {
        if !(0.0..=1.0).contains(&strength) {
            return Err(CoinTraderError::Validation {
                reason: format!("signal strength {strength} outside [0, 1]"),
            });
        }
        Ok(Signal {
            strategy_name: strategy_name.to_string(),
            ticker: ticker.to_string(),
            signal_type,
            strength,
            reason,
            params: BTreeMap::new(),
        })
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }
}
