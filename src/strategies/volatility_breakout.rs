//! Volatility breakout strategy, Larry Williams style.

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::{Signal, SignalType};

use super::{Strategy, StrategyParams};

/// Buys when price breaks above `open + k * (prev_high - prev_low)`.
/// Entry only; exits are left to the risk rules.
#[derive(Debug, Clone)]
pub struct VolatilityBreakout {
    k_factor: f64,
    name: String,
}

impl VolatilityBreakout {
    pub fn new(k_factor: f64) -> Self {
        let name = format!("volatility_breakout_{}", (k_factor * 10.0) as i64);
        VolatilityBreakout { k_factor, name }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        VolatilityBreakout::new(params.get_f64("k_factor", 0.5))
    }
}

impl Strategy for VolatilityBreakout {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &'static str {
        "volatility_breakout"
    }

    fn evaluate(
        &self,
        ticker: &str,
        market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        let current = market.current_price;
        let (Some(prev_high), Some(prev_low)) = (market.prev_high, market.prev_low) else {
            return Ok(None);
        };
        if current <= 0.0 {
            return Ok(None);
        }

        let range = prev_high - prev_low;
        if range <= 0.0 {
            return Ok(None);
        }

        let target = match market.open_price.filter(|o| *o > 0.0) {
            Some(open) => open + self.k_factor * range,
            None => return Ok(None),
        };

        if !market.has_position && current > target {
            let strength = (((current - target) / range).min(1.0)).max(0.1);
            let signal = Signal::new(
                &self.name,
                ticker,
                SignalType::Buy,
                strength,
                format!("Breakout: {current:.0} > target {target:.0}"),
            )?;
            return Ok(Some(signal));
        }

        Ok(None)
    }
}
