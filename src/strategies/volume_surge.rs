//! Volume surge strategy: unusual volume with positive price action.

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::{Signal, SignalType};

use super::{tail, Strategy, StrategyParams};

/// Buys when current volume runs at least `volume_multiplier` times the
/// average over the lookback window while price change is positive.
/// Entry only; exits are left to the risk rules.
#[derive(Debug, Clone)]
pub struct VolumeSurge {
    lookback_hours: usize,
    volume_multiplier: f64,
    name: String,
}

impl VolumeSurge {
    pub fn new(lookback_hours: usize, volume_multiplier: f64) -> Self {
        let name = format!(
            "volume_surge_{}_{}",
            lookback_hours, volume_multiplier as i64
        );
        VolumeSurge {
            lookback_hours,
            volume_multiplier,
            name,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        VolumeSurge::new(
            params.get_usize("lookback_hours", 24),
            params.get_f64("volume_multiplier", 3.0),
        )
    }
}

impl Strategy for VolumeSurge {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &'static str {
        "volume_surge"
    }

    fn evaluate(
        &self,
        ticker: &str,
        market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        let Some(volume) = market.volume.filter(|v| *v > 0.0) else {
            return Ok(None);
        };
        if market.volume_history.is_empty() {
            return Ok(None);
        }

        let history = tail(&market.volume_history, self.lookback_hours);
        if history.len() < 2 {
            return Ok(None);
        }

        let avg_volume = history.iter().sum::<f64>() / history.len() as f64;
        if avg_volume <= 0.0 {
            return Ok(None);
        }

        let volume_ratio = volume / avg_volume;
        let change_pct = market.change_pct.unwrap_or(0.0);

        if !market.has_position && volume_ratio >= self.volume_multiplier && change_pct > 0.0 {
            let strength = (volume_ratio / (self.volume_multiplier * 2.0)).min(1.0);
            let signal = Signal::new(
                &self.name,
                ticker,
                SignalType::Buy,
                strength,
                format!("Volume surge {volume_ratio:.1}x avg, price +{change_pct:.1}%"),
            )?;
            return Ok(Some(signal));
        }

        Ok(None)
    }
}
