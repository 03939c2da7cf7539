//! Fear & Greed strategy: contrarian trades on the sentiment index.

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::{Signal, SignalType};

use super::{Strategy, StrategyParams};

/// Buys extreme fear, sells extreme greed. The index runs 0 (extreme
/// fear) to 100 (extreme greed) and is supplied by a sentiment feed
/// collaborator; no index, no opinion.
#[derive(Debug, Clone)]
pub struct FearGreed {
    buy_threshold: i64,
    sell_threshold: i64,
    name: String,
}

impl FearGreed {
    pub fn new(buy_threshold: i64, sell_threshold: i64) -> Self {
        let name = format!("fear_greed_{buy_threshold}_{sell_threshold}");
        FearGreed {
            buy_threshold,
            sell_threshold,
            name,
        }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        FearGreed::new(
            params.get_i64("buy_threshold", 25),
            params.get_i64("sell_threshold", 75),
        )
    }
}

impl Strategy for FearGreed {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &'static str {
        "fear_greed"
    }

    fn evaluate(
        &self,
        ticker: &str,
        market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        let Some(fg) = market.fear_greed_value else {
            return Ok(None);
        };

        if market.has_position && fg >= self.sell_threshold {
            let strength = ((fg - self.sell_threshold) as f64 / 25.0).clamp(0.3, 1.0);
            let signal = Signal::new(
                &self.name,
                ticker,
                SignalType::Sell,
                strength,
                format!("Extreme Greed: F&G={fg} >= {}", self.sell_threshold),
            )?;
            return Ok(Some(signal));
        }

        if !market.has_position && fg <= self.buy_threshold {
            let strength = ((self.buy_threshold - fg) as f64 / 25.0).clamp(0.3, 1.0);
            let signal = Signal::new(
                &self.name,
                ticker,
                SignalType::Buy,
                strength,
                format!("Extreme Fear: F&G={fg} <= {}", self.buy_threshold),
            )?;
            return Ok(Some(signal));
        }

        Ok(None)
    }
}
