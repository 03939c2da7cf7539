//! Strategy contract and template registry.
//!
//! Strategies are pure evaluators: given a ticker and a market snapshot
//! they return at most one [`Signal`], deterministically for a fixed
//! parameter set. Registration is an explicit template table with no
//! global state; the resolved list is handed to the engine by construction.

pub mod dip_buy;
pub mod momentum;
pub mod fear_greed;
pub mod volatility_breakout;
pub mod volume_surge;
pub mod notice_alpha;

use log::debug;
use std::collections::BTreeMap;

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::Signal;
use crate::ports::config_port::ConfigPort;

use dip_buy::DipBuy;
use fear_greed::FearGreed;
use momentum::Momentum;
use notice_alpha::NoticeAlpha;
use volatility_breakout::VolatilityBreakout;
use volume_surge::VolumeSurge;

/// Contract for all trading strategies. Evaluation must be synchronous,
/// side-effect free, and bounded by the configured lookback window.
pub trait Strategy {
    /// Unique instance name, derived from the template and parameters.
    fn name(&self) -> &str;

    /// Template discriminator (e.g. `"dip_buy"`).
    fn template(&self) -> &'static str;

    fn evaluate(
        &self,
        ticker: &str,
        market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError>;
}

/// Raw strategy parameters as read from configuration, with typed access
/// and per-key defaults.
#[derive(Debug, Clone, Default)]
pub struct StrategyParams {
    values: BTreeMap<String, String>,
}

impl StrategyParams {
    pub fn new() -> Self {
        StrategyParams::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.values
            .get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.values
            .get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Comma-separated list value.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.values.get(key).map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

/// Known strategy templates, in registration order.
pub fn templates() -> &'static [&'static str] {
    &[
        "dip_buy",
        "momentum",
        "fear_greed",
        "volatility_breakout",
        "volume_surge",
        "notice_alpha",
    ]
}

/// Instantiate a strategy from its template name. The explicit match is
/// the registration table.
pub fn create_strategy(
    template: &str,
    params: &StrategyParams,
) -> Result<Box<dyn Strategy>, CoinTraderError> {
    match template {
        "dip_buy" => Ok(Box::new(DipBuy::from_params(params))),
        "momentum" => Ok(Box::new(Momentum::from_params(params))),
        "fear_greed" => Ok(Box::new(FearGreed::from_params(params))),
        "volatility_breakout" => Ok(Box::new(VolatilityBreakout::from_params(params))),
        "volume_surge" => Ok(Box::new(VolumeSurge::from_params(params))),
        "notice_alpha" => Ok(Box::new(NoticeAlpha::from_params(params))),
        other => Err(CoinTraderError::UnknownTemplate {
            template: other.to_string(),
        }),
    }
}

/// Build the enabled strategy list from `[strategy:<template>]` config
/// sections. Registration order follows the template table, so evaluation
/// order is deterministic regardless of file layout.
pub fn build_strategies(
    config: &dyn ConfigPort,
) -> Result<Vec<Box<dyn Strategy>>, CoinTraderError> {
    let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();

    for template in templates() {
        let section = format!("strategy:{template}");
        if !config.get_bool(&section, "enabled", false) {
            continue;
        }

        let mut params = StrategyParams::new();
        for key in config.keys(&section) {
            if key == "enabled" {
                continue;
            }
            if let Some(value) = config.get_string(&section, &key) {
                params.insert(&key, &value);
            }
        }

        let strategy = create_strategy(template, &params)?;
        debug!("registered strategy {}", strategy.name());
        strategies.push(strategy);
    }

    Ok(strategies)
}

/// Last `n` points of a history window.
pub(crate) fn tail(history: &[f64], n: usize) -> &[f64] {
    let skip = history.len().saturating_sub(n);
    &history[skip..]
}
