//! Market data structures fed into strategy evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An exchange announcement, pre-matched against subscription keywords by
/// the notice feed collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    pub tickers: Vec<String>,
    pub matched_keywords: Vec<String>,
}

/// One price/market update for a single ticker.
///
/// Everything beyond `ticker` and `price` is optional and supplied by
/// external collaborators; `price_history` and `volume_history` are
/// ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub ticker: String,
    pub price: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub volume: Option<f64>,
    pub change_pct: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub open_price: Option<f64>,
    pub prev_high: Option<f64>,
    pub prev_low: Option<f64>,
    pub fear_greed_value: Option<i64>,
    pub price_history: Vec<f64>,
    pub volume_history: Vec<f64>,
    pub notices: Vec<Notice>,
}

impl Tick {
    pub fn new(ticker: &str, price: f64) -> Self {
        Tick {
            ticker: ticker.to_string(),
            price,
            timestamp: None,
            volume: None,
            change_pct: None,
            high_price: None,
            low_price: None,
            open_price: None,
            prev_high: None,
            prev_low: None,
            fear_greed_value: None,
            price_history: Vec::new(),
            volume_history: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn with_history(mut self, price_history: Vec<f64>) -> Self {
        self.price_history = price_history;
        self
    }

    /// A tick is processable when it names a ticker and carries a finite,
    /// positive price.
    pub fn is_valid(&self) -> bool {
        !self.ticker.is_empty() && self.price.is_finite() && self.price > 0.0
    }
}

/// The market snapshot a strategy evaluates against: the tick fields plus
/// the engine's view of the current position in that ticker. Strategies
/// read only the fields they declare an interest in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketView {
    pub current_price: f64,
    pub volume: Option<f64>,
    pub change_pct: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub open_price: Option<f64>,
    pub prev_high: Option<f64>,
    pub prev_low: Option<f64>,
    pub fear_greed_value: Option<i64>,
    pub has_position: bool,
    pub entry_price: Option<f64>,
    pub price_history: Vec<f64>,
    pub volume_history: Vec<f64>,
    pub notices: Vec<Notice>,
}

impl MarketView {
    pub fn from_tick(tick: &Tick, has_position: bool, entry_price: Option<f64>) -> Self {
        MarketView {
            current_price: tick.price,
            volume: tick.volume,
            change_pct: tick.change_pct,
            high_price: tick.high_price,
            low_price: tick.low_price,
            open_price: tick.open_price,
            prev_high: tick.prev_high,
            prev_low: tick.prev_low,
            fear_greed_value: tick.fear_greed_value,
            has_position,
            entry_price,
            price_history: tick.price_history.clone(),
            volume_history: tick.volume_history.clone(),
            notices: tick.notices.clone(),
        }
    }
}
