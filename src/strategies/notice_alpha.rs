//! Notice-alpha strategy: trade exchange announcements.

use crate::domain::error::CoinTraderError;
use crate::domain::market::MarketView;
use crate::domain::signal::{Signal, SignalType};

use super::{Strategy, StrategyParams};

// 신규 (new), 상장 (listing), 에어드롭 (airdrop).
const DEFAULT_KEYWORDS: [&str; 3] = ["신규", "상장", "에어드롭"];
const LISTING_KEYWORDS: [&str; 2] = ["신규", "상장"];

/// Buys coins mentioned in bullish exchange notices. The notice feed
/// collaborator pre-matches titles against the keyword subscription;
/// listings get a stronger signal than other matches. Entry only.
#[derive(Debug, Clone)]
pub struct NoticeAlpha {
    keywords: Vec<String>,
}

impl NoticeAlpha {
    pub fn new(keywords: Vec<String>) -> Self {
        NoticeAlpha { keywords }
    }

    pub fn from_params(params: &StrategyParams) -> Self {
        let keywords = params
            .get_list("keywords")
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect());
        NoticeAlpha::new(keywords)
    }
}

impl Strategy for NoticeAlpha {
    fn name(&self) -> &str {
        "notice_alpha"
    }

    fn template(&self) -> &'static str {
        "notice_alpha"
    }

    fn evaluate(
        &self,
        ticker: &str,
        market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        if market.notices.is_empty() || market.has_position {
            return Ok(None);
        }

        for notice in &market.notices {
            if !notice.tickers.iter().any(|t| t == ticker) {
                continue;
            }
            let matched: Vec<&String> = notice
                .matched_keywords
                .iter()
                .filter(|kw| self.keywords.contains(*kw))
                .collect();
            if matched.is_empty() {
                continue;
            }

            let is_listing = matched
                .iter()
                .any(|kw| LISTING_KEYWORDS.contains(&kw.as_str()));
            let strength = if is_listing { 0.9 } else { 0.6 };
            let title: String = notice.title.chars().take(50).collect();
            let signal = Signal::new(
                "notice_alpha",
                ticker,
                SignalType::Buy,
                strength,
                format!("Notice: {title}"),
            )?
            .with_param("notice_id", notice.id as f64);
            return Ok(Some(signal));
        }

        Ok(None)
    }
}
