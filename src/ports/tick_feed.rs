//! Tick source port trait.

use crate::domain::error::CoinTraderError;
use crate::domain::market::Tick;

/// A source of market ticks, fully materialized before the engine runs.
/// Implementations must return ticks in non-decreasing timestamp order
/// per ticker.
pub trait TickFeed {
    fn fetch_ticks(&self) -> Result<Vec<Tick>, CoinTraderError>;
}
