// =============================================================================
// Market Data — price bars and the upstream price source seam
// =============================================================================

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use yahoo::YahooClient;

/// A single OHLC bar. Sequences are oldest-first with strictly increasing
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }
}

/// Anything that can hand back recent bars for an upstream symbol.
///
/// A short or empty result is legal; callers treat it as insufficient data.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch bars of `interval` width covering the most recent `range`
    /// (e.g. `"1m"` bars over `"1d"`).
    async fn fetch_bars(&self, symbol: &str, interval: &str, range: &str) -> Result<Vec<PriceBar>>;
}
