// Shared price series for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use crate::market_data::{PriceBar, PriceSource};

const BASE: f64 = 1.1;
const SPREAD: f64 = 0.0005;

/// One-minute bars with `high/low = close ± spread`.
pub fn bars_from_closes(closes: &[f64], spread: f64) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap();
            PriceBar::new(ts, c, c + spread, c - spread, c)
        })
        .collect()
}

fn wiggle(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i % 2 == 1 { BASE + 0.0001 } else { BASE - 0.0001 })
        .collect()
}

/// `n` bars oscillating ±1 pip around 1.1000; never signals.
pub fn flat_bars(n: usize) -> Vec<PriceBar> {
    bars_from_closes(&wiggle(n), SPREAD)
}

fn rising_closes() -> Vec<f64> {
    let mut closes = wiggle(29);
    let mut last = *closes.last().unwrap();
    for j in 0..15 {
        last += if j % 3 == 2 { -0.0005 } else { 0.002 };
        closes.push(last);
    }
    closes
}

/// 29 flat bars followed by a 15-bar rally with shallow pullbacks.
/// Every prefix of 30+ bars classifies as BUY.
pub fn rising_bars() -> Vec<PriceBar> {
    bars_from_closes(&rising_closes(), SPREAD)
}

/// Mirror image of [`rising_bars`]; classifies as SELL.
pub fn falling_bars() -> Vec<PriceBar> {
    let closes: Vec<f64> = rising_closes().into_iter().map(|c| 2.0 * BASE - c).collect();
    bars_from_closes(&closes, SPREAD)
}

/// Price source serving fixed series per upstream symbol; unknown symbols
/// fail like an unreachable upstream.
pub struct StaticPrices {
    series: Mutex<HashMap<String, Vec<PriceBar>>>,
}

impl StaticPrices {
    pub fn new(series: &[(&str, Vec<PriceBar>)]) -> Arc<Self> {
        let map = series
            .iter()
            .map(|(s, bars)| (s.to_string(), bars.clone()))
            .collect();
        Arc::new(Self {
            series: Mutex::new(map),
        })
    }

    pub fn set(&self, symbol: &str, bars: Vec<PriceBar>) {
        self.series.lock().insert(symbol.to_string(), bars);
    }
}

#[async_trait]
impl PriceSource for StaticPrices {
    async fn fetch_bars(&self, symbol: &str, _interval: &str, _range: &str) -> anyhow::Result<Vec<PriceBar>> {
        self.series
            .lock()
            .get(symbol)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("connection refused"))
    }
}
