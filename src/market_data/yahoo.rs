// =============================================================================
// Yahoo Finance chart client — public v8 chart endpoint
// =============================================================================
//
// Unauthenticated, so there is no signing. One GET per query, no retry; a
// failure simply means "no signal" for that call.
//
// Response shape (abridged):
//   { "chart": { "result": [ { "timestamp": [..],
//                              "indicators": { "quote": [ { "open": [..],
//                                "high": [..], "low": [..], "close": [..] } ] } } ],
//                "error": null } }
//
// Rows with any missing OHLC value are dropped.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{PriceBar, PriceSource};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Price source backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    /// Build a client against `base_url` (e.g. `https://query1.finance.yahoo.com`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) fx-signal-desk")
            .build()
            .context("failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    fn chart_url(&self, symbol: &str, interval: &str, range: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval={}&range={}",
            self.base_url, symbol, interval, range
        )
    }

    /// Turn a decoded chart response into ordered bars.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceBar>> {
        if let Some(err) = resp.chart.error {
            anyhow::bail!("chart API error for {symbol}: {}: {}", err.code, err.description);
        }

        let data = resp
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .with_context(|| format!("chart response for {symbol} has no result"))?;

        // A closed market returns a result without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let cell = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
            let (Some(open), Some(high), Some(low), Some(close)) = (
                cell(&quote.open),
                cell(&quote.high),
                cell(&quote.low),
                cell(&quote.close),
            ) else {
                continue;
            };

            let Some(timestamp) = DateTime::from_timestamp(ts, 0) else {
                warn!(symbol, ts, "skipping bar with invalid timestamp");
                continue;
            };

            // The live minute is sometimes repeated at the tail; keep the newest.
            if let Some(last) = bars.last() {
                if timestamp <= last.timestamp {
                    bars.pop();
                }
            }
            bars.push(PriceBar::new(timestamp, open, high, low, close));
        }

        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    #[instrument(skip(self), name = "yahoo::fetch_bars")]
    async fn fetch_bars(&self, symbol: &str, interval: &str, range: &str) -> Result<Vec<PriceBar>> {
        let url = self.chart_url(symbol, interval, range);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET chart for {symbol} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("chart API returned {status} for {symbol}: {body}");
        }

        let chart: ChartResponse = resp
            .json()
            .await
            .with_context(|| format!("failed to parse chart response for {symbol}"))?;

        let bars = Self::parse_chart(symbol, chart)?;
        debug!(symbol, interval, range, count = bars.len(), "bars fetched");
        Ok(bars)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
