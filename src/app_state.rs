// =============================================================================
// Central Application State — signal desk
// =============================================================================
//
// One owned `AppState` (shared as `Arc<AppState>`) holds the configuration,
// the price source and the `SignalBook`. The book sits behind a single
// `parking_lot::Mutex`; every read or write of confirmed signals, histories,
// the pending slot and the selected asset goes through it.
//
// Query flow for one asset:
//   1. Resolve the asset (explicit or last selected).
//   2. Fetch bars (outside the lock) and evaluate.
//   3. Under the lock: execute an expired pending, feed the detection into
//      the book, read back signal / countdown / histories.
//   4. Spawn the confirmation timer if a new pending was opened.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::market_data::PriceSource;
use crate::runtime_config::RuntimeConfig;
use crate::signal_book::{Observation, SignalBook};
use crate::signals::{self, Evaluation, PendingSignal, SignalUnavailable};
use crate::types::Signal;

/// A query named an instrument that is not configured.
#[derive(Debug, Error)]
#[error("unknown asset: {0}")]
pub struct UnknownAsset(pub String);

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Bumped on every book mutation (pending opened, executed, selection).
    pub state_version: AtomicU64,

    pub runtime_config: Arc<RuntimeConfig>,

    price_source: Arc<dyn PriceSource>,

    book: Mutex<SignalBook>,

    /// Instant when the engine was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, price_source: Arc<dyn PriceSource>) -> Self {
        let book = SignalBook::new(&config);
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(config),
            price_source,
            book: Mutex::new(book),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Query facade ────────────────────────────────────────────────────

    /// Evaluate one asset and build the dashboard snapshot for it.
    ///
    /// `asset = None` serves the last selected asset. Data problems never
    /// fail the query; they only suppress the signal and the chart.
    pub async fn query_asset(
        self: &Arc<Self>,
        asset: Option<&str>,
    ) -> Result<SignalSnapshot, UnknownAsset> {
        let asset = self.resolve_asset(asset)?;
        let config = &self.runtime_config;

        let evaluation = self.evaluate_asset(&asset).await;
        let detected = match &evaluation {
            Ok(eval) => eval.signal,
            Err(SignalUnavailable::InsufficientData { bars, required }) => {
                debug!(asset = %asset, bars, required, "insufficient data, no signal");
                Signal::None
            }
            Err(e @ SignalUnavailable::FetchFailed(_)) => {
                warn!(asset = %asset, error = %e, "no signal this round");
                Signal::None
            }
        };

        let (snapshot, started) = {
            let mut book = self.book.lock();
            let now = Local::now();

            if book.confirm_expired(now).is_some() {
                self.increment_version();
            }

            let started = match book.observe(&asset, detected, now) {
                Observation::Started(pending) => {
                    self.increment_version();
                    Some(pending)
                }
                Observation::Dropped { .. } | Observation::Ignored => None,
            };

            let snapshot = SignalSnapshot {
                asset: asset.clone(),
                assets: book.asset_names().to_vec(),
                signal: book.displayed_signal(&asset),
                history: book.history(&asset),
                all_signals: book.all_histories(),
                countdown: book.countdown(&asset, now),
                chart: evaluation
                    .as_ref()
                    .ok()
                    .map(|eval| ChartSeries::from_evaluation(eval, config.chart_points)),
            };
            (snapshot, started)
        };

        if let Some(pending) = started {
            self.schedule_confirmation(&pending);
        }

        Ok(snapshot)
    }

    /// Pick the asset for this query and remember explicit choices.
    fn resolve_asset(&self, asset: Option<&str>) -> Result<String, UnknownAsset> {
        let mut book = self.book.lock();
        match asset {
            Some(name) => {
                if !book.is_known(name) {
                    return Err(UnknownAsset(name.to_string()));
                }
                if book.selected() != name {
                    book.select(name);
                    self.increment_version();
                }
                Ok(name.to_string())
            }
            None => Ok(book.selected().to_string()),
        }
    }

    async fn evaluate_asset(&self, asset: &str) -> Result<Evaluation, SignalUnavailable> {
        let config = &self.runtime_config;
        let symbol = config
            .symbol_for(asset)
            .ok_or_else(|| SignalUnavailable::FetchFailed(anyhow::anyhow!("no symbol for {asset}")))?;

        let bars = self
            .price_source
            .fetch_bars(symbol, &config.bar_interval, &config.lookback_range)
            .await
            .map_err(SignalUnavailable::FetchFailed)?;

        signals::evaluate(bars, config.min_bars)
    }

    // ── Confirmation timer ──────────────────────────────────────────────

    /// Fire-and-forget timer that executes `pending` after its delay. The
    /// task only submits the transition to the book; it holds no state.
    fn schedule_confirmation(self: &Arc<Self>, pending: &PendingSignal) {
        let state = Arc::clone(self);
        let id = pending.id;
        let delay = pending.delay();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.confirm_pending(id);
        });
    }

    /// Execute the pending signal `id` if it still holds the slot.
    pub fn confirm_pending(&self, id: Uuid) -> Option<PendingSignal> {
        let confirmed = self.book.lock().confirm(id, Local::now());
        match &confirmed {
            Some(_) => {
                self.increment_version();
            }
            None => debug!(id = %id, "confirmation timer found no matching pending"),
        }
        confirmed
    }

    /// Snapshot of the pending slot, for diagnostics.
    pub fn pending(&self) -> Option<PendingSignal> {
        self.book.lock().pending().cloned()
    }

    pub fn log_startup(&self) {
        let config = &self.runtime_config;
        info!(
            assets = ?config.asset_names(),
            default_asset = %config.default_asset,
            pending_delay_secs = config.pending_delay_secs,
            min_bars = config.min_bars,
            "signal desk state initialised"
        );
    }
}

// =============================================================================
// Serialisable snapshot types (match the dashboard's fetch payload)
// =============================================================================

/// Response of `GET /api/signal`.
#[derive(Debug, Clone, Serialize)]
pub struct SignalSnapshot {
    pub asset: String,
    pub assets: Vec<String>,
    pub signal: Signal,
    pub history: Vec<String>,
    pub all_signals: BTreeMap<String, Vec<String>>,
    /// Seconds until the pending signal executes; `null` unless this asset
    /// holds the pending slot.
    pub countdown: Option<u64>,
    /// `null` when this call had no usable data.
    pub chart: Option<ChartSeries>,
}

/// Trailing window of prices and indicators for the dashboard charts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub close: Vec<f64>,
    pub ema5: Vec<Option<f64>>,
    pub ema20: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
}

impl ChartSeries {
    /// Last `points` bars of `eval`.
    pub fn from_evaluation(eval: &Evaluation, points: usize) -> Self {
        let start = eval.bars.len().saturating_sub(points);
        let bars = &eval.bars[start..];
        let sets = &eval.indicators[start..];

        let mut chart = Self::default();
        for (bar, set) in bars.iter().zip(sets) {
            chart
                .labels
                .push(bar.timestamp.format("%Y-%m-%d %H:%M:%S%:z").to_string());
            chart.close.push(bar.close);
            chart.ema5.push(set.ema_fast);
            chart.ema20.push(set.ema_slow);
            chart.rsi.push(set.rsi);
            chart.macd.push(set.macd);
            chart.macd_signal.push(set.macd_signal);
            chart.atr.push(set.atr);
        }
        chart
    }
}
