// =============================================================================
// Signals Module
// =============================================================================
//
// Signal pipeline for one asset:
// - Evaluation: bars -> indicators -> detector verdict on the last bar
// - Pending signal carried through its confirmation window
// - Bounded per-asset history of UPCOMING / EXECUTED events

pub mod detector;
pub mod history;
pub mod pending;

use thiserror::Error;

use crate::indicators::{compute_indicators, IndicatorSet};
use crate::market_data::PriceBar;
use crate::types::Signal;

pub use detector::detect;
pub use history::{AssetHistoryLog, HistoryEvent, HistoryEventKind};
pub use pending::PendingSignal;

/// Why an evaluation produced no signal. Neither case is fatal; callers
/// degrade to NONE and skip the chart for that call.
#[derive(Debug, Error)]
pub enum SignalUnavailable {
    #[error("insufficient data: {bars} bars, need at least {required}")]
    InsufficientData { bars: usize, required: usize },

    #[error("price fetch failed: {0:#}")]
    FetchFailed(anyhow::Error),
}

/// Bars, their indicators and the verdict on the latest bar.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub bars: Vec<PriceBar>,
    pub indicators: Vec<IndicatorSet>,
    pub signal: Signal,
}

impl Evaluation {
    /// Indicator set of the most recent bar.
    pub fn latest(&self) -> Option<&IndicatorSet> {
        self.indicators.last()
    }
}

/// Run the indicator engine and detector over `bars`.
///
/// Fewer than `min_bars` bars is reported as `InsufficientData` without
/// computing anything.
pub fn evaluate(bars: Vec<PriceBar>, min_bars: usize) -> Result<Evaluation, SignalUnavailable> {
    if bars.is_empty() || bars.len() < min_bars {
        return Err(SignalUnavailable::InsufficientData {
            bars: bars.len(),
            required: min_bars,
        });
    }

    let indicators = compute_indicators(&bars);
    let signal = indicators.last().map(detect).unwrap_or_default();

    Ok(Evaluation {
        bars,
        indicators,
        signal,
    })
}
