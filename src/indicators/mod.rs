// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator series. `compute_indicators` derives one
// `IndicatorSet` per bar; every field is an `Option<f64>` where `None` means
// "unavailable" (warm-up or a non-finite computation). Downstream detection
// treats `None` as a hard NONE.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;

use serde::Serialize;

use crate::market_data::PriceBar;

pub const EMA_FAST_SPAN: usize = 5;
pub const EMA_SLOW_SPAN: usize = 20;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST_SPAN: usize = 12;
pub const MACD_SLOW_SPAN: usize = 26;
pub const MACD_SIGNAL_SPAN: usize = 9;
pub const ATR_PERIOD: usize = 14;

/// Indicator values for a single bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub atr: Option<f64>,
}

/// Derive the indicator set for every bar of `bars` (oldest first).
///
/// The result has the same length as `bars`; entry `i` depends only on
/// `bars[..=i]`.
pub fn compute_indicators(bars: &[PriceBar]) -> Vec<IndicatorSet> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let ema_fast = ema::calculate_ema(&closes, EMA_FAST_SPAN);
    let ema_slow = ema::calculate_ema(&closes, EMA_SLOW_SPAN);
    let rsi = rsi::calculate_rsi(&closes, RSI_PERIOD);
    let macd = macd::calculate_macd(&closes, MACD_FAST_SPAN, MACD_SLOW_SPAN, MACD_SIGNAL_SPAN);
    let atr = atr::calculate_atr(bars, ATR_PERIOD);

    (0..bars.len())
        .map(|i| IndicatorSet {
            ema_fast: finite(ema_fast.get(i).copied()),
            ema_slow: finite(ema_slow.get(i).copied()),
            rsi: finite(rsi.get(i).copied().flatten()),
            macd: finite(macd.macd.get(i).copied()),
            macd_signal: finite(macd.signal.get(i).copied()),
            atr: finite(atr.get(i).copied().flatten()),
        })
        .collect()
}

/// Rolling simple mean over `window` values, aligned with the input.
///
/// The first `window - 1` entries, and any window containing a non-finite
/// value, are `None`.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let sum: f64 = values[i + 1 - window..=i].iter().sum();
            finite(Some(sum / window as f64))
        })
        .collect()
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}
