// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD   = EMA(fast) - EMA(slow)
//   Signal = EMA(MACD, signal)
//
// Both lines share the seeding of `calculate_ema`, so they are defined from
// the first bar.
// =============================================================================

use super::ema::calculate_ema;

/// MACD line and its signal line, aligned with the input closes.
#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Compute MACD for `closes` with the given spans (usually 12 / 26 / 9).
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if fast_ema.len() != closes.len() || slow_ema.len() != closes.len() {
        return MacdSeries::default();
    }

    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = calculate_ema(&macd, signal);

    MacdSeries { macd, signal }
}
