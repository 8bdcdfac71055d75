// =============================================================================
// Average True Range (ATR) — simple-average variant
// =============================================================================
//
// True Range for each bar:
//   TR_0 = H - L                                   (no previous close)
//   TR_t = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR_t = simple mean of the last `period` TR values (no Wilder smoothing).
// =============================================================================

use super::rolling_mean;
use crate::market_data::PriceBar;

/// True range per bar, aligned with `bars`.
pub fn true_range_series(bars: &[PriceBar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    if let Some(first) = bars.first() {
        tr.push(first.high - first.low);
    }

    for w in bars.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let hl = cur.high - cur.low;
        let hc = (cur.high - prev.close).abs();
        let lc = (cur.low - prev.close).abs();
        tr.push(hl.max(hc).max(lc));
    }

    tr
}

/// Compute the ATR series, one entry per bar; `None` during warm-up or when
/// the window holds a non-finite value.
pub fn calculate_atr(bars: &[PriceBar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range_series(bars), period)
}
