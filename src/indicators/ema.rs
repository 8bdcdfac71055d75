// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Formula:
//   k     = 2 / (span + 1)
//   EMA_0 = x_0
//   EMA_t = x_t * k + EMA_{t-1} * (1 - k)
//
// Seeded with the first value (no SMA warm-up), so the series is defined
// from the very first bar and has the same length as the input.
// =============================================================================

/// Compute the EMA series of `values` for the given `span`.
///
/// Returns an empty `Vec` when `values` is empty or `span` is zero.
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (span as f64 + 1.0);

    let mut result = Vec::with_capacity(values.len());
    let mut prev = values[0];
    result.push(prev);

    for &x in &values[1..] {
        prev = x * k + prev * (1.0 - k);
        result.push(prev);
    }

    result
}
