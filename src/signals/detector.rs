// =============================================================================
// Signal Detector — four-condition threshold rule on the latest bar
// =============================================================================
//
//   BUY  iff EMA5 > EMA20 and RSI > 50 and MACD > signal and ATR > 0
//   SELL iff EMA5 < EMA20 and RSI < 50 and MACD < signal and ATR > 0
//   NONE otherwise, including when any input is unavailable.
//
// Single-snapshot classification: no hysteresis, no confirmation bars. The
// pending window downstream is what damps flicker.
// =============================================================================

use crate::indicators::IndicatorSet;
use crate::types::Signal;

/// RSI midline separating bullish from bearish momentum.
const RSI_MIDLINE: f64 = 50.0;

/// Classify a single indicator snapshot.
pub fn detect(set: &IndicatorSet) -> Signal {
    let (Some(fast), Some(slow), Some(rsi), Some(macd), Some(macd_signal), Some(atr)) = (
        set.ema_fast,
        set.ema_slow,
        set.rsi,
        set.macd,
        set.macd_signal,
        set.atr,
    ) else {
        return Signal::None;
    };

    if atr <= 0.0 {
        return Signal::None;
    }

    if fast > slow && rsi > RSI_MIDLINE && macd > macd_signal {
        Signal::Buy
    } else if fast < slow && rsi < RSI_MIDLINE && macd < macd_signal {
        Signal::Sell
    } else {
        Signal::None
    }
}
