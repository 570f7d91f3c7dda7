//! True range and Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(high-low, |high-prevClose|, |low-prevClose|).
//! ATR(n) is the simple moving average of TR, so the first (n-1) values are NaN.

use super::sma::sma;

pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let len = highs.len().min(lows.len()).min(closes.len());
    (0..len)
        .map(|i| {
            let hl = highs[i] - lows[i];
            if i == 0 {
                hl
            } else {
                let prev_close = closes[i - 1];
                hl.max((highs[i] - prev_close).abs())
                    .max((lows[i] - prev_close).abs())
            }
        })
        .collect()
}

pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    sma(&true_range(highs, lows, closes), period)
}
