//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = (x[i] - EMA[i-1]) * k + EMA[i-1].
//!
//! Warm-up differs from the textbook definition: indices before the seed hold
//! the mean of all values seen so far rather than NaN. Crossover timing of the
//! strategy depends on this, so it must not be replaced with NaN padding.

pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; series.len()];
    }

    let mut out = Vec::with_capacity(series.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut sum = 0.0;
    let mut prev = 0.0;

    for (i, &x) in series.iter().enumerate() {
        let value = if i < period {
            sum += x;
            // growing-window mean; at i == period-1 this is the SMA seed
            sum / (i + 1) as f64
        } else {
            (x - prev) * k + prev
        };
        out.push(value);
        prev = value;
    }
    out
}
