//! RSI (Relative Strength Index).
//!
//! The first value (at index n) uses the simple mean of the first n gains and
//! losses. After that Wilder smoothing applies:
//! avg = (prev_avg * (n-1) + current) / n
//!
//! Each step continues from the state behind the previous RSI value. The
//! RSI alone only fixes the gain/loss ratio, so the two running averages are
//! carried forward instead of being recovered from it.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); 100 when avg_loss == 0.
//! Warm-up: first n values are NaN.

pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let change = |i: usize| closes[i] - closes[i - 1];

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let c = change(i);
        if c > 0.0 {
            avg_gain += c;
        } else {
            avg_loss -= c;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = from_averages(avg_gain, avg_loss);

    let n = period as f64;
    for i in (period + 1)..closes.len() {
        let c = change(i);
        let (gain, loss) = if c > 0.0 { (c, 0.0) } else { (0.0, -c) };
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        out[i] = from_averages(avg_gain, avg_loss);
    }
    out
}

fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
