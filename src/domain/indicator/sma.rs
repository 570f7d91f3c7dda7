//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(x[i-n+1..=i]). Warm-up: first (n-1) values are NaN.

pub fn sma(series: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    if period == 0 || series.len() < period {
        return out;
    }

    let mut sum: f64 = series[..period].iter().sum();
    out[period - 1] = sum / period as f64;
    for i in period..series.len() {
        sum += series[i] - series[i - period];
        out[i] = sum / period as f64;
    }
    out
}
