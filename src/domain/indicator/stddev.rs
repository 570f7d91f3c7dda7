//! Rolling standard deviation.
//!
//! Population standard deviation over the trailing n values.
//! Warm-up: first (n-1) values are NaN.

pub fn stddev(series: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..series.len() {
        let window = &series[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        out[i] = variance.sqrt();
    }
    out
}
