//! Pivot high / pivot low detection.
//!
//! Bar i is a pivot high when its value is strictly greater than every value
//! in the `left` bars before it and the `right` bars after it. The output holds
//! the pivot value at i, NaN elsewhere. Bars without a full window on both
//! sides are never pivots.

pub fn pivot_high(highs: &[f64], left: usize, right: usize) -> Vec<f64> {
    pivots(highs, left, right, |candidate, other| other < candidate)
}

pub fn pivot_low(lows: &[f64], left: usize, right: usize) -> Vec<f64> {
    pivots(lows, left, right, |candidate, other| other > candidate)
}

fn pivots(series: &[f64], left: usize, right: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let mut out = vec![f64::NAN; series.len()];
    if series.len() < left + right + 1 {
        return out;
    }

    for i in left..series.len() - right {
        let candidate = series[i];
        let is_pivot = (i - left..=i + right)
            .filter(|&j| j != i)
            .all(|j| beats(candidate, series[j]));
        if is_pivot {
            out[i] = candidate;
        }
    }
    out
}
