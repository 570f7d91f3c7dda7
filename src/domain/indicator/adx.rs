//! Average Directional Index.
//!
//! +DM/-DM and true range are smoothed with [`ema`], giving
//! +DI = 100 * ema(+DM) / ema(TR) and -DI likewise.
//! DX = 100 * |+DI - -DI| / (+DI + -DI), and ADX = ema(DX).
//!
//! Inherits the growing-mean warm-up of [`ema`] rather than NaN padding.

use super::atr::true_range;
use super::ema::ema;

pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let len = highs.len().min(lows.len()).min(closes.len());
    if period == 0 {
        return vec![f64::NAN; len];
    }

    let mut plus_dm = vec![0.0; len];
    let mut minus_dm = vec![0.0; len];
    for i in 1..len {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let tr = ema(&true_range(&highs[..len], &lows[..len], &closes[..len]), period);
    let plus = ema(&plus_dm, period);
    let minus = ema(&minus_dm, period);

    let dx: Vec<f64> = (0..len)
        .map(|i| {
            if tr[i] == 0.0 {
                return 0.0;
            }
            let plus_di = 100.0 * plus[i] / tr[i];
            let minus_di = 100.0 * minus[i] / tr[i];
            let sum = plus_di + minus_di;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / sum
            }
        })
        .collect();

    ema(&dx, period)
}
