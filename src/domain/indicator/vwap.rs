//! Volume Weighted Average Price.
//!
//! Cumulative sum(typical_price * volume) / sum(volume) from the first candle.
//! NaN while cumulative volume is zero.

use crate::domain::candle::Candle;

pub fn vwap(candles: &[Candle]) -> Vec<f64> {
    let mut pv = 0.0;
    let mut vol = 0.0;
    candles
        .iter()
        .map(|c| {
            pv += c.typical_price() * c.volume;
            vol += c.volume;
            if vol > 0.0 { pv / vol } else { f64::NAN }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vwap_weights_by_volume() {
        let candles = vec![
            Candle::new(0, 10.0, 10.0, 10.0, 10.0, 1.0),
            Candle::new(1, 20.0, 20.0, 20.0, 20.0, 3.0),
        ];
        let out = vwap(&candles);
        assert!((out[0] - 10.0).abs() < 1e-12);
        assert!((out[1] - 17.5).abs() < 1e-12);
    }

    #[test]
    fn vwap_zero_volume_is_nan() {
        let candles = vec![Candle::new(0, 10.0, 10.0, 10.0, 10.0, 0.0)];
        assert!(vwap(&candles)[0].is_nan());
    }
}
