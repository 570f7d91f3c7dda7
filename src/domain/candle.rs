//! OHLCV candle representation.
//!
//! Timestamps are epoch milliseconds. A series for one (instrument,
//! timeframe) is ordered ascending with no duplicate timestamps.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Splits a candle slice into parallel high/low/close/volume columns.
pub fn columns(candles: &[Candle]) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut highs = Vec::with_capacity(candles.len());
    let mut lows = Vec::with_capacity(candles.len());
    let mut closes = Vec::with_capacity(candles.len());
    let mut volumes = Vec::with_capacity(candles.len());
    for c in candles {
        highs.push(c.high);
        lows.push(c.low);
        closes.push(c.close);
        volumes.push(c.volume);
    }
    (highs, lows, closes, volumes)
}

/// True when timestamps are strictly increasing.
pub fn is_strictly_ascending(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
