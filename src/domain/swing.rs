//! Swing point tracking.
//!
//! On each new candle the tracker looks at the candle `swing_length` bars
//! back from the end of the window. It is a swing high when no other candle
//! within `±swing_length` has a high greater than or equal to its own; swing
//! lows mirror this on lows. Only the most recent swing of each polarity is
//! kept, and it is replaced wholesale when a newer one is confirmed.

use crate::domain::candle::Candle;
use crate::domain::zone::SwingRange;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub price: f64,
    pub timestamp: i64,
    /// Position of the pivot candle inside the in-memory window.
    pub index: usize,
}

/// Which polarities were confirmed by the latest update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwingUpdate {
    pub high: bool,
    pub low: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwingTracker {
    length: usize,
    last_high: Option<SwingPoint>,
    last_low: Option<SwingPoint>,
}

impl SwingTracker {
    pub fn new(length: usize) -> Self {
        SwingTracker {
            length,
            last_high: None,
            last_low: None,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Candles needed before the first pivot candidate can be judged.
    pub fn min_candles(&self) -> usize {
        2 * self.length + 1
    }

    pub fn last_high(&self) -> Option<SwingPoint> {
        self.last_high
    }

    pub fn last_low(&self) -> Option<SwingPoint> {
        self.last_low
    }

    /// Current swing range, available once both polarities are known.
    pub fn range(&self) -> Option<SwingRange> {
        match (self.last_high, self.last_low) {
            (Some(h), Some(l)) => Some(SwingRange::new(h.price, l.price)),
            _ => None,
        }
    }

    /// Judges the pivot candidate of `window` (the candles up to and
    /// including the newest one).
    pub fn update(&mut self, window: &[Candle]) -> SwingUpdate {
        let mut result = SwingUpdate::default();
        if window.len() < self.min_candles() {
            return result;
        }

        let length = self.length;
        let pivot = window.len() - 1 - length;
        let candidate = window[pivot];
        let neighbours = || {
            window[pivot - length..=pivot + length]
                .iter()
                .enumerate()
                .filter(move |(offset, _)| *offset != length)
                .map(|(_, c)| c)
        };

        if neighbours().all(|c| c.high < candidate.high) {
            self.last_high = Some(SwingPoint {
                price: candidate.high,
                timestamp: candidate.timestamp,
                index: pivot,
            });
            result.high = true;
        }
        if neighbours().all(|c| c.low > candidate.low) {
            self.last_low = Some(SwingPoint {
                price: candidate.low,
                timestamp: candidate.timestamp,
                index: pivot,
            });
            result.low = true;
        }
        result
    }

    /// Replays every prefix of `window` so swings are known before the first
    /// live candle arrives.
    pub fn prime(&mut self, window: &[Candle]) {
        for end in self.min_candles()..=window.len() {
            self.update(&window[..end]);
        }
    }

    /// Shifts stored indices after `dropped` candles were removed from the
    /// front of the window. Pivots that fell out of the window keep their
    /// price and timestamp and are pinned to index 0.
    pub fn rebase(&mut self, dropped: usize) {
        for point in [&mut self.last_high, &mut self.last_low].into_iter().flatten() {
            point.index = point.index.saturating_sub(dropped);
        }
    }

    #[cfg(test)]
    pub(crate) fn restore(&mut self, high: Option<SwingPoint>, low: Option<SwingPoint>) {
        self.last_high = high;
        self.last_low = low;
    }
}
