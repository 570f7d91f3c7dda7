//! Technical indicator library.
//!
//! Every function is pure: it takes the full ordered history and returns a
//! series of equal length. Indices before the warm-up is satisfied hold
//! `f64::NAN`. The one exception is [`ema`], which fills its warm-up with a
//! growing-window mean instead (see its docs).
//!
//! [`IndicatorSet`] bundles the three series the strategy reads (fast MA,
//! slow MA, ATR) so that batch and streaming drivers derive their per-candle
//! [`IndicatorSnapshot`] the same way.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod pivot;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod vwap;

pub use adx::adx;
pub use atr::{atr, true_range};
pub use ema::ema;
pub use pivot::{pivot_high, pivot_low};
pub use rsi::rsi;
pub use sma::sma;
pub use stddev::stddev;
pub use vwap::vwap;

use crate::domain::candle::{Candle, columns};
use std::fmt;
use std::str::FromStr;

/// ATR lookback used for the fallback stop distance.
pub const ATR_PERIOD: usize = 14;

/// Moving-average flavour used for the fast/slow crossover pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaKind {
    #[default]
    Ema,
    Sma,
}

impl MaKind {
    pub fn apply(&self, series: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaKind::Ema => ema(series, period),
            MaKind::Sma => sma(series, period),
        }
    }
}

impl FromStr for MaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ema" => Ok(MaKind::Ema),
            "sma" => Ok(MaKind::Sma),
            other => Err(format!("unknown moving average type '{other}'")),
        }
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Ema => write!(f, "EMA"),
            MaKind::Sma => write!(f, "SMA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub fast: Vec<f64>,
    pub slow: Vec<f64>,
    pub atr: Vec<f64>,
}

/// Indicator values at one candle plus the previous MA pair for edge detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub fast: f64,
    pub slow: f64,
    pub prev_fast: f64,
    pub prev_slow: f64,
    pub atr: f64,
}

impl IndicatorSet {
    pub fn compute(candles: &[Candle], fast_period: usize, slow_period: usize, kind: MaKind) -> Self {
        let (highs, lows, closes, _) = columns(candles);
        IndicatorSet {
            fast: kind.apply(&closes, fast_period),
            slow: kind.apply(&closes, slow_period),
            atr: atr(&highs, &lows, &closes, ATR_PERIOD),
        }
    }

    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }

    /// Snapshot at `index`. Out-of-range reads come back as NaN.
    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot {
        let at = |series: &[f64], i: Option<usize>| {
            i.and_then(|i| series.get(i)).copied().unwrap_or(f64::NAN)
        };
        let prev = index.checked_sub(1);
        IndicatorSnapshot {
            fast: at(&self.fast, Some(index)),
            slow: at(&self.slow, Some(index)),
            prev_fast: at(&self.fast, prev),
            prev_slow: at(&self.slow, prev),
            atr: at(&self.atr, Some(index)),
        }
    }

    pub fn last(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).map(|i| self.snapshot(i))
    }
}
