//! CSV file adapters: a candle source, a replaying source for paper
//! streaming, and trade/equity exports.
//!
//! Candle files have a header row and the columns
//! `timestamp,open,high,low,close,volume`. Timestamps may be epoch
//! milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` (UTC).

use std::cell::Cell;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::candle::Candle;
use crate::domain::error::ZoneTraderError;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::ClosedTrade;
use crate::domain::timeframe::Timeframe;
use crate::ports::candle_port::CandleSource;

/// Reads candles from `<base>/<instrument>_<timeframe>.csv`, or from `base`
/// itself when it names a file.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str, timeframe: Timeframe) -> PathBuf {
        if self.base_path.is_dir() {
            self.base_path.join(format!("{instrument}_{timeframe}.csv"))
        } else {
            self.base_path.clone()
        }
    }
}

impl CandleSource for CsvAdapter {
    fn get_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ZoneTraderError> {
        let mut candles = read_candles(self.csv_path(instrument, timeframe))?;
        let start = candles.len().saturating_sub(limit);
        Ok(candles.split_off(start))
    }
}

/// Loads every candle in `path`, sorted by timestamp with duplicate
/// timestamps dropped (first row wins).
pub fn read_candles<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>, ZoneTraderError> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ZoneTraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

    let mut candles = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| ZoneTraderError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;
        let row = line + 2;

        let field = |idx: usize, name: &str| {
            record.get(idx).ok_or_else(|| ZoneTraderError::DataSource {
                reason: format!("row {row}: missing {name} column"),
            })
        };
        let number = |idx: usize, name: &str| -> Result<f64, ZoneTraderError> {
            field(idx, name)?.parse().map_err(|e| ZoneTraderError::DataSource {
                reason: format!("row {row}: invalid {name} value: {e}"),
            })
        };

        let timestamp = parse_timestamp(field(0, "timestamp")?).ok_or_else(|| ZoneTraderError::DataSource {
            reason: format!("row {row}: unrecognised timestamp"),
        })?;

        candles.push(Candle {
            timestamp,
            open: number(1, "open")?,
            high: number(2, "high")?,
            low: number(3, "low")?,
            close: number(4, "close")?,
            volume: number(5, "volume")?,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    debug!(path = %path.display(), candles = candles.len(), "loaded candles");
    Ok(candles)
}

fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(ms) = value.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Replays a fixed candle history as if it were arriving live.
///
/// The first poll sees the first `initial` candles. Every later poll reveals
/// one more, until the history is exhausted.
pub struct ReplaySource {
    candles: Vec<Candle>,
    revealed: Cell<usize>,
    polled: Cell<bool>,
}

impl ReplaySource {
    pub fn new(candles: Vec<Candle>, initial: usize) -> Self {
        let revealed = initial.min(candles.len());
        ReplaySource {
            candles,
            revealed: Cell::new(revealed),
            polled: Cell::new(false),
        }
    }

    pub fn from_csv<P: AsRef<Path>>(path: P, initial: usize) -> Result<Self, ZoneTraderError> {
        Ok(Self::new(read_candles(path)?, initial))
    }

    pub fn remaining(&self) -> usize {
        self.candles.len() - self.revealed.get()
    }
}

impl CandleSource for ReplaySource {
    fn get_candles(&self, _: &str, _: Timeframe, limit: usize) -> Result<Vec<Candle>, ZoneTraderError> {
        if self.polled.replace(true) && self.remaining() > 0 {
            self.revealed.set(self.revealed.get() + 1);
        }
        let end = self.revealed.get();
        let start = end.saturating_sub(limit);
        Ok(self.candles[start..end].to_vec())
    }
}

pub fn write_trades<P: AsRef<Path>>(path: P, trades: &[ClosedTrade]) -> Result<(), ZoneTraderError> {
    write_rows(path.as_ref(), trades)
}

pub fn write_equity<P: AsRef<Path>>(path: P, points: &[EquityPoint]) -> Result<(), ZoneTraderError> {
    write_rows(path.as_ref(), points)
}

fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), ZoneTraderError> {
    let to_io = |e: csv::Error| ZoneTraderError::Io(std::io::Error::other(e));
    let mut wtr = csv::Writer::from_path(path).map_err(to_io)?;
    for row in rows {
        wtr.serialize(row).map_err(to_io)?;
    }
    wtr.flush()?;
    Ok(())
}
