#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use zonetrader::domain::candle::Candle;
use zonetrader::domain::error::ZoneTraderError;
use zonetrader::domain::position::{ClosedTrade, Position};
use zonetrader::domain::strategy::{MaKind, StrategyConfig};
use zonetrader::domain::timeframe::Timeframe;
use zonetrader::ports::candle_port::CandleSource;
use zonetrader::ports::notify_port::Notifier;
use zonetrader::ports::session_port::SessionStore;

pub const MINUTE: i64 = 60_000;

/// Candle source serving whatever has been pushed so far.
pub struct MockSource {
    pub candles: RefCell<Vec<Candle>>,
    pub fail: Cell<bool>,
    pub calls: Cell<usize>,
}

impl MockSource {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles: RefCell::new(candles),
            fail: Cell::new(false),
            calls: Cell::new(0),
        }
    }

    pub fn push(&self, candle: Candle) {
        self.candles.borrow_mut().push(candle);
    }
}

impl CandleSource for MockSource {
    fn get_candles(&self, _: &str, _: Timeframe, limit: usize) -> Result<Vec<Candle>, ZoneTraderError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(ZoneTraderError::DataSource {
                reason: "exchange unavailable".into(),
            });
        }
        let candles = self.candles.borrow();
        let start = candles.len().saturating_sub(limit);
        Ok(candles[start..].to_vec())
    }
}

/// Session store whose every call fails.
pub struct FailingStore;

impl SessionStore for FailingStore {
    fn load_session_balance(&self, _: &str) -> Result<Option<f64>, ZoneTraderError> {
        Err(down())
    }
    fn load_last_trade_number(&self, _: &str) -> Result<u32, ZoneTraderError> {
        Err(down())
    }
    fn load_open_trade(&self, _: &str) -> Result<Option<Position>, ZoneTraderError> {
        Err(down())
    }
    fn record_trade_open(&self, _: &str, _: &Position) -> Result<(), ZoneTraderError> {
        Err(down())
    }
    fn record_trade_close(&self, _: &str, _: &ClosedTrade) -> Result<(), ZoneTraderError> {
        Err(down())
    }
    fn update_session_balance(&self, _: &str, _: f64) -> Result<(), ZoneTraderError> {
        Err(down())
    }
    fn save_candles(&self, _: &str, _: Timeframe, _: &[Candle]) -> Result<(), ZoneTraderError> {
        Err(down())
    }
}

fn down() -> ZoneTraderError {
    ZoneTraderError::Database {
        reason: "connection refused".into(),
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub opened: RefCell<Vec<Position>>,
    pub closed: RefCell<Vec<ClosedTrade>>,
}

impl Notifier for RecordingNotifier {
    fn notify_trade_opened(&self, _: &str, position: &Position) -> Result<(), ZoneTraderError> {
        self.opened.borrow_mut().push(position.clone());
        Ok(())
    }

    fn notify_trade_closed(&self, _: &str, trade: &ClosedTrade) -> Result<(), ZoneTraderError> {
        self.closed.borrow_mut().push(trade.clone());
        Ok(())
    }
}

pub fn candle_at(i: usize, close: f64) -> Candle {
    Candle::new(i as i64 * MINUTE, close, close + 1.0, close - 1.0, close, 10.0)
}

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes.iter().enumerate().map(|(i, &c)| candle_at(i, c)).collect()
}

/// Rally to a swing high at index 6, sell-off to a swing low at index 12,
/// then a slow recovery. Highs and lows sit one point either side of the
/// close.
pub fn rally_dip_recovery() -> Vec<Candle> {
    candles_from_closes(&[
        100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 112.0, // rally
        110.0, 108.0, 106.0, 104.0, 102.0, 100.0, // sell-off
        101.0, 102.0, 103.0, 104.0, 105.0, 106.0, 107.0, // recovery
    ])
}

/// Swing length 2 with a 3/5 SMA pair.
pub fn short_strategy() -> StrategyConfig {
    StrategyConfig {
        swing_length: 2,
        fast_ma: 3,
        slow_ma: 5,
        ma_kind: MaKind::Sma,
        ..StrategyConfig::default()
    }
}

/// Deterministic saw-tooth walk with `n` candles.
pub fn generate_candles(n: usize) -> Vec<Candle> {
    let mut close: f64 = 100.0;
    (0..n)
        .map(|i| {
            let step = match (i / 7) % 4 {
                0 => 1.5,
                1 => -0.5,
                2 => -1.5,
                _ => 0.75,
            };
            let open = close;
            close += step;
            let high = open.max(close) + 0.8;
            let low = open.min(close) - 0.8;
            Candle::new(i as i64 * MINUTE, open, high, low, close, 100.0)
        })
        .collect()
}
