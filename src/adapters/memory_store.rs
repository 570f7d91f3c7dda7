//! In-process session store, used when no database is configured.
//!
//! State lives only as long as the store, so a restarted run begins a fresh
//! session.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::domain::candle::Candle;
use crate::domain::error::ZoneTraderError;
use crate::domain::position::{ClosedTrade, Position};
use crate::domain::timeframe::Timeframe;
use crate::ports::session_port::SessionStore;

#[derive(Debug, Default)]
struct Session {
    balance: Option<f64>,
    open: Option<Position>,
    closed: Vec<ClosedTrade>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RefCell<HashMap<String, Session>>,
    candles: RefCell<HashMap<(String, Timeframe), Vec<Candle>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closed_trades(&self, session: &str) -> Vec<ClosedTrade> {
        self.sessions
            .borrow()
            .get(session)
            .map(|s| s.closed.clone())
            .unwrap_or_default()
    }

    pub fn candle_count(&self, instrument: &str, timeframe: Timeframe) -> usize {
        self.candles
            .borrow()
            .get(&(instrument.to_string(), timeframe))
            .map_or(0, Vec::len)
    }
}

impl SessionStore for MemoryStore {
    fn load_session_balance(&self, session: &str) -> Result<Option<f64>, ZoneTraderError> {
        Ok(self.sessions.borrow().get(session).and_then(|s| s.balance))
    }

    fn load_last_trade_number(&self, session: &str) -> Result<u32, ZoneTraderError> {
        Ok(self
            .sessions
            .borrow()
            .get(session)
            .and_then(|s| s.closed.iter().map(|t| t.number).max())
            .unwrap_or(0))
    }

    fn load_open_trade(&self, session: &str) -> Result<Option<Position>, ZoneTraderError> {
        Ok(self.sessions.borrow().get(session).and_then(|s| s.open.clone()))
    }

    fn record_trade_open(&self, session: &str, position: &Position) -> Result<(), ZoneTraderError> {
        self.sessions.borrow_mut().entry(session.to_string()).or_default().open = Some(position.clone());
        Ok(())
    }

    fn record_trade_close(&self, session: &str, trade: &ClosedTrade) -> Result<(), ZoneTraderError> {
        let mut sessions = self.sessions.borrow_mut();
        let entry = sessions.entry(session.to_string()).or_default();
        entry.open = None;
        entry.closed.push(trade.clone());
        Ok(())
    }

    fn update_session_balance(&self, session: &str, balance: f64) -> Result<(), ZoneTraderError> {
        self.sessions.borrow_mut().entry(session.to_string()).or_default().balance = Some(balance);
        Ok(())
    }

    fn save_candles(&self, instrument: &str, timeframe: Timeframe, candles: &[Candle]) -> Result<(), ZoneTraderError> {
        let mut stored = self.candles.borrow_mut();
        let series = stored.entry((instrument.to_string(), timeframe)).or_default();
        for candle in candles {
            match series.binary_search_by_key(&candle.timestamp, |c| c.timestamp) {
                Ok(i) => series[i] = *candle,
                Err(i) => series.insert(i, *candle),
            }
        }
        Ok(())
    }
}
