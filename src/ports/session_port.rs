//! Persistence port for streaming sessions.
//!
//! The streaming driver treats every call as fire-and-forget: a failure is
//! logged and the in-memory state stays authoritative.

use crate::domain::candle::Candle;
use crate::domain::error::ZoneTraderError;
use crate::domain::position::{ClosedTrade, Position};
use crate::domain::timeframe::Timeframe;

pub trait SessionStore {
    /// Last persisted balance, `None` for a new session.
    fn load_session_balance(&self, session: &str) -> Result<Option<f64>, ZoneTraderError>;

    /// Highest trade number closed by earlier runs of `session`, 0 when none.
    fn load_last_trade_number(&self, session: &str) -> Result<u32, ZoneTraderError>;

    /// Position left open by a previous run of `session`.
    fn load_open_trade(&self, session: &str) -> Result<Option<Position>, ZoneTraderError>;

    fn record_trade_open(&self, session: &str, position: &Position) -> Result<(), ZoneTraderError>;

    fn record_trade_close(&self, session: &str, trade: &ClosedTrade) -> Result<(), ZoneTraderError>;

    fn update_session_balance(&self, session: &str, balance: f64) -> Result<(), ZoneTraderError>;

    fn save_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<(), ZoneTraderError>;
}
