//! Consumer of finished backtest results.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::ZoneTraderError;

pub trait ResultSink {
    /// Persists `result` and returns the identifier it was stored under.
    fn store_result(&self, result: &BacktestResult) -> Result<i64, ZoneTraderError>;
}
