//! Market data port.

use crate::domain::candle::Candle;
use crate::domain::error::ZoneTraderError;
use crate::domain::timeframe::Timeframe;

pub trait CandleSource {
    /// The most recent `limit` candles, oldest first, without duplicate
    /// timestamps.
    fn get_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ZoneTraderError>;
}

impl<T: CandleSource + ?Sized> CandleSource for Box<T> {
    fn get_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ZoneTraderError> {
        (**self).get_candles(instrument, timeframe, limit)
    }
}
