//! Trade notification port. Delivery is best-effort.

use crate::domain::error::ZoneTraderError;
use crate::domain::position::{ClosedTrade, Position};

pub trait Notifier {
    fn notify_trade_opened(&self, instrument: &str, position: &Position) -> Result<(), ZoneTraderError>;

    fn notify_trade_closed(&self, instrument: &str, trade: &ClosedTrade) -> Result<(), ZoneTraderError>;
}
