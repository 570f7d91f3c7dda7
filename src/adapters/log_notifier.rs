//! Notifier that reports trades through the log.

use tracing::info;

use crate::domain::error::ZoneTraderError;
use crate::domain::position::{ClosedTrade, Position};
use crate::ports::notify_port::Notifier;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_trade_opened(&self, instrument: &str, position: &Position) -> Result<(), ZoneTraderError> {
        info!(
            target: "zonetrader::notify",
            instrument,
            side = %position.side,
            reason = %position.entry_reason,
            zone = %position.entry_zone,
            entry = position.entry_price,
            stop_loss = position.stop_loss,
            take_profit = position.take_profit,
            size = position.size,
            "position opened"
        );
        Ok(())
    }

    fn notify_trade_closed(&self, instrument: &str, trade: &ClosedTrade) -> Result<(), ZoneTraderError> {
        info!(
            target: "zonetrader::notify",
            instrument,
            number = trade.number,
            side = %trade.side,
            reason = %trade.exit_reason,
            exit = trade.exit_price,
            pnl = trade.pnl,
            r = trade.r_multiple,
            balance = trade.running_balance,
            "position closed"
        );
        Ok(())
    }
}
