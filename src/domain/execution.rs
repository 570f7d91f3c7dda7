//! Trade lifecycle: sizing and opening a position, the stop/target touch
//! test, and closing into a [`ClosedTrade`].
//!
//! Fills are at the candle close, except stop and target exits which fill at
//! the stop or target price.

use super::candle::Candle;
use super::indicator::IndicatorSnapshot;
use super::portfolio::Portfolio;
use super::position::{ClosedTrade, EntryReason, ExitReason, Position, Side};
use super::sizing::{position_size, stop_loss_price, take_profit_price};
use super::strategy::StrategyConfig;
use super::swing::SwingTracker;
use super::zone::Zone;

/// Why a signalled entry did not produce a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyOpen,
    /// Stop distance is zero or NaN, or sizing produced less than one
    /// contract.
    ZeroSize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(Position),
    Skipped(SkipReason),
}

/// Signal context for a new entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryRequest {
    pub side: Side,
    pub reason: EntryReason,
    pub zone: Zone,
}

/// Sizes and opens a position at `candle.close`.
///
/// The stop anchors on the last swing of the opposing polarity, falling back
/// to an ATR multiple. Sizing uses the current balance.
pub fn enter(
    portfolio: &mut Portfolio,
    request: EntryRequest,
    candle: &Candle,
    snapshot: &IndicatorSnapshot,
    swings: &SwingTracker,
    config: &StrategyConfig,
) -> EntryResult {
    if !portfolio.is_flat() {
        return EntryResult::Skipped(SkipReason::AlreadyOpen);
    }

    let entry = candle.close;
    let swing = match request.side {
        Side::Long => swings.last_low(),
        Side::Short => swings.last_high(),
    };
    let stop = stop_loss_price(
        request.side,
        entry,
        swing.map(|p| p.price),
        config.sl_distance,
        snapshot.atr,
    );

    let Some(size) = position_size(
        portfolio.balance,
        config.risk_percent,
        config.leverage,
        config.contract_value,
        entry,
        stop,
    ) else {
        return EntryResult::Skipped(SkipReason::ZeroSize);
    };

    let position = Position {
        side: request.side,
        size: size.contracts,
        entry_price: entry,
        entry_time: candle.timestamp,
        stop_loss: stop,
        take_profit: take_profit_price(request.side, entry, stop, config.risk_reward),
        entry_zone: request.zone,
        entry_reason: request.reason,
        fast_ma: snapshot.fast,
        slow_ma: snapshot.slow,
        atr: snapshot.atr,
    };
    portfolio.open(position.clone());
    EntryResult::Entered(position)
}

/// Stop or target touched by `candle`, with the fill price. The stop is
/// tested first so a candle spanning both resolves to the loss.
pub fn check_stop_and_target(position: &Position, candle: &Candle) -> Option<(ExitReason, f64)> {
    if position.should_stop_loss(candle) {
        Some((ExitReason::StopLoss, position.stop_loss))
    } else if position.should_take_profit(candle) {
        Some((ExitReason::TakeProfit, position.take_profit))
    } else {
        None
    }
}

/// Where and why a position is being closed.
#[derive(Debug, Clone, Copy)]
pub struct ExitFill {
    pub price: f64,
    pub time: i64,
    pub zone: Zone,
    pub reason: ExitReason,
}

/// Closes the open position, books the P&L, and appends the trade record.
/// Returns `None` when flat.
pub fn exit(portfolio: &mut Portfolio, fill: ExitFill, contract_value: f64) -> Option<ClosedTrade> {
    let position = portfolio.take_position()?;

    let asset_size = position.asset_size(contract_value);
    let pnl = position.unrealized_pnl(fill.price, contract_value);
    let pnl_percent = if position.entry_price != 0.0 {
        position.side.sign() * (fill.price - position.entry_price) / position.entry_price * 100.0
    } else {
        0.0
    };
    let initial_risk = position.risk_per_unit() * asset_size;
    let r_multiple = if initial_risk > 0.0 { pnl / initial_risk } else { 0.0 };

    let running_balance = portfolio.apply_pnl(pnl);

    let trade = ClosedTrade {
        number: portfolio.next_trade_number(),
        side: position.side,
        size: position.size,
        entry_time: position.entry_time,
        exit_time: fill.time,
        entry_price: position.entry_price,
        exit_price: fill.price,
        stop_loss: position.stop_loss,
        take_profit: position.take_profit,
        entry_zone: position.entry_zone,
        exit_zone: fill.zone,
        entry_reason: position.entry_reason,
        exit_reason: fill.reason,
        pnl,
        pnl_percent,
        r_multiple,
        running_balance,
        running_pnl: portfolio.realized_pnl(),
        drawdown: portfolio.drawdown(),
        drawdown_percent: portfolio.drawdown_percent(),
        fast_ma: position.fast_ma,
        slow_ma: position.slow_ma,
        atr: position.atr,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}
