//! The strategy execution core shared by the batch and streaming drivers.
//!
//! [`StrategyEngine::step`] processes one closed candle: swing update, zone,
//! signal, exit check, then entry check. It performs no I/O; drivers route
//! the returned [`EngineEvent`]s to whatever collaborators they hold.

use tracing::{debug, info};

use super::candle::Candle;
use super::execution::{self, EntryRequest, EntryResult, ExitFill};
use super::indicator::IndicatorSnapshot;
use super::portfolio::Portfolio;
use super::position::{ClosedTrade, ExitReason, Position};
use super::signal::{self, Signal};
use super::strategy::StrategyConfig;
use super::swing::{SwingPoint, SwingTracker};
use super::zone::{self, Zone};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SwingHigh(SwingPoint),
    SwingLow(SwingPoint),
    Opened(Position),
    Closed(ClosedTrade),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub zone: Zone,
    pub signal: Option<Signal>,
    pub events: Vec<EngineEvent>,
}

impl StepOutcome {
    pub fn closed_trade(&self) -> bool {
        self.events.iter().any(|e| matches!(e, EngineEvent::Closed(_)))
    }
}

#[derive(Debug, Clone)]
pub struct StrategyEngine {
    config: StrategyConfig,
    swings: SwingTracker,
    portfolio: Portfolio,
}

impl StrategyEngine {
    pub fn new(config: StrategyConfig, bankroll: f64) -> Self {
        StrategyEngine {
            swings: SwingTracker::new(config.swing_length),
            portfolio: Portfolio::new(bankroll),
            config,
        }
    }

    /// Engine resuming a session whose balance moved away from `bankroll`
    /// and which has already closed `last_trade_number` trades.
    pub fn resume(config: StrategyConfig, bankroll: f64, balance: f64, last_trade_number: u32) -> Self {
        StrategyEngine {
            swings: SwingTracker::new(config.swing_length),
            portfolio: Portfolio::resume(bankroll, balance, last_trade_number),
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn swings(&self) -> &SwingTracker {
        &self.swings
    }

    pub fn balance(&self) -> f64 {
        self.portfolio.balance
    }

    pub fn position(&self) -> Option<&Position> {
        self.portfolio.position.as_ref()
    }

    /// Reinstates a position recovered from storage. Ignored when one is
    /// already open.
    pub fn restore_position(&mut self, position: Position) -> bool {
        self.portfolio.open(position)
    }

    /// Seeds swing state from history without trading.
    pub fn prime(&mut self, window: &[Candle]) {
        self.swings.prime(window);
    }

    /// Keeps swing indices valid after the caller drops `dropped` candles
    /// from the front of its window.
    pub fn rebase(&mut self, dropped: usize) {
        self.swings.rebase(dropped);
    }

    pub fn record_equity(&mut self, timestamp: i64) {
        self.portfolio.record_equity(timestamp);
    }

    /// Processes the newest candle of `window` with its indicator snapshot.
    ///
    /// Entries are held back until the window reaches the warm-up floor.
    pub fn step(&mut self, window: &[Candle], snapshot: &IndicatorSnapshot) -> StepOutcome {
        let mut events = Vec::new();
        let Some(candle) = window.last() else {
            return StepOutcome {
                zone: Zone::Equilibrium,
                signal: None,
                events,
            };
        };

        let update = self.swings.update(window);
        if update.high {
            if let Some(point) = self.swings.last_high() {
                debug!(price = point.price, timestamp = point.timestamp, "swing high confirmed");
                events.push(EngineEvent::SwingHigh(point));
            }
        }
        if update.low {
            if let Some(point) = self.swings.last_low() {
                debug!(price = point.price, timestamp = point.timestamp, "swing low confirmed");
                events.push(EngineEvent::SwingLow(point));
            }
        }

        let zone = zone::classify(self.swings.range(), candle.close);
        let signal = signal::evaluate(snapshot, zone, self.config.allow_trend_continuation);

        if let Some(position) = &self.portfolio.position {
            let exit = execution::check_stop_and_target(position, candle).or_else(|| {
                signal
                    .exit_reason(position.side, self.config.exit_on_zone_change)
                    .map(|reason| (reason, candle.close))
            });
            if let Some((reason, price)) = exit {
                if let Some(trade) = self.close(candle.timestamp, price, zone, reason) {
                    events.push(EngineEvent::Closed(trade));
                }
            }
        }

        if self.portfolio.is_flat() && window.len() >= self.config.warmup_floor() {
            if let Some((side, reason)) = signal.entry() {
                let request = EntryRequest { side, reason, zone };
                match execution::enter(
                    &mut self.portfolio,
                    request,
                    candle,
                    snapshot,
                    &self.swings,
                    &self.config,
                ) {
                    EntryResult::Entered(position) => {
                        info!(
                            side = %position.side,
                            entry = position.entry_price,
                            stop = position.stop_loss,
                            target = position.take_profit,
                            size = position.size,
                            zone = %zone,
                            reason = %position.entry_reason,
                            "trade opened"
                        );
                        events.push(EngineEvent::Opened(position));
                    }
                    EntryResult::Skipped(skip) => {
                        debug!(?skip, side = %side, close = candle.close, "entry skipped");
                    }
                }
            }
        }

        StepOutcome {
            zone,
            signal: Some(signal),
            events,
        }
    }

    /// Closes any open position at `candle.close`. The batch driver uses
    /// this with [`ExitReason::EndOfData`].
    pub fn force_close(&mut self, candle: &Candle, reason: ExitReason) -> Option<ClosedTrade> {
        let zone = zone::classify(self.swings.range(), candle.close);
        self.close(candle.timestamp, candle.close, zone, reason)
    }

    fn close(&mut self, time: i64, price: f64, zone: Zone, reason: ExitReason) -> Option<ClosedTrade> {
        let fill = ExitFill {
            price,
            time,
            zone,
            reason,
        };
        let trade = execution::exit(&mut self.portfolio, fill, self.config.contract_value)?;
        info!(
            number = trade.number,
            side = %trade.side,
            exit = trade.exit_price,
            reason = %trade.exit_reason,
            pnl = trade.pnl,
            r = trade.r_multiple,
            balance = trade.running_balance,
            "trade closed"
        );
        Some(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{EntryReason, Side};

    fn candle(i: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(i * 60_000, close, high, low, close, 1.0)
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            swing_length: 1,
            fast_ma: 2,
            slow_ma: 3,
            risk_percent: 0.01,
            leverage: 10.0,
            ..StrategyConfig::default()
        }
    }

    fn bullish_cross() -> IndicatorSnapshot {
        IndicatorSnapshot {
            fast: 101.0,
            slow: 100.0,
            prev_fast: 99.0,
            prev_slow: 100.0,
            atr: 1.0,
        }
    }

    fn bearish_trend() -> IndicatorSnapshot {
        IndicatorSnapshot {
            fast: 99.0,
            slow: 100.0,
            prev_fast: 99.5,
            prev_slow: 100.0,
            atr: 1.0,
        }
    }

    fn neutral() -> IndicatorSnapshot {
        IndicatorSnapshot {
            fast: 101.0,
            slow: 100.0,
            prev_fast: 101.0,
            prev_slow: 100.0,
            atr: 1.0,
        }
    }

    /// High at 110 then a low at 90, leaving the last close in discount.
    fn discount_window() -> Vec<Candle> {
        vec![
            candle(0, 100.0, 99.0, 99.5),
            candle(1, 110.0, 100.0, 105.0),
            candle(2, 101.0, 95.0, 96.0),
            candle(3, 96.0, 90.0, 92.0),
            candle(4, 97.0, 93.0, 95.0),
        ]
    }

    #[test]
    fn opens_long_in_discount_on_crossover() {
        let mut engine = StrategyEngine::new(config(), 10_000.0);
        let window = discount_window();
        for end in 1..window.len() {
            engine.step(&window[..end], &neutral());
        }
        let outcome = engine.step(&window, &bullish_cross());

        assert_eq!(outcome.zone, Zone::Discount);
        let opened = outcome.events.iter().find_map(|e| match e {
            EngineEvent::Opened(p) => Some(p),
            _ => None,
        });
        let pos = opened.expect("position opened");
        assert_eq!(pos.side, Side::Long);
        assert_eq!(pos.stop_loss, 90.0);
        assert_eq!(pos.entry_reason, EntryReason::Crossover);
        assert!(engine.position().is_some());
    }

    #[test]
    fn opens_long_with_close_below_swing_low() {
        let mut engine = StrategyEngine::new(config(), 10_000.0);
        // high 110 at index 1, low 100 at index 3, then a close at 99
        let window = vec![
            candle(0, 100.0, 99.0, 99.5),
            candle(1, 110.0, 102.0, 105.0),
            candle(2, 104.0, 101.0, 102.0),
            candle(3, 102.0, 100.0, 100.5),
            candle(4, 101.5, 101.0, 101.2),
            candle(5, 100.0, 98.5, 99.0),
        ];
        for end in 1..window.len() {
            engine.step(&window[..end], &neutral());
        }
        let outcome = engine.step(&window, &bullish_cross());

        assert_eq!(engine.swings().last_low().map(|p| p.price), Some(100.0));
        assert_eq!(outcome.zone, Zone::Discount);
        let pos = engine.position().expect("long opened");
        assert_eq!(pos.side, Side::Long);
        assert_eq!(pos.entry_price, 99.0);
        assert_eq!(pos.stop_loss, 100.0);
        assert_eq!(pos.take_profit, 101.0);
        assert_eq!(pos.size, 100.0);
    }

    #[test]
    fn no_entry_before_warmup_floor() {
        let cfg = StrategyConfig {
            slow_ma: 10,
            ..config()
        };
        let mut engine = StrategyEngine::new(cfg, 10_000.0);
        let window = discount_window();
        for end in 1..=window.len() {
            engine.step(&window[..end], &bullish_cross());
        }
        assert!(engine.position().is_none());
    }

    #[test]
    fn trend_reversal_closes_at_close() {
        let mut engine = StrategyEngine::new(config(), 10_000.0);
        let mut window = discount_window();
        for end in 1..window.len() {
            engine.step(&window[..end], &neutral());
        }
        engine.step(&window, &bullish_cross());

        window.push(candle(5, 96.0, 94.0, 95.5));
        let outcome = engine.step(&window, &bearish_trend());
        let closed = outcome.events.iter().find_map(|e| match e {
            EngineEvent::Closed(t) => Some(t),
            _ => None,
        });
        let trade = closed.expect("trade closed");
        assert_eq!(trade.exit_reason, ExitReason::TrendReversal);
        assert_eq!(trade.exit_price, 95.5);
        assert!(outcome.closed_trade());
        assert!(engine.position().is_none());
    }

    #[test]
    fn stop_touch_closes_at_stop() {
        let mut engine = StrategyEngine::new(config(), 10_000.0);
        let mut window = discount_window();
        for end in 1..window.len() {
            engine.step(&window[..end], &neutral());
        }
        engine.step(&window, &bullish_cross());

        window.push(candle(5, 96.0, 89.0, 91.0));
        let outcome = engine.step(&window, &neutral());
        let trade = outcome
            .events
            .iter()
            .find_map(|e| match e {
                EngineEvent::Closed(t) => Some(t.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_price, 90.0);
        assert!(trade.pnl < 0.0);
    }

    #[test]
    fn force_close_end_of_data() {
        let mut engine = StrategyEngine::new(config(), 10_000.0);
        let window = discount_window();
        for end in 1..window.len() {
            engine.step(&window[..end], &neutral());
        }
        engine.step(&window, &bullish_cross());

        let last = candle(5, 98.0, 94.0, 97.0);
        let trade = engine.force_close(&last, ExitReason::EndOfData).unwrap();
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
        assert_eq!(trade.exit_price, 97.0);
        assert!(engine.force_close(&last, ExitReason::EndOfData).is_none());
    }

    #[test]
    fn restore_position_blocks_new_entries() {
        let mut engine = StrategyEngine::resume(config(), 10_000.0, 9_500.0, 0);
        assert_eq!(engine.balance(), 9_500.0);
        let restored = Position {
            side: Side::Short,
            size: 1.0,
            entry_price: 120.0,
            entry_time: 0,
            stop_loss: 130.0,
            take_profit: 100.0,
            entry_zone: Zone::Premium,
            entry_reason: EntryReason::Crossover,
            fast_ma: 0.0,
            slow_ma: 0.0,
            atr: 0.0,
        };
        assert!(engine.restore_position(restored.clone()));
        assert!(!engine.restore_position(restored));
    }

    #[test]
    fn empty_window_is_noop() {
        let mut engine = StrategyEngine::new(config(), 10_000.0);
        let outcome = engine.step(&[], &neutral());
        assert!(outcome.events.is_empty());
        assert!(outcome.signal.is_none());
    }
}
