//! Streaming driver: polls a [`CandleSource`] and steps the engine once per
//! new candle.
//!
//! Ticks never overlap. Each one fetches, appends candles whose timestamp is
//! newer than the last known candle, and processes them one at a time.
//! Persistence and notification failures are logged and otherwise ignored.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::candle::Candle;
use super::engine::{EngineEvent, StrategyEngine};
use super::error::ZoneTraderError;
use super::indicator::IndicatorSet;
use super::position::Position;
use super::strategy::StrategyConfig;
use super::timeframe::Timeframe;
use crate::ports::candle_port::CandleSource;
use crate::ports::notify_port::Notifier;
use crate::ports::session_port::SessionStore;

pub const DEFAULT_WINDOW: usize = 500;
pub const DEFAULT_FETCH_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct LiveConfig {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub bankroll: f64,
    pub session_id: String,
    /// Maximum candles held in memory.
    pub window: usize,
    /// Candles requested on each poll.
    pub fetch_limit: usize,
    /// Consecutive failed polls tolerated before the run gives up.
    pub max_fetch_failures: u32,
    pub init_retries: u32,
    pub max_ticks: Option<u64>,
}

impl LiveConfig {
    pub fn new(instrument: &str, timeframe: Timeframe, bankroll: f64) -> Self {
        LiveConfig {
            instrument: instrument.to_string(),
            timeframe,
            bankroll,
            session_id: default_session_id(instrument, timeframe),
            window: DEFAULT_WINDOW,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            max_fetch_failures: 5,
            init_retries: 3,
            max_ticks: None,
        }
    }

    /// Candles kept when the window overflows; the rest of the capacity is
    /// headroom for new candles.
    pub fn retained_on_trim(&self) -> usize {
        retained_on_trim(self.window)
    }
}

pub fn retained_on_trim(window: usize) -> usize {
    window * 4 / 5
}

pub fn default_session_id(instrument: &str, timeframe: Timeframe) -> String {
    format!("{instrument}-{timeframe}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NoNewCandle,
    Processed { candles: usize, events: Vec<EngineEvent> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub candles_processed: u64,
    pub trades_closed: usize,
    pub balance: f64,
    pub open_position: Option<Position>,
}

pub struct LiveSession<'a> {
    config: LiveConfig,
    source: &'a dyn CandleSource,
    store: &'a dyn SessionStore,
    notifier: &'a dyn Notifier,
    engine: StrategyEngine,
    window: Vec<Candle>,
    candles_processed: u64,
}

impl<'a> LiveSession<'a> {
    /// Loads the initial window and any persisted session state.
    ///
    /// Fails when the source errors or returns fewer candles than the
    /// strategy's warm-up floor.
    pub fn start(
        config: LiveConfig,
        strategy: StrategyConfig,
        source: &'a dyn CandleSource,
        store: &'a dyn SessionStore,
        notifier: &'a dyn Notifier,
    ) -> Result<Self, ZoneTraderError> {
        let window = source.get_candles(&config.instrument, config.timeframe, config.window)?;
        let floor = strategy.warmup_floor();
        if window.len() < floor {
            return Err(ZoneTraderError::InsufficientData {
                instrument: config.instrument.clone(),
                candles: window.len(),
                minimum: floor,
            });
        }

        let balance = match store.load_session_balance(&config.session_id) {
            Ok(Some(balance)) => balance,
            Ok(None) => {
                if let Err(e) = store.update_session_balance(&config.session_id, config.bankroll) {
                    warn!(session = %config.session_id, error = %e, "failed to create session balance");
                }
                config.bankroll
            }
            Err(e) => {
                warn!(session = %config.session_id, error = %e, "failed to load session balance, using bankroll");
                config.bankroll
            }
        };

        let last_trade_number = store.load_last_trade_number(&config.session_id).unwrap_or_else(|e| {
            warn!(session = %config.session_id, error = %e, "failed to load trade count, numbering from 1");
            0
        });

        let mut engine = StrategyEngine::resume(strategy, config.bankroll, balance, last_trade_number);
        engine.prime(&window);

        match store.load_open_trade(&config.session_id) {
            Ok(Some(position)) => {
                info!(
                    session = %config.session_id,
                    side = %position.side,
                    entry = position.entry_price,
                    "restored open position"
                );
                engine.restore_position(position);
            }
            Ok(None) => {}
            Err(e) => warn!(session = %config.session_id, error = %e, "failed to load open trade"),
        }

        if let Err(e) = store.save_candles(&config.instrument, config.timeframe, &window) {
            warn!(instrument = %config.instrument, error = %e, "failed to save initial candles");
        }

        info!(
            session = %config.session_id,
            instrument = %config.instrument,
            timeframe = %config.timeframe,
            candles = window.len(),
            balance,
            "live session started"
        );

        Ok(LiveSession {
            config,
            source,
            store,
            notifier,
            engine,
            window,
            candles_processed: 0,
        })
    }

    /// [`LiveSession::start`] with bounded retries. Configuration errors are
    /// returned at once; other failures are retried after `sleep`.
    pub fn start_with_retries(
        config: LiveConfig,
        strategy: StrategyConfig,
        source: &'a dyn CandleSource,
        store: &'a dyn SessionStore,
        notifier: &'a dyn Notifier,
        mut sleep: impl FnMut(Duration),
    ) -> Result<Self, ZoneTraderError> {
        let attempts = config.init_retries.max(1);
        let mut attempt = 1;
        loop {
            match Self::start(config.clone(), strategy.clone(), source, store, notifier) {
                Ok(session) => return Ok(session),
                Err(e) if e.is_config() || attempt >= attempts => return Err(e),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "live session start failed, retrying");
                    attempt += 1;
                    sleep(config.timeframe.poll_interval());
                }
            }
        }
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    pub fn window(&self) -> &[Candle] {
        &self.window
    }

    /// Polls once and processes every candle newer than the window's last.
    pub fn tick(&mut self) -> Result<TickOutcome, ZoneTraderError> {
        let latest = self
            .source
            .get_candles(&self.config.instrument, self.config.timeframe, self.config.fetch_limit)?;

        let last_ts = self.window.last().map(|c| c.timestamp).unwrap_or(i64::MIN);
        let mut fresh: Vec<Candle> = latest.into_iter().filter(|c| c.timestamp > last_ts).collect();
        fresh.sort_by_key(|c| c.timestamp);
        fresh.dedup_by_key(|c| c.timestamp);
        if fresh.is_empty() {
            debug!(instrument = %self.config.instrument, "no new candle");
            return Ok(TickOutcome::NoNewCandle);
        }

        let mut events = Vec::new();
        for candle in &fresh {
            events.extend(self.process(*candle));
        }

        if let Err(e) = self
            .store
            .save_candles(&self.config.instrument, self.config.timeframe, &fresh)
        {
            warn!(instrument = %self.config.instrument, error = %e, "failed to save candles");
        }

        Ok(TickOutcome::Processed {
            candles: fresh.len(),
            events,
        })
    }

    fn process(&mut self, candle: Candle) -> Vec<EngineEvent> {
        self.window.push(candle);
        if self.window.len() > self.config.window {
            let dropped = self.window.len() - self.config.retained_on_trim();
            self.window.drain(..dropped);
            self.engine.rebase(dropped);
        }

        let strategy = self.engine.config();
        let indicators = IndicatorSet::compute(&self.window, strategy.fast_ma, strategy.slow_ma, strategy.ma_kind);
        let Some(snapshot) = indicators.last() else {
            return Vec::new();
        };

        let outcome = self.engine.step(&self.window, &snapshot);
        self.engine.record_equity(candle.timestamp);
        self.candles_processed += 1;
        debug!(
            timestamp = candle.timestamp,
            close = candle.close,
            zone = %outcome.zone,
            "processed candle"
        );

        for event in &outcome.events {
            self.route(event);
        }
        outcome.events
    }

    fn route(&self, event: &EngineEvent) {
        let session = &self.config.session_id;
        let instrument = &self.config.instrument;
        match event {
            EngineEvent::Opened(position) => {
                if let Err(e) = self.store.record_trade_open(session, position) {
                    warn!(%session, error = %e, "failed to record trade open");
                }
                if let Err(e) = self.notifier.notify_trade_opened(instrument, position) {
                    debug!(error = %e, "trade open notification dropped");
                }
            }
            EngineEvent::Closed(trade) => {
                if let Err(e) = self.store.record_trade_close(session, trade) {
                    warn!(%session, error = %e, "failed to record trade close");
                }
                if let Err(e) = self.store.update_session_balance(session, trade.running_balance) {
                    warn!(%session, error = %e, "failed to update session balance");
                }
                if let Err(e) = self.notifier.notify_trade_closed(instrument, trade) {
                    debug!(error = %e, "trade close notification dropped");
                }
            }
            EngineEvent::SwingHigh(_) | EngineEvent::SwingLow(_) => {}
        }
    }

    /// Polls until `max_ticks` is reached or fetching fails more than
    /// `max_fetch_failures` times in a row. `sleep` is called between polls
    /// with the timeframe's polling interval.
    pub fn run(&mut self, mut sleep: impl FnMut(Duration)) -> Result<RunSummary, ZoneTraderError> {
        let interval = self.config.timeframe.poll_interval();
        let mut ticks = 0u64;
        let mut failures = 0u32;

        loop {
            match self.tick() {
                Ok(_) => failures = 0,
                Err(e) => {
                    failures += 1;
                    warn!(
                        instrument = %self.config.instrument,
                        failures,
                        error = %e,
                        "candle fetch failed"
                    );
                    if failures > self.config.max_fetch_failures {
                        return Err(e);
                    }
                }
            }
            ticks += 1;
            if self.config.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            sleep(interval);
        }

        Ok(self.summary(ticks))
    }

    pub fn summary(&self, ticks: u64) -> RunSummary {
        RunSummary {
            ticks,
            candles_processed: self.candles_processed,
            trades_closed: self.engine.portfolio().closed_trades.len(),
            balance: self.engine.balance(),
            open_position: self.engine.position().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ClosedTrade;
    use std::cell::{Cell, RefCell};

    struct StaticSource {
        candles: RefCell<Vec<Candle>>,
        fail: Cell<bool>,
    }

    impl CandleSource for StaticSource {
        fn get_candles(&self, _: &str, _: Timeframe, limit: usize) -> Result<Vec<Candle>, ZoneTraderError> {
            if self.fail.get() {
                return Err(ZoneTraderError::DataSource {
                    reason: "offline".into(),
                });
            }
            let candles = self.candles.borrow();
            let start = candles.len().saturating_sub(limit);
            Ok(candles[start..].to_vec())
        }
    }

    #[derive(Default)]
    struct NullStore {
        saved: Cell<usize>,
    }

    impl SessionStore for NullStore {
        fn load_session_balance(&self, _: &str) -> Result<Option<f64>, ZoneTraderError> {
            Ok(None)
        }
        fn load_last_trade_number(&self, _: &str) -> Result<u32, ZoneTraderError> {
            Ok(0)
        }
        fn load_open_trade(&self, _: &str) -> Result<Option<Position>, ZoneTraderError> {
            Ok(None)
        }
        fn record_trade_open(&self, _: &str, _: &Position) -> Result<(), ZoneTraderError> {
            Ok(())
        }
        fn record_trade_close(&self, _: &str, _: &ClosedTrade) -> Result<(), ZoneTraderError> {
            Ok(())
        }
        fn update_session_balance(&self, _: &str, _: f64) -> Result<(), ZoneTraderError> {
            Ok(())
        }
        fn save_candles(&self, _: &str, _: Timeframe, candles: &[Candle]) -> Result<(), ZoneTraderError> {
            self.saved.set(self.saved.get() + candles.len());
            Ok(())
        }
    }

    struct Silent;

    impl Notifier for Silent {
        fn notify_trade_opened(&self, _: &str, _: &Position) -> Result<(), ZoneTraderError> {
            Ok(())
        }
        fn notify_trade_closed(&self, _: &str, _: &ClosedTrade) -> Result<(), ZoneTraderError> {
            Ok(())
        }
    }

    fn candle(i: usize) -> Candle {
        let c = 100.0 + (i % 7) as f64;
        Candle::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 1.0)
    }

    fn source(n: usize) -> StaticSource {
        StaticSource {
            candles: RefCell::new((0..n).map(candle).collect()),
            fail: Cell::new(false),
        }
    }

    fn strategy() -> StrategyConfig {
        StrategyConfig {
            swing_length: 2,
            fast_ma: 3,
            slow_ma: 5,
            ..StrategyConfig::default()
        }
    }

    fn config() -> LiveConfig {
        LiveConfig {
            window: 20,
            ..LiveConfig::new("ETHUSDT", Timeframe::M1, 1_000.0)
        }
    }

    #[test]
    fn default_session_id_joins_instrument_and_timeframe() {
        assert_eq!(config().session_id, "ETHUSDT-1m");
        assert_eq!(config().retained_on_trim(), 16);
        assert_eq!(LiveConfig::new("X", Timeframe::H1, 1.0).retained_on_trim(), 400);
    }

    #[test]
    fn start_rejects_short_history() {
        let src = source(3);
        let store = NullStore::default();
        let err = LiveSession::start(config(), strategy(), &src, &store, &Silent).err().unwrap();
        assert!(matches!(err, ZoneTraderError::InsufficientData { minimum: 6, .. }));
    }

    #[test]
    fn tick_without_new_candle() {
        let src = source(30);
        let store = NullStore::default();
        let mut session = LiveSession::start(config(), strategy(), &src, &store, &Silent).unwrap();
        assert_eq!(session.window().len(), 20);
        assert_eq!(session.tick().unwrap(), TickOutcome::NoNewCandle);
    }

    #[test]
    fn tick_appends_new_candles_and_trims() {
        let src = source(30);
        let store = NullStore::default();
        let mut session = LiveSession::start(config(), strategy(), &src, &store, &Silent).unwrap();
        src.candles.borrow_mut().extend((30..33).map(candle));

        let outcome = session.tick().unwrap();
        assert!(matches!(outcome, TickOutcome::Processed { candles: 3, .. }));
        // 20 + 1 overflows and trims to 16, then two more arrive
        assert_eq!(session.window().len(), 18);
        assert_eq!(session.window().last().unwrap().timestamp, 32 * 60_000);
        assert_eq!(store.saved.get(), 23);
    }

    #[test]
    fn run_stops_after_repeated_fetch_failures() {
        let src = source(30);
        let store = NullStore::default();
        let cfg = LiveConfig {
            max_fetch_failures: 2,
            ..config()
        };
        let mut session = LiveSession::start(cfg, strategy(), &src, &store, &Silent).unwrap();
        src.fail.set(true);
        let mut sleeps = 0;
        assert!(session.run(|_| sleeps += 1).is_err());
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn run_honours_max_ticks() {
        let src = source(30);
        let store = NullStore::default();
        let cfg = LiveConfig {
            max_ticks: Some(3),
            ..config()
        };
        let mut session = LiveSession::start(cfg, strategy(), &src, &store, &Silent).unwrap();
        let summary = session.run(|_| {}).unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.candles_processed, 0);
        assert_eq!(summary.balance, 1_000.0);
    }

    #[test]
    fn start_with_retries_gives_up() {
        let src = source(30);
        src.fail.set(true);
        let store = NullStore::default();
        let mut sleeps = 0;
        let result = LiveSession::start_with_retries(config(), strategy(), &src, &store, &Silent, |_| sleeps += 1);
        assert!(result.is_err());
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn start_with_retries_skips_config_errors() {
        let src = source(2);
        let store = NullStore::default();
        let mut sleeps = 0;
        let result = LiveSession::start_with_retries(config(), strategy(), &src, &store, &Silent, |_| sleeps += 1);
        assert!(result.is_err());
        assert_eq!(sleeps, 0);
    }
}
