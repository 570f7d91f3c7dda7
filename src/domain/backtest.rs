//! Batch driver: runs the engine over a complete candle array.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::candle::{Candle, is_strictly_ascending};
use super::engine::StrategyEngine;
use super::indicator::IndicatorSet;
use super::metrics::Metrics;
use super::portfolio::EquityPoint;
use super::position::{ClosedTrade, ExitReason};
use super::strategy::StrategyConfig;
use super::timeframe::Timeframe;

/// Equity is sampled every this many candles, plus after every close.
pub const EQUITY_SAMPLE_INTERVAL: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub bankroll: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed,
    Failed { reason: String },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub status: RunStatus,
    pub instrument: String,
    pub timeframe: Timeframe,
    pub strategy: StrategyConfig,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub metrics: Metrics,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub candle_count: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub execution_time: Duration,
}

impl BacktestResult {
    fn failed(
        config: &BacktestConfig,
        strategy: &StrategyConfig,
        candles: &[Candle],
        reason: String,
        started: Instant,
    ) -> Self {
        BacktestResult {
            status: RunStatus::Failed { reason },
            instrument: config.instrument.clone(),
            timeframe: config.timeframe,
            strategy: strategy.clone(),
            initial_balance: config.bankroll,
            final_balance: config.bankroll,
            metrics: Metrics::compute(config.bankroll, config.bankroll, &[]),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            candle_count: candles.len(),
            first_timestamp: candles.first().map(|c| c.timestamp),
            last_timestamp: candles.last().map(|c| c.timestamp),
            execution_time: started.elapsed(),
        }
    }
}

/// Runs `strategy` over `candles`.
///
/// Too few candles or out-of-order timestamps produce a failed result rather
/// than an error. Any position still open after the last candle is closed
/// at its close with [`ExitReason::EndOfData`].
pub fn run_backtest(candles: &[Candle], strategy: &StrategyConfig, config: &BacktestConfig) -> BacktestResult {
    let started = Instant::now();

    let floor = strategy.warmup_floor();
    if candles.len() < floor {
        let reason = format!("need at least {floor} candles, got {}", candles.len());
        warn!(instrument = %config.instrument, %reason, "backtest aborted");
        return BacktestResult::failed(config, strategy, candles, reason, started);
    }
    if !is_strictly_ascending(candles) {
        let reason = "candles are not in strictly ascending timestamp order".to_string();
        warn!(instrument = %config.instrument, %reason, "backtest aborted");
        return BacktestResult::failed(config, strategy, candles, reason, started);
    }

    let indicators = IndicatorSet::compute(candles, strategy.fast_ma, strategy.slow_ma, strategy.ma_kind);
    let mut engine = StrategyEngine::new(strategy.clone(), config.bankroll);

    for (i, candle) in candles.iter().enumerate() {
        let outcome = engine.step(&candles[..=i], &indicators.snapshot(i));
        if outcome.closed_trade() || (i + 1) % EQUITY_SAMPLE_INTERVAL == 0 {
            engine.record_equity(candle.timestamp);
        }
    }

    if let Some(last) = candles.last() {
        engine.force_close(last, ExitReason::EndOfData);
        engine.record_equity(last.timestamp);
    }

    let portfolio = engine.portfolio();
    let metrics = Metrics::from_portfolio(portfolio);
    let result = BacktestResult {
        status: RunStatus::Completed,
        instrument: config.instrument.clone(),
        timeframe: config.timeframe,
        strategy: strategy.clone(),
        initial_balance: portfolio.initial_balance,
        final_balance: portfolio.balance,
        metrics,
        trades: portfolio.closed_trades.clone(),
        equity_curve: portfolio.equity_curve.clone(),
        candle_count: candles.len(),
        first_timestamp: candles.first().map(|c| c.timestamp),
        last_timestamp: candles.last().map(|c| c.timestamp),
        execution_time: started.elapsed(),
    };

    info!(
        instrument = %result.instrument,
        timeframe = %result.timeframe,
        candles = result.candle_count,
        trades = result.metrics.total_trades,
        final_balance = result.final_balance,
        "backtest complete"
    );
    result
}
