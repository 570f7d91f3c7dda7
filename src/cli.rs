//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::csv_adapter::{read_candles, write_equity, write_trades};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_notifier::LogNotifier;
use crate::adapters::memory_store::MemoryStore;
use crate::adapters::source::DataSource;
use crate::domain::backtest::{BacktestConfig, BacktestResult, RunStatus, run_backtest};
use crate::domain::config_validation::{validate_backtest_config, validate_live_config, validate_strategy_config};
use crate::domain::error::ZoneTraderError;
use crate::domain::indicator::MaKind;
use crate::domain::live::{LiveConfig, LiveSession, RunSummary, default_session_id};
use crate::domain::strategy::StrategyConfig;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::session_port::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "zonetrader", about = "Swing-zone moving average crossover backtester and paper trader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV candle file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Candle file, overriding [backtest] data
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Write the trade ledger to this CSV file
        #[arg(long)]
        trades_csv: Option<PathBuf>,
        /// Write the equity curve to this CSV file
        #[arg(long)]
        equity_csv: Option<PathBuf>,
    },
    /// Start a streaming session
    Live {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many polls
        #[arg(long)]
        max_ticks: Option<u64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            trades_csv,
            equity_csv,
        } => run_backtest_command(&config, data.as_deref(), trades_csv.as_deref(), equity_csv.as_deref()),
        Command::Live { config, max_ticks } => run_live(&config, max_ticks),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(e: ZoneTraderError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

fn run_backtest_command(
    config_path: &Path,
    data_override: Option<&Path>,
    trades_csv: Option<&Path>,
    equity_csv: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let prepared = validate_strategy_config(&adapter)
        .and_then(|_| validate_backtest_config(&adapter))
        .and_then(|_| Ok((build_strategy_config(&adapter)?, build_backtest_config(&adapter)?)));
    let (strategy, bt_config) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let data_path = match data_override {
        Some(p) => p.to_path_buf(),
        None => match adapter.require_string("backtest", "data") {
            Ok(p) => PathBuf::from(p),
            Err(e) => return fail(e),
        },
    };

    eprintln!("Loading candles from {}", data_path.display());
    let candles = match read_candles(&data_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let result = run_backtest(&candles, &strategy, &bt_config);
    if let RunStatus::Failed { reason } = &result.status {
        eprintln!("error: backtest failed: {reason}");
        return ExitCode::from(5);
    }
    print_backtest_summary(&result);

    if let Some(path) = trades_csv {
        if let Err(e) = write_trades(path, &result.trades) {
            return fail(e);
        }
        eprintln!("Trades written to: {}", path.display());
    }
    if let Some(path) = equity_csv {
        if let Err(e) = write_equity(path, &result.equity_curve) {
            return fail(e);
        }
        eprintln!("Equity curve written to: {}", path.display());
    }

    if adapter.get_bool("backtest", "store", false) {
        if let Err(e) = store_result(&adapter, &result) {
            return fail(e);
        }
    }

    ExitCode::SUCCESS
}

#[cfg(feature = "sqlite")]
fn store_result(adapter: &dyn ConfigPort, result: &BacktestResult) -> Result<(), ZoneTraderError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::ports::result_port::ResultSink;

    let sink = SqliteAdapter::from_config(adapter)?;
    let run_id = sink.store_result(result)?;
    eprintln!("Result stored as run {run_id}");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn store_result(_adapter: &dyn ConfigPort, _result: &BacktestResult) -> Result<(), ZoneTraderError> {
    Err(ZoneTraderError::invalid(
        "backtest",
        "store",
        "built without sqlite support",
    ))
}

fn print_backtest_summary(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!(
        "\n=== {} {} ({} candles) ===",
        result.instrument, result.timeframe, result.candle_count
    );
    eprintln!("Initial Balance:  {:.2}", result.initial_balance);
    eprintln!("Final Balance:    {:.2}", result.final_balance);
    eprintln!("Total P&L:        {:.2} ({:.2}%)", m.total_pnl, m.return_percent);
    eprintln!("Total Trades:     {} ({} wins, {} losses)", m.total_trades, m.wins, m.losses);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {}", m.profit_factor);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Avg R-Multiple:   {:.2}", m.avg_r_multiple);
    eprintln!("Max Drawdown:     {:.2} ({:.1}%)", m.max_drawdown, m.max_drawdown_percent);
    eprintln!("Execution Time:   {} ms", result.execution_time.as_millis());
}

fn run_live(config_path: &Path, max_ticks: Option<u64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let prepared = validate_strategy_config(&adapter)
        .and_then(|_| validate_live_config(&adapter))
        .and_then(|_| Ok((build_strategy_config(&adapter)?, build_live_config(&adapter)?)));
    let (strategy, mut live_config) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    if max_ticks.is_some() {
        live_config.max_ticks = max_ticks;
    }

    let data_source = match DataSource::from_config(&adapter, live_config.window) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let source = match data_source.open(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let store = match open_session_store(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    // A replay advances one candle per poll, so there is nothing to wait for.
    let pace: fn(Duration) = match &data_source {
        DataSource::Replay { .. } => |_| {},
        _ => std::thread::sleep,
    };

    let notifier = LogNotifier;
    let mut session = match LiveSession::start_with_retries(
        live_config,
        strategy,
        source.as_ref(),
        store.as_ref(),
        &notifier,
        pace,
    ) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    match session.run(pace) {
        Ok(summary) => {
            print_live_summary(session.config(), &summary);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

#[cfg(feature = "sqlite")]
fn open_session_store(adapter: &dyn ConfigPort) -> Result<Box<dyn SessionStore>, ZoneTraderError> {
    if adapter.has_section("sqlite") {
        let store = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(adapter)?;
        return Ok(Box::new(store));
    }
    Ok(Box::new(MemoryStore::new()))
}

#[cfg(not(feature = "sqlite"))]
fn open_session_store(_adapter: &dyn ConfigPort) -> Result<Box<dyn SessionStore>, ZoneTraderError> {
    Ok(Box::new(MemoryStore::new()))
}

fn print_live_summary(config: &LiveConfig, summary: &RunSummary) {
    eprintln!("\n=== Session {} ===", config.session_id);
    eprintln!("Ticks:            {}", summary.ticks);
    eprintln!("Candles:          {}", summary.candles_processed);
    eprintln!("Closed Trades:    {}", summary.trades_closed);
    eprintln!("Balance:          {:.2}", summary.balance);
    match &summary.open_position {
        Some(p) => eprintln!(
            "Open Position:    {} {:.4} @ {:.4} (SL {:.4}, TP {:.4})",
            p.side, p.size, p.entry_price, p.stop_loss, p.take_profit
        ),
        None => eprintln!("Open Position:    none"),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }
    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    eprintln!(
        "  strategy: swing {} | {} {}/{} | RR {} | risk {}% | leverage {}x",
        strategy.swing_length,
        strategy.ma_kind,
        strategy.fast_ma,
        strategy.slow_ma,
        strategy.risk_reward,
        strategy.risk_percent * 100.0,
        strategy.leverage
    );
    eprintln!("  warm-up:  {} candles", strategy.warmup_floor());

    if adapter.has_section("backtest") {
        if let Err(e) = validate_backtest_config(&adapter) {
            return fail(e);
        }
        eprintln!("  [backtest] ok");
    }
    if adapter.has_section("live") {
        if let Err(e) = validate_live_config(&adapter) {
            return fail(e);
        }
        eprintln!("  [live] ok");
    }

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, ZoneTraderError> {
    let defaults = StrategyConfig::default();
    let ma_kind = match adapter.get_string("strategy", "ma_type") {
        Some(value) => MaKind::from_str(&value).map_err(|reason| ZoneTraderError::invalid("strategy", "ma_type", reason))?,
        None => defaults.ma_kind,
    };

    Ok(StrategyConfig {
        swing_length: adapter.get_count("strategy", "swing_length", defaults.swing_length)?,
        sl_distance: adapter.get_double("strategy", "sl_distance", defaults.sl_distance),
        fast_ma: adapter.get_count("strategy", "fast_ma", defaults.fast_ma)?,
        slow_ma: adapter.get_count("strategy", "slow_ma", defaults.slow_ma)?,
        ma_kind,
        risk_reward: adapter.get_double("strategy", "risk_reward", defaults.risk_reward),
        risk_percent: adapter.get_double("strategy", "risk_percent", defaults.risk_percent),
        leverage: adapter.get_double("strategy", "leverage", defaults.leverage),
        contract_value: adapter.get_double("strategy", "contract_value", defaults.contract_value),
        allow_trend_continuation: adapter.get_bool(
            "strategy",
            "allow_trend_continuation",
            defaults.allow_trend_continuation,
        ),
        exit_on_zone_change: adapter.get_bool("strategy", "exit_on_zone_change", defaults.exit_on_zone_change),
    })
}

fn timeframe(adapter: &dyn ConfigPort, section: &str) -> Result<Timeframe, ZoneTraderError> {
    Timeframe::from_str(&adapter.require_string(section, "timeframe")?)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, ZoneTraderError> {
    Ok(BacktestConfig {
        instrument: adapter.require_string("backtest", "instrument")?,
        timeframe: timeframe(adapter, "backtest")?,
        bankroll: adapter.get_double("backtest", "bankroll", 10_000.0),
    })
}

pub fn build_live_config(adapter: &dyn ConfigPort) -> Result<LiveConfig, ZoneTraderError> {
    let instrument = adapter.require_string("live", "instrument")?;
    let timeframe = timeframe(adapter, "live")?;
    let defaults = LiveConfig::new(&instrument, timeframe, adapter.get_double("live", "bankroll", 10_000.0));

    let max_ticks = match adapter.get_string("live", "max_ticks") {
        Some(_) => Some(adapter.get_count("live", "max_ticks", 0)? as u64),
        None => None,
    };
    let as_u32 = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);

    Ok(LiveConfig {
        session_id: adapter
            .get_string("live", "session")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_session_id(&instrument, timeframe)),
        window: adapter.get_count("live", "window", defaults.window)?,
        fetch_limit: adapter.get_count("live", "fetch_limit", defaults.fetch_limit)?,
        max_fetch_failures: as_u32(adapter.get_count(
            "live",
            "max_fetch_failures",
            defaults.max_fetch_failures as usize,
        )?),
        init_retries: as_u32(adapter.get_count("live", "init_retries", defaults.init_retries as usize)?),
        max_ticks,
        ..defaults
    })
}
