//! Configuration validation.
//!
//! Checks every `[strategy]`, `[backtest]` and `[live]` key before a run is
//! built. Missing keys take their defaults and are validated as such.

use std::str::FromStr;

use crate::domain::error::ZoneTraderError;
use crate::domain::indicator::MaKind;
use crate::domain::live::{DEFAULT_WINDOW, retained_on_trim};
use crate::domain::strategy::StrategyConfig;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;

pub const SOURCE_KINDS: [&str; 3] = ["csv", "replay", "sqlite"];

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    validate_swing_length(config)?;
    validate_ma_periods(config)?;
    validate_ma_type(config)?;
    validate_sl_distance(config)?;
    validate_risk(config)?;
    validate_positive(config, "strategy", "leverage", 1.0)?;
    validate_positive(config, "strategy", "contract_value", 1.0)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    config.require_string("backtest", "instrument")?;
    validate_timeframe(config, "backtest")?;
    validate_positive(config, "backtest", "bankroll", 10_000.0)?;
    Ok(())
}

pub fn validate_live_config(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    config.require_string("live", "instrument")?;
    validate_timeframe(config, "live")?;
    validate_positive(config, "live", "bankroll", 10_000.0)?;
    validate_source(config)?;

    for (key, default) in [("window", DEFAULT_WINDOW), ("fetch_limit", 5), ("init_retries", 3)] {
        if config.get_count("live", key, default)? == 0 {
            return Err(ZoneTraderError::invalid("live", key, format!("{key} must be at least 1")));
        }
    }
    validate_window(config)?;
    config.get_count("live", "max_fetch_failures", 5)?;
    if config.get_string("live", "max_ticks").is_some() && config.get_count("live", "max_ticks", 0)? == 0 {
        return Err(ZoneTraderError::invalid("live", "max_ticks", "max_ticks must be at least 1"));
    }
    Ok(())
}

/// The trimmed window must still cover the strategy's warm-up floor, or
/// entries stay blocked after every trim.
fn validate_window(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    let defaults = StrategyConfig::default();
    let strategy = StrategyConfig {
        swing_length: config.get_count("strategy", "swing_length", defaults.swing_length)?,
        slow_ma: config.get_count("strategy", "slow_ma", defaults.slow_ma)?,
        ..defaults
    };
    let window = config.get_count("live", "window", DEFAULT_WINDOW)?;
    let retained = retained_on_trim(window);
    let floor = strategy.warmup_floor();
    if retained < floor {
        return Err(ZoneTraderError::invalid(
            "live",
            "window",
            format!("window {window} keeps {retained} candles after trimming, below the warm-up floor of {floor}"),
        ));
    }
    Ok(())
}

fn validate_swing_length(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    let value = config.get_int("strategy", "swing_length", 5);
    if value < 1 {
        return Err(ZoneTraderError::invalid(
            "strategy",
            "swing_length",
            "swing_length must be at least 1",
        ));
    }
    Ok(())
}

fn validate_ma_periods(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    let fast = config.get_int("strategy", "fast_ma", 9);
    let slow = config.get_int("strategy", "slow_ma", 21);
    if fast < 1 {
        return Err(ZoneTraderError::invalid("strategy", "fast_ma", "fast_ma must be at least 1"));
    }
    if slow < 1 {
        return Err(ZoneTraderError::invalid("strategy", "slow_ma", "slow_ma must be at least 1"));
    }
    if fast >= slow {
        return Err(ZoneTraderError::invalid(
            "strategy",
            "fast_ma",
            format!("fast_ma ({fast}) must be shorter than slow_ma ({slow})"),
        ));
    }
    Ok(())
}

fn validate_ma_type(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    if let Some(value) = config.get_string("strategy", "ma_type") {
        MaKind::from_str(&value).map_err(|reason| ZoneTraderError::invalid("strategy", "ma_type", reason))?;
    }
    Ok(())
}

fn validate_sl_distance(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    let value = config.get_double("strategy", "sl_distance", 0.0);
    if value < 0.0 || !value.is_finite() {
        return Err(ZoneTraderError::invalid(
            "strategy",
            "sl_distance",
            "sl_distance must be non-negative",
        ));
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    let risk = config.get_double("strategy", "risk_percent", 0.01);
    if !(0.0..=1.0).contains(&risk) {
        return Err(ZoneTraderError::invalid(
            "strategy",
            "risk_percent",
            "risk_percent must be between 0 and 1",
        ));
    }
    validate_positive(config, "strategy", "risk_reward", 2.0)
}

fn validate_positive(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<(), ZoneTraderError> {
    let value = config.get_double(section, key, default);
    if !(value > 0.0) || !value.is_finite() {
        return Err(ZoneTraderError::invalid(section, key, format!("{key} must be positive")));
    }
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort, section: &str) -> Result<(), ZoneTraderError> {
    let value = config.require_string(section, "timeframe")?;
    Timeframe::from_str(&value)?;
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), ZoneTraderError> {
    let source = config.get_string("live", "source").unwrap_or_else(|| "csv".to_string());
    let source = source.trim().to_lowercase();
    if !SOURCE_KINDS.contains(&source.as_str()) {
        return Err(ZoneTraderError::invalid(
            "live",
            "source",
            format!("unknown source '{source}', expected one of {}", SOURCE_KINDS.join(", ")),
        ));
    }
    if source != "sqlite" {
        config.require_string("live", "data")?;
    }
    Ok(())
}
