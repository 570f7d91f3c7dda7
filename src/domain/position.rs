//! Open positions and closed trade records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::zone::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "long" => Some(Side::Long),
            "short" => Some(Side::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryReason {
    Crossover,
    Continuation,
}

impl EntryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryReason::Crossover => "crossover",
            EntryReason::Continuation => "continuation",
        }
    }

    pub fn parse(s: &str) -> Option<EntryReason> {
        match s {
            "crossover" => Some(EntryReason::Crossover),
            "continuation" => Some(EntryReason::Continuation),
            _ => None,
        }
    }
}

impl fmt::Display for EntryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    #[serde(rename = "sl")]
    StopLoss,
    #[serde(rename = "tp")]
    TakeProfit,
    TrendReversal,
    ZoneChange,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "sl",
            ExitReason::TakeProfit => "tp",
            ExitReason::TrendReversal => "trend_reversal",
            ExitReason::ZoneChange => "zone_change",
            ExitReason::EndOfData => "end_of_data",
        }
    }

    pub fn parse(s: &str) -> Option<ExitReason> {
        match s {
            "sl" => Some(ExitReason::StopLoss),
            "tp" => Some(ExitReason::TakeProfit),
            "trend_reversal" => Some(ExitReason::TrendReversal),
            "zone_change" => Some(ExitReason::ZoneChange),
            "end_of_data" => Some(ExitReason::EndOfData),
            _ => None,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open trade. `size` is in contracts and is always positive; direction
/// lives in `side`.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub size: f64,
    pub entry_price: f64,
    pub entry_time: i64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_zone: Zone,
    pub entry_reason: EntryReason,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub atr: f64,
}

impl Position {
    /// Units of the underlying held: contracts times contract value.
    pub fn asset_size(&self, contract_value: f64) -> f64 {
        self.size * contract_value
    }

    /// Distance from entry to stop, the per-unit risk taken.
    pub fn risk_per_unit(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }

    /// P&L of closing at `price`.
    pub fn unrealized_pnl(&self, price: f64, contract_value: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.asset_size(contract_value)
    }

    /// Whether the candle's range touched the stop. Longs test the low,
    /// shorts the high.
    pub fn should_stop_loss(&self, candle: &Candle) -> bool {
        match self.side {
            Side::Long => candle.low <= self.stop_loss,
            Side::Short => candle.high >= self.stop_loss,
        }
    }

    pub fn should_take_profit(&self, candle: &Candle) -> bool {
        match self.side {
            Side::Long => candle.high >= self.take_profit,
            Side::Short => candle.low <= self.take_profit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub number: u32,
    pub side: Side,
    pub size: f64,
    pub entry_time: i64,
    pub exit_time: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub entry_zone: Zone,
    pub exit_zone: Zone,
    pub entry_reason: EntryReason,
    pub exit_reason: ExitReason,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub r_multiple: f64,
    pub running_balance: f64,
    pub running_pnl: f64,
    pub drawdown: f64,
    pub drawdown_percent: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub atr: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
