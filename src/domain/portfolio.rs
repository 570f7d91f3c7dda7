//! Account state: balance, drawdown watermark, the open position and the
//! equity curve.

use serde::Serialize;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub balance: f64,
    pub drawdown: f64,
    pub drawdown_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub initial_balance: f64,
    pub balance: f64,
    pub peak_balance: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    trade_count: u32,
}

impl Portfolio {
    pub fn new(initial_balance: f64) -> Self {
        Portfolio {
            initial_balance,
            balance: initial_balance,
            peak_balance: initial_balance,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
            trade_count: 0,
        }
    }

    /// Resumes from a persisted balance. The watermark starts at the larger
    /// of the two so drawdown never goes negative. Trade numbering continues
    /// after `last_trade_number`.
    pub fn resume(initial_balance: f64, balance: f64, last_trade_number: u32) -> Self {
        Portfolio {
            balance,
            peak_balance: initial_balance.max(balance),
            trade_count: last_trade_number,
            ..Portfolio::new(initial_balance)
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Installs `position` if no position is open. Returns false otherwise.
    pub fn open(&mut self, position: Position) -> bool {
        if self.position.is_some() {
            return false;
        }
        self.position = Some(position);
        true
    }

    pub fn take_position(&mut self) -> Option<Position> {
        self.position.take()
    }

    /// Books `pnl` against the balance and returns the new balance.
    pub fn apply_pnl(&mut self, pnl: f64) -> f64 {
        self.balance += pnl;
        self.peak_balance = self.peak_balance.max(self.balance);
        self.balance
    }

    pub fn drawdown(&self) -> f64 {
        self.peak_balance - self.balance
    }

    pub fn drawdown_percent(&self) -> f64 {
        if self.peak_balance > 0.0 {
            self.drawdown() / self.peak_balance * 100.0
        } else {
            0.0
        }
    }

    pub fn realized_pnl(&self) -> f64 {
        self.balance - self.initial_balance
    }

    /// Number the next closed trade will carry.
    pub fn next_trade_number(&self) -> u32 {
        self.trade_count + 1
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.trade_count = self.trade_count.max(trade.number);
        self.closed_trades.push(trade);
    }

    /// Appends an equity sample. A second sample at the same timestamp
    /// replaces the first; older timestamps are ignored.
    pub fn record_equity(&mut self, timestamp: i64) {
        let point = EquityPoint {
            timestamp,
            balance: self.balance,
            drawdown: self.drawdown(),
            drawdown_percent: self.drawdown_percent(),
        };
        match self.equity_curve.last_mut() {
            Some(last) if last.timestamp == timestamp => *last = point,
            Some(last) if last.timestamp > timestamp => {}
            _ => self.equity_curve.push(point),
        }
    }
}
