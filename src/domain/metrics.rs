//! Performance metrics over realized trades.

use std::fmt;

use super::portfolio::Portfolio;
use super::position::ClosedTrade;

/// Gross profit over gross loss. `Unbounded` stands in for a run with
/// winners and no losing P&L.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    Finite(f64),
    Unbounded,
}

impl ProfitFactor {
    pub fn from_gross(gross_profit: f64, gross_loss: f64) -> Self {
        if gross_loss > 0.0 {
            ProfitFactor::Finite(gross_profit / gross_loss)
        } else if gross_profit > 0.0 {
            ProfitFactor::Unbounded
        } else {
            ProfitFactor::Finite(0.0)
        }
    }

    /// Finite value, or `None` when unbounded. Storage layers write NULL.
    pub fn value(&self) -> Option<f64> {
        match self {
            ProfitFactor::Finite(v) => Some(*v),
            ProfitFactor::Unbounded => None,
        }
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{v:.2}"),
            ProfitFactor::Unbounded => f.write_str("unbounded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub wins: usize,
    /// Includes break-even trades.
    pub losses: usize,
    pub win_rate: f64,
    pub profit_factor: ProfitFactor,
    /// Largest per-trade drawdown recorded at close, in currency.
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    pub total_pnl: f64,
    pub return_percent: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_r_multiple: f64,
}

impl Metrics {
    pub fn compute(initial_balance: f64, final_balance: f64, trades: &[ClosedTrade]) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut max_drawdown = 0.0_f64;
        let mut max_drawdown_percent = 0.0_f64;
        let mut r_total = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if trade.is_win() {
                wins += 1;
                gross_profit += pnl;
                largest_win = largest_win.max(pnl);
            } else {
                losses += 1;
                gross_loss += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
            max_drawdown = max_drawdown.max(trade.drawdown);
            max_drawdown_percent = max_drawdown_percent.max(trade.drawdown_percent);
            r_total += trade.r_multiple;
        }

        let total_trades = trades.len();
        let ratio = |num: f64, den: usize| if den > 0 { num / den as f64 } else { 0.0 };

        let total_pnl = final_balance - initial_balance;
        let return_percent = if initial_balance > 0.0 {
            total_pnl / initial_balance * 100.0
        } else {
            0.0
        };

        Metrics {
            total_trades,
            wins,
            losses,
            win_rate: ratio(wins as f64, total_trades),
            profit_factor: ProfitFactor::from_gross(gross_profit, gross_loss),
            max_drawdown,
            max_drawdown_percent,
            sharpe_ratio: sharpe_ratio(trades),
            total_pnl,
            return_percent,
            gross_profit,
            gross_loss,
            avg_win: ratio(gross_profit, wins),
            avg_loss: ratio(gross_loss, losses),
            largest_win,
            largest_loss,
            avg_r_multiple: ratio(r_total, total_trades),
        }
    }

    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        Metrics::compute(
            portfolio.initial_balance,
            portfolio.balance,
            &portfolio.closed_trades,
        )
    }
}

/// Mean over sample standard deviation of per-trade percent returns. Zero
/// with fewer than two trades or no variance.
fn sharpe_ratio(trades: &[ClosedTrade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let n = trades.len() as f64;
    let mean = trades.iter().map(|t| t.pnl_percent).sum::<f64>() / n;
    let variance = trades
        .iter()
        .map(|t| (t.pnl_percent - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let stddev = variance.sqrt();
    if stddev > 0.0 { mean / stddev } else { 0.0 }
}
