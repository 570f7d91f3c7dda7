//! SQLite adapter: candle storage and source, live session persistence, and
//! backtest result storage.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::domain::backtest::BacktestResult;
use crate::domain::candle::Candle;
use crate::domain::error::ZoneTraderError;
use crate::domain::position::{ClosedTrade, EntryReason, Position, Side};
use crate::domain::timeframe::Timeframe;
use crate::domain::zone::Zone;
use crate::ports::candle_port::CandleSource;
use crate::ports::config_port::ConfigPort;
use crate::ports::result_port::ResultSink;
use crate::ports::session_port::SessionStore;

/// Rows written per transaction when storing backtest trades and equity.
pub const RESULT_BATCH_SIZE: usize = 500;

#[derive(Clone)]
pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> ZoneTraderError {
    ZoneTraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn decode_err(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        format!("unrecognised value '{value}'").into(),
    )
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ZoneTraderError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| ZoneTraderError::missing("sqlite", "path"))?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| ZoneTraderError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, ZoneTraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ZoneTraderError::Database {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ZoneTraderError> {
        self.pool.get().map_err(|e: r2d2::Error| ZoneTraderError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), ZoneTraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS candles (
                    instrument TEXT NOT NULL,
                    timeframe TEXT NOT NULL,
                    timestamp INTEGER NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    PRIMARY KEY (instrument, timeframe, timestamp)
                );
                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    balance REAL NOT NULL
                );
                CREATE TABLE IF NOT EXISTS trades (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session TEXT NOT NULL,
                    status TEXT NOT NULL,
                    side TEXT NOT NULL,
                    size REAL NOT NULL,
                    entry_price REAL NOT NULL,
                    entry_time INTEGER NOT NULL,
                    stop_loss REAL NOT NULL,
                    take_profit REAL NOT NULL,
                    entry_zone TEXT NOT NULL,
                    entry_reason TEXT NOT NULL,
                    fast_ma REAL,
                    slow_ma REAL,
                    atr REAL,
                    number INTEGER,
                    exit_price REAL,
                    exit_time INTEGER,
                    exit_zone TEXT,
                    exit_reason TEXT,
                    pnl REAL,
                    pnl_percent REAL,
                    r_multiple REAL
                );
                CREATE INDEX IF NOT EXISTS idx_trades_session ON trades(session, status);
                CREATE TABLE IF NOT EXISTS backtest_runs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    instrument TEXT NOT NULL,
                    timeframe TEXT NOT NULL,
                    status TEXT NOT NULL,
                    failure_reason TEXT,
                    swing_length INTEGER NOT NULL,
                    fast_ma INTEGER NOT NULL,
                    slow_ma INTEGER NOT NULL,
                    ma_type TEXT NOT NULL,
                    risk_reward REAL NOT NULL,
                    risk_percent REAL NOT NULL,
                    leverage REAL NOT NULL,
                    initial_balance REAL NOT NULL,
                    final_balance REAL NOT NULL,
                    total_trades INTEGER NOT NULL,
                    win_rate REAL NOT NULL,
                    profit_factor REAL,
                    max_drawdown REAL NOT NULL,
                    sharpe_ratio REAL NOT NULL,
                    total_pnl REAL NOT NULL,
                    candle_count INTEGER NOT NULL,
                    execution_ms INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS backtest_trades (
                    run_id INTEGER NOT NULL REFERENCES backtest_runs(id),
                    number INTEGER NOT NULL,
                    side TEXT NOT NULL,
                    size REAL NOT NULL,
                    entry_time INTEGER NOT NULL,
                    exit_time INTEGER NOT NULL,
                    entry_price REAL NOT NULL,
                    exit_price REAL NOT NULL,
                    stop_loss REAL NOT NULL,
                    take_profit REAL NOT NULL,
                    entry_zone TEXT NOT NULL,
                    exit_zone TEXT NOT NULL,
                    entry_reason TEXT NOT NULL,
                    exit_reason TEXT NOT NULL,
                    pnl REAL NOT NULL,
                    pnl_percent REAL NOT NULL,
                    r_multiple REAL NOT NULL,
                    running_balance REAL NOT NULL,
                    drawdown REAL NOT NULL,
                    PRIMARY KEY (run_id, number)
                );
                CREATE TABLE IF NOT EXISTS backtest_equity (
                    run_id INTEGER NOT NULL REFERENCES backtest_runs(id),
                    timestamp INTEGER NOT NULL,
                    balance REAL NOT NULL,
                    drawdown REAL NOT NULL,
                    drawdown_percent REAL NOT NULL,
                    PRIMARY KEY (run_id, timestamp)
                );",
            )
            .map_err(query_err)
    }

    pub fn insert_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<(), ZoneTraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO candles
                     (instrument, timeframe, timestamp, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(query_err)?;
            for c in candles {
                stmt.execute(params![
                    instrument,
                    timeframe.as_str(),
                    c.timestamp,
                    c.open,
                    c.high,
                    c.low,
                    c.close,
                    c.volume
                ])
                .map_err(query_err)?;
            }
        }
        tx.commit().map_err(query_err)
    }

    /// P&L of every closed trade recorded for `session`, oldest first.
    pub fn closed_trade_pnls(&self, session: &str) -> Result<Vec<f64>, ZoneTraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT pnl FROM trades WHERE session = ?1 AND status = 'closed' ORDER BY id")
            .map_err(query_err)?;
        let rows = stmt
            .query_map(params![session], |row| row.get(0))
            .map_err(query_err)?;
        rows.collect::<Result<Vec<f64>, _>>().map_err(query_err)
    }

    /// Trade and equity row counts stored for backtest `run_id`.
    pub fn stored_result_rows(&self, run_id: i64) -> Result<(usize, usize), ZoneTraderError> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<usize, ZoneTraderError> {
            let sql = format!("SELECT COUNT(*) FROM {table} WHERE run_id = ?1");
            let n: i64 = conn
                .query_row(&sql, params![run_id], |row| row.get(0))
                .map_err(query_err)?;
            Ok(n as usize)
        };
        Ok((count("backtest_trades")?, count("backtest_equity")?))
    }
}

impl CandleSource for SqliteAdapter {
    fn get_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ZoneTraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT timestamp, open, high, low, close, volume
                 FROM candles
                 WHERE instrument = ?1 AND timeframe = ?2
                 ORDER BY timestamp DESC
                 LIMIT ?3",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![instrument, timeframe.as_str(), limit as i64], |row| {
                Ok(Candle {
                    timestamp: row.get(0)?,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(query_err)?;

        let mut candles = rows.collect::<Result<Vec<Candle>, _>>().map_err(query_err)?;
        candles.reverse();
        Ok(candles)
    }
}

impl SessionStore for SqliteAdapter {
    fn load_session_balance(&self, session: &str) -> Result<Option<f64>, ZoneTraderError> {
        self.conn()?
            .query_row(
                "SELECT balance FROM sessions WHERE id = ?1",
                params![session],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_err)
    }

    fn load_last_trade_number(&self, session: &str) -> Result<u32, ZoneTraderError> {
        self.conn()?
            .query_row(
                "SELECT COALESCE(MAX(number), 0) FROM trades WHERE session = ?1 AND status = 'closed'",
                params![session],
                |row| row.get(0),
            )
            .map_err(query_err)
    }

    fn load_open_trade(&self, session: &str) -> Result<Option<Position>, ZoneTraderError> {
        self.conn()?
            .query_row(
                "SELECT side, size, entry_price, entry_time, stop_loss, take_profit,
                        entry_zone, entry_reason, fast_ma, slow_ma, atr
                 FROM trades
                 WHERE session = ?1 AND status = 'open'
                 ORDER BY id DESC
                 LIMIT 1",
                params![session],
                |row| {
                    let side: String = row.get(0)?;
                    let zone: String = row.get(6)?;
                    let reason: String = row.get(7)?;
                    Ok(Position {
                        side: Side::parse(&side).ok_or_else(|| decode_err(0, &side))?,
                        size: row.get(1)?,
                        entry_price: row.get(2)?,
                        entry_time: row.get(3)?,
                        stop_loss: row.get(4)?,
                        take_profit: row.get(5)?,
                        entry_zone: Zone::parse(&zone).ok_or_else(|| decode_err(6, &zone))?,
                        entry_reason: EntryReason::parse(&reason).ok_or_else(|| decode_err(7, &reason))?,
                        fast_ma: row.get::<_, Option<f64>>(8)?.unwrap_or(f64::NAN),
                        slow_ma: row.get::<_, Option<f64>>(9)?.unwrap_or(f64::NAN),
                        atr: row.get::<_, Option<f64>>(10)?.unwrap_or(f64::NAN),
                    })
                },
            )
            .optional()
            .map_err(query_err)
    }

    fn record_trade_open(&self, session: &str, position: &Position) -> Result<(), ZoneTraderError> {
        self.conn()?
            .execute(
                "INSERT INTO trades
                 (session, status, side, size, entry_price, entry_time, stop_loss, take_profit,
                  entry_zone, entry_reason, fast_ma, slow_ma, atr)
                 VALUES (?1, 'open', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    session,
                    position.side.as_str(),
                    position.size,
                    position.entry_price,
                    position.entry_time,
                    position.stop_loss,
                    position.take_profit,
                    position.entry_zone.as_str(),
                    position.entry_reason.as_str(),
                    position.fast_ma,
                    position.slow_ma,
                    position.atr
                ],
            )
            .map_err(query_err)?;
        Ok(())
    }

    /// Completes the session's open row. A close with no matching open row
    /// (the open write failed earlier) is inserted as a closed row.
    fn record_trade_close(&self, session: &str, trade: &ClosedTrade) -> Result<(), ZoneTraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        let updated = tx
            .execute(
                "UPDATE trades
                 SET status = 'closed', number = ?2, exit_price = ?3, exit_time = ?4,
                     exit_zone = ?5, exit_reason = ?6, pnl = ?7, pnl_percent = ?8, r_multiple = ?9
                 WHERE session = ?1 AND status = 'open' AND entry_time = ?10",
                params![
                    session,
                    trade.number,
                    trade.exit_price,
                    trade.exit_time,
                    trade.exit_zone.as_str(),
                    trade.exit_reason.as_str(),
                    trade.pnl,
                    trade.pnl_percent,
                    trade.r_multiple,
                    trade.entry_time
                ],
            )
            .map_err(query_err)?;

        if updated == 0 {
            tx.execute(
                "INSERT INTO trades
                 (session, status, side, size, entry_price, entry_time, stop_loss, take_profit,
                  entry_zone, entry_reason, fast_ma, slow_ma, atr, number, exit_price, exit_time,
                  exit_zone, exit_reason, pnl, pnl_percent, r_multiple)
                 VALUES (?1, 'closed', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                         ?15, ?16, ?17, ?18, ?19, ?20)",
                params![
                    session,
                    trade.side.as_str(),
                    trade.size,
                    trade.entry_price,
                    trade.entry_time,
                    trade.stop_loss,
                    trade.take_profit,
                    trade.entry_zone.as_str(),
                    trade.entry_reason.as_str(),
                    trade.fast_ma,
                    trade.slow_ma,
                    trade.atr,
                    trade.number,
                    trade.exit_price,
                    trade.exit_time,
                    trade.exit_zone.as_str(),
                    trade.exit_reason.as_str(),
                    trade.pnl,
                    trade.pnl_percent,
                    trade.r_multiple
                ],
            )
            .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    fn update_session_balance(&self, session: &str, balance: f64) -> Result<(), ZoneTraderError> {
        self.conn()?
            .execute(
                "INSERT INTO sessions (id, balance) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET balance = excluded.balance",
                params![session, balance],
            )
            .map_err(query_err)?;
        Ok(())
    }

    fn save_candles(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<(), ZoneTraderError> {
        self.insert_candles(instrument, timeframe, candles)
    }
}

impl ResultSink for SqliteAdapter {
    fn store_result(&self, result: &BacktestResult) -> Result<i64, ZoneTraderError> {
        let mut conn = self.conn()?;
        let failure = match &result.status {
            crate::domain::backtest::RunStatus::Failed { reason } => Some(reason.as_str()),
            crate::domain::backtest::RunStatus::Completed => None,
        };
        let m = &result.metrics;
        let s = &result.strategy;
        conn.execute(
            "INSERT INTO backtest_runs
             (instrument, timeframe, status, failure_reason, swing_length, fast_ma, slow_ma,
              ma_type, risk_reward, risk_percent, leverage, initial_balance, final_balance,
              total_trades, win_rate, profit_factor, max_drawdown, sharpe_ratio, total_pnl,
              candle_count, execution_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21)",
            params![
                result.instrument,
                result.timeframe.as_str(),
                result.status.as_str(),
                failure,
                s.swing_length as i64,
                s.fast_ma as i64,
                s.slow_ma as i64,
                s.ma_kind.to_string(),
                s.risk_reward,
                s.risk_percent,
                s.leverage,
                result.initial_balance,
                result.final_balance,
                m.total_trades as i64,
                m.win_rate,
                m.profit_factor.value(),
                m.max_drawdown,
                m.sharpe_ratio,
                m.total_pnl,
                result.candle_count as i64,
                result.execution_time.as_millis() as i64
            ],
        )
        .map_err(query_err)?;
        let run_id = conn.last_insert_rowid();

        for chunk in result.trades.chunks(RESULT_BATCH_SIZE) {
            let tx = conn.transaction().map_err(query_err)?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO backtest_trades
                         (run_id, number, side, size, entry_time, exit_time, entry_price,
                          exit_price, stop_loss, take_profit, entry_zone, exit_zone, entry_reason,
                          exit_reason, pnl, pnl_percent, r_multiple, running_balance, drawdown)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                                 ?15, ?16, ?17, ?18, ?19)",
                    )
                    .map_err(query_err)?;
                for t in chunk {
                    stmt.execute(params![
                        run_id,
                        t.number,
                        t.side.as_str(),
                        t.size,
                        t.entry_time,
                        t.exit_time,
                        t.entry_price,
                        t.exit_price,
                        t.stop_loss,
                        t.take_profit,
                        t.entry_zone.as_str(),
                        t.exit_zone.as_str(),
                        t.entry_reason.as_str(),
                        t.exit_reason.as_str(),
                        t.pnl,
                        t.pnl_percent,
                        t.r_multiple,
                        t.running_balance,
                        t.drawdown
                    ])
                    .map_err(query_err)?;
                }
            }
            tx.commit().map_err(query_err)?;
        }

        for chunk in result.equity_curve.chunks(RESULT_BATCH_SIZE) {
            let tx = conn.transaction().map_err(query_err)?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO backtest_equity
                         (run_id, timestamp, balance, drawdown, drawdown_percent)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                    )
                    .map_err(query_err)?;
                for p in chunk {
                    stmt.execute(params![run_id, p.timestamp, p.balance, p.drawdown, p.drawdown_percent])
                        .map_err(query_err)?;
                }
            }
            tx.commit().map_err(query_err)?;
        }

        debug!(
            run_id,
            trades = result.trades.len(),
            equity_points = result.equity_curve.len(),
            "stored backtest result"
        );
        Ok(run_id)
    }
}
