//! CLI integration tests: INI and CSV fixtures on disk, dispatched through
//! `cli::run`.

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;
use zonetrader::cli::{self, Cli};

fn write_candles_csv(dir: &TempDir, name: &str) -> PathBuf {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for c in rally_dip_recovery() {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.timestamp, c.open, c.high, c.low, c.close, c.volume
        ));
    }
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn write_ini(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("zonetrader.ini");
    fs::write(&path, content).unwrap();
    path
}

const STRATEGY: &str = "
[strategy]
swing_length = 2
fast_ma = 3
slow_ma = 5
ma_type = sma
risk_reward = 2
risk_percent = 0.01
";

fn run(args: &[&str]) -> ExitCode {
    cli::run(Cli::try_parse_from(args).unwrap())
}

// ExitCode has no PartialEq, so compare the debug form.
fn assert_exit(actual: ExitCode, expected: ExitCode) {
    assert_eq!(format!("{actual:?}"), format!("{expected:?}"));
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

mod validate {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(
            &dir,
            &format!("{STRATEGY}\n[backtest]\ninstrument = BTCUSDT\ntimeframe = 1m\ndata = x.csv\n"),
        );
        assert_exit(run(&["zonetrader", "validate", "-c", arg(&ini)]), ExitCode::SUCCESS);
    }

    #[test]
    fn bad_ma_pair_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(&dir, "[strategy]\nfast_ma = 30\nslow_ma = 10\n");
        assert_exit(run(&["zonetrader", "validate", "-c", arg(&ini)]), ExitCode::from(2));
    }

    #[test]
    fn bad_live_section_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(
            &dir,
            &format!("{STRATEGY}\n[live]\ninstrument = BTCUSDT\ntimeframe = 2w\nsource = csv\ndata = x.csv\n"),
        );
        assert_exit(run(&["zonetrader", "validate", "-c", arg(&ini)]), ExitCode::from(2));
    }

    #[test]
    fn missing_file_is_config_error() {
        assert_exit(
            run(&["zonetrader", "validate", "-c", "/nonexistent/zonetrader.ini"]),
            ExitCode::from(2),
        );
    }
}

mod backtest {
    use super::*;

    #[test]
    fn writes_trade_and_equity_exports() {
        let dir = TempDir::new().unwrap();
        let data = write_candles_csv(&dir, "btc.csv");
        let ini = write_ini(
            &dir,
            &format!(
                "{STRATEGY}\n[backtest]\ninstrument = BTCUSDT\ntimeframe = 1m\nbankroll = 10000\ndata = {}\n",
                data.display()
            ),
        );
        let trades = dir.path().join("trades.csv");
        let equity = dir.path().join("equity.csv");

        let code = run(&[
            "zonetrader",
            "backtest",
            "-c",
            arg(&ini),
            "--trades-csv",
            arg(&trades),
            "--equity-csv",
            arg(&equity),
        ]);
        assert_exit(code, ExitCode::SUCCESS);

        let ledger = fs::read_to_string(&trades).unwrap();
        let mut lines = ledger.lines();
        assert!(lines.next().unwrap().starts_with("number,side,size"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,long,"));
        assert!(row.contains("end_of_data"));
        assert!(lines.next().is_none());

        assert!(fs::read_to_string(&equity).unwrap().lines().count() >= 2);
    }

    #[test]
    fn data_flag_overrides_config() {
        let dir = TempDir::new().unwrap();
        let data = write_candles_csv(&dir, "other.csv");
        let ini = write_ini(
            &dir,
            &format!("{STRATEGY}\n[backtest]\ninstrument = BTCUSDT\ntimeframe = 1m\ndata = /nonexistent.csv\n"),
        );
        assert_exit(
            run(&["zonetrader", "backtest", "-c", arg(&ini), "-d", arg(&data)]),
            ExitCode::SUCCESS,
        );
    }

    #[test]
    fn too_few_candles_is_data_error() {
        let dir = TempDir::new().unwrap();
        let data = write_candles_csv(&dir, "btc.csv");
        let ini = write_ini(
            &dir,
            &format!(
                "[strategy]\nslow_ma = 50\n\n[backtest]\ninstrument = BTCUSDT\ntimeframe = 1m\ndata = {}\n",
                data.display()
            ),
        );
        assert_exit(run(&["zonetrader", "backtest", "-c", arg(&ini)]), ExitCode::from(5));
    }

    #[test]
    fn missing_data_file_is_data_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(
            &dir,
            &format!("{STRATEGY}\n[backtest]\ninstrument = BTCUSDT\ntimeframe = 1m\ndata = /nonexistent.csv\n"),
        );
        assert_exit(run(&["zonetrader", "backtest", "-c", arg(&ini)]), ExitCode::from(5));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn stores_result_in_sqlite() {
        use zonetrader::adapters::file_config_adapter::FileConfigAdapter;
        use zonetrader::adapters::sqlite_adapter::SqliteAdapter;

        let dir = TempDir::new().unwrap();
        let data = write_candles_csv(&dir, "btc.csv");
        let db = dir.path().join("results.db");
        let sqlite = format!("[sqlite]\npath = {}\n", db.display());
        let ini = write_ini(
            &dir,
            &format!(
                "{STRATEGY}\n[backtest]\ninstrument = BTCUSDT\ntimeframe = 1m\ndata = {}\nstore = true\n\n{sqlite}",
                data.display()
            ),
        );
        assert_exit(run(&["zonetrader", "backtest", "-c", arg(&ini)]), ExitCode::SUCCESS);

        let adapter = SqliteAdapter::from_config(&FileConfigAdapter::from_string(&sqlite).unwrap()).unwrap();
        let (trades, equity) = adapter.stored_result_rows(1).unwrap();
        assert_eq!(trades, 1);
        assert_eq!(equity, 1);
    }
}

mod live {
    use super::*;

    fn live_ini(dir: &TempDir, extra: &str) -> PathBuf {
        let data = write_candles_csv(dir, "replay.csv");
        write_ini(
            dir,
            &format!(
                "{STRATEGY}\n[live]\ninstrument = BTCUSDT\ntimeframe = 1m\nsource = replay\ndata = {}\n\
                 replay_initial = 15\nmax_ticks = 6\n{extra}",
                data.display()
            ),
        )
    }

    #[test]
    fn replay_session_runs_to_max_ticks() {
        let dir = TempDir::new().unwrap();
        let ini = live_ini(&dir, "");
        assert_exit(run(&["zonetrader", "live", "-c", arg(&ini)]), ExitCode::SUCCESS);
    }

    #[test]
    fn max_ticks_flag_is_accepted() {
        let dir = TempDir::new().unwrap();
        let ini = live_ini(&dir, "");
        assert_exit(
            run(&["zonetrader", "live", "-c", arg(&ini), "--max-ticks", "2"]),
            ExitCode::SUCCESS,
        );
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn replay_session_persists_open_trade() {
        use zonetrader::adapters::file_config_adapter::FileConfigAdapter;
        use zonetrader::adapters::sqlite_adapter::SqliteAdapter;
        use zonetrader::ports::session_port::SessionStore;

        let dir = TempDir::new().unwrap();
        let db = dir.path().join("live.db");
        let sqlite = format!("[sqlite]\npath = {}\n", db.display());
        let ini = live_ini(&dir, &format!("session = paper\n\n{sqlite}"));
        assert_exit(run(&["zonetrader", "live", "-c", arg(&ini)]), ExitCode::SUCCESS);

        let adapter = SqliteAdapter::from_config(&FileConfigAdapter::from_string(&sqlite).unwrap()).unwrap();
        let open = adapter.load_open_trade("paper").unwrap().unwrap();
        assert_eq!(open.entry_price, 103.0);
        assert_eq!(adapter.load_session_balance("paper").unwrap(), Some(10_000.0));
    }

    #[test]
    fn unknown_source_is_config_error() {
        let dir = TempDir::new().unwrap();
        let ini = write_ini(
            &dir,
            &format!("{STRATEGY}\n[live]\ninstrument = BTCUSDT\ntimeframe = 1m\nsource = ftp\n"),
        );
        assert_exit(run(&["zonetrader", "live", "-c", arg(&ini)]), ExitCode::from(2));
    }
}
