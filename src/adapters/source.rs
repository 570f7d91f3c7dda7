//! Selection of the candle source a live run polls, from `[live] source`.

use std::path::PathBuf;

use crate::adapters::csv_adapter::{CsvAdapter, ReplaySource};
use crate::domain::error::ZoneTraderError;
use crate::ports::candle_port::CandleSource;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Re-reads a CSV file (or directory) on every poll.
    Csv(PathBuf),
    /// Steps through a CSV history one candle per poll.
    Replay { path: PathBuf, initial: usize },
    /// Reads the `candles` table of the configured database.
    Sqlite,
}

impl DataSource {
    /// `initial` is the number of candles a replay reveals on its first poll.
    pub fn from_config(config: &dyn ConfigPort, initial: usize) -> Result<Self, ZoneTraderError> {
        let kind = config
            .get_string("live", "source")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "csv".to_string());

        match kind.as_str() {
            "csv" => Ok(DataSource::Csv(config.require_string("live", "data")?.into())),
            "replay" => Ok(DataSource::Replay {
                path: config.require_string("live", "data")?.into(),
                initial: config.get_count("live", "replay_initial", initial)?,
            }),
            "sqlite" => Ok(DataSource::Sqlite),
            other => Err(ZoneTraderError::invalid(
                "live",
                "source",
                format!("unknown source '{other}'"),
            )),
        }
    }

    pub fn open(&self, config: &dyn ConfigPort) -> Result<Box<dyn CandleSource>, ZoneTraderError> {
        match self {
            DataSource::Csv(path) => Ok(Box::new(CsvAdapter::new(path.clone()))),
            DataSource::Replay { path, initial } => Ok(Box::new(ReplaySource::from_csv(path, *initial)?)),
            #[cfg(feature = "sqlite")]
            DataSource::Sqlite => Ok(Box::new(crate::adapters::sqlite_adapter::SqliteAdapter::from_config(
                config,
            )?)),
            #[cfg(not(feature = "sqlite"))]
            DataSource::Sqlite => {
                let _ = config;
                Err(ZoneTraderError::invalid(
                    "live",
                    "source",
                    "built without sqlite support",
                ))
            }
        }
    }
}
