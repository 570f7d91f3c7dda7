//! Domain error types.

/// Top-level error type for zonetrader.
#[derive(Debug, thiserror::Error)]
pub enum ZoneTraderError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unsupported timeframe: {value}")]
    UnsupportedTimeframe { value: String },

    #[error("insufficient data for {instrument}: have {candles} candles, need {minimum}")]
    InsufficientData {
        instrument: String,
        candles: usize,
        minimum: usize,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ZoneTraderError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ZoneTraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        ZoneTraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// Configuration errors abort initialization; everything else may be retried.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ZoneTraderError::ConfigParse { .. }
                | ZoneTraderError::ConfigMissing { .. }
                | ZoneTraderError::ConfigInvalid { .. }
                | ZoneTraderError::UnsupportedTimeframe { .. }
                | ZoneTraderError::InsufficientData { .. }
        )
    }
}

impl From<&ZoneTraderError> for std::process::ExitCode {
    fn from(err: &ZoneTraderError) -> Self {
        let code: u8 = match err {
            ZoneTraderError::Io(_) => 1,
            ZoneTraderError::ConfigParse { .. }
            | ZoneTraderError::ConfigMissing { .. }
            | ZoneTraderError::ConfigInvalid { .. }
            | ZoneTraderError::UnsupportedTimeframe { .. } => 2,
            ZoneTraderError::Database { .. } | ZoneTraderError::DatabaseQuery { .. } => 3,
            ZoneTraderError::InsufficientData { .. } | ZoneTraderError::DataSource { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
