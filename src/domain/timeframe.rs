//! Candle timeframes and the polling cadence derived from them.

use crate::domain::error::ZoneTraderError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    D1,
}

impl Timeframe {
    pub fn minutes(&self) -> u64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M3 => 3,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H2 => 120,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Interval between polls of the data source.
    ///
    /// A quarter of the bar length, clamped to [15s, 5min], so a poll
    /// always finishes well before the next one is due.
    pub fn poll_interval(&self) -> Duration {
        (self.duration() / 4).clamp(Duration::from_secs(15), Duration::from_secs(300))
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl FromStr for Timeframe {
    type Err = ZoneTraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Timeframe::M1),
            "3m" => Ok(Timeframe::M3),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" | "60m" => Ok(Timeframe::H1),
            "2h" => Ok(Timeframe::H2),
            "4h" => Ok(Timeframe::H4),
            "1d" | "d" => Ok(Timeframe::D1),
            _ => Err(ZoneTraderError::UnsupportedTimeframe {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for tf in [
            Timeframe::M1,
            Timeframe::M3,
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::M30,
            Timeframe::H1,
            Timeframe::H2,
            Timeframe::H4,
            Timeframe::D1,
        ] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("1H".parse::<Timeframe>().unwrap(), Timeframe::H1);
        assert_eq!(" 15m ".parse::<Timeframe>().unwrap(), Timeframe::M15);
    }

    #[test]
    fn unsupported_timeframe() {
        match "7m".parse::<Timeframe>() {
            Err(ZoneTraderError::UnsupportedTimeframe { value }) => assert_eq!(value, "7m"),
            other => panic!("expected UnsupportedTimeframe, got {other:?}"),
        }
    }

    #[test]
    fn poll_interval_is_clamped() {
        assert_eq!(Timeframe::M1.poll_interval(), Duration::from_secs(15));
        assert_eq!(Timeframe::M15.poll_interval(), Duration::from_secs(225));
        assert_eq!(Timeframe::D1.poll_interval(), Duration::from_secs(300));
    }
}
