//! Premium / discount zone classification.
//!
//! The range spans the most recent swing high and swing low. Closes above the
//! midpoint are premium, closes below it discount.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Premium,
    Discount,
    Equilibrium,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Premium => "premium",
            Zone::Discount => "discount",
            Zone::Equilibrium => "equilibrium",
        }
    }

    pub fn parse(s: &str) -> Option<Zone> {
        match s {
            "premium" => Some(Zone::Premium),
            "discount" => Some(Zone::Discount),
            "equilibrium" => Some(Zone::Equilibrium),
            _ => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingRange {
    pub high: f64,
    pub low: f64,
}

impl SwingRange {
    pub fn new(high: f64, low: f64) -> Self {
        SwingRange { high, low }
    }

    pub fn equilibrium(&self) -> f64 {
        self.low + (self.high - self.low) * 0.5
    }
}

/// Classifies `close` against `range`. Without a complete range the zone is
/// always equilibrium.
pub fn classify(range: Option<SwingRange>, close: f64) -> Zone {
    let Some(range) = range else {
        return Zone::Equilibrium;
    };
    let eq = range.equilibrium();
    if close > eq {
        Zone::Premium
    } else if close < eq {
        Zone::Discount
    } else {
        Zone::Equilibrium
    }
}
