//! Strategy parameters.

pub use super::indicator::MaKind;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Bars on each side of a pivot candidate.
    pub swing_length: usize,
    /// Buffer added beyond the swing when placing the stop.
    pub sl_distance: f64,
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub ma_kind: MaKind,
    pub risk_reward: f64,
    /// Fraction of balance risked per trade, 0.01 = 1%.
    pub risk_percent: f64,
    pub leverage: f64,
    /// Asset units per contract.
    pub contract_value: f64,
    pub allow_trend_continuation: bool,
    pub exit_on_zone_change: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            swing_length: 5,
            sl_distance: 0.0,
            fast_ma: 9,
            slow_ma: 21,
            ma_kind: MaKind::Ema,
            risk_reward: 2.0,
            risk_percent: 0.01,
            leverage: 1.0,
            contract_value: 1.0,
            allow_trend_continuation: false,
            exit_on_zone_change: false,
        }
    }
}

impl StrategyConfig {
    /// Fewest candles a run needs: a full swing window, and one bar past the
    /// slow MA so a previous value exists for crossover detection.
    pub fn warmup_floor(&self) -> usize {
        (2 * self.swing_length + 1).max(self.slow_ma + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = StrategyConfig::default();
        assert_eq!(c.swing_length, 5);
        assert_eq!(c.fast_ma, 9);
        assert_eq!(c.slow_ma, 21);
        assert_eq!(c.ma_kind, MaKind::Ema);
        assert!(!c.allow_trend_continuation);
        assert!(!c.exit_on_zone_change);
    }

    #[test]
    fn warmup_floor_takes_larger_requirement() {
        let c = StrategyConfig::default();
        assert_eq!(c.warmup_floor(), 22);

        let c = StrategyConfig {
            swing_length: 20,
            ..StrategyConfig::default()
        };
        assert_eq!(c.warmup_floor(), 41);
    }
}
