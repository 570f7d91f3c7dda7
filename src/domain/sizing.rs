//! Stop, target and position size calculation.
//!
//! Size is driven by the fraction of price between entry and stop: risking
//! `balance * risk_percent` over that fraction gives the notional, capped by
//! `balance * leverage`, then floored to whole contracts.

use super::position::Side;

/// ATR multiple used for the stop when no swing is available.
pub const ATR_STOP_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSize {
    pub contracts: f64,
    pub notional: f64,
    pub risk_amount: f64,
}

/// Stop price for a new position. `swing` is the last swing low for longs
/// and the last swing high for shorts.
pub fn stop_loss_price(side: Side, entry: f64, swing: Option<f64>, sl_distance: f64, atr: f64) -> f64 {
    match (side, swing) {
        (Side::Long, Some(low)) => low - sl_distance,
        (Side::Long, None) => entry - atr * ATR_STOP_MULTIPLIER,
        (Side::Short, Some(high)) => high + sl_distance,
        (Side::Short, None) => entry + atr * ATR_STOP_MULTIPLIER,
    }
}

pub fn take_profit_price(side: Side, entry: f64, stop: f64, risk_reward: f64) -> f64 {
    entry + side.sign() * (entry - stop).abs() * risk_reward
}

/// Contracts to trade, or `None` when the computation yields nothing
/// tradeable (zero or NaN stop distance, zero risk, or less than one
/// contract). The distance is absolute, so a stop beyond entry still sizes.
pub fn position_size(
    balance: f64,
    risk_percent: f64,
    leverage: f64,
    contract_value: f64,
    entry: f64,
    stop: f64,
) -> Option<PositionSize> {
    let stop_fraction = (entry - stop).abs() / entry;
    if !(stop_fraction > 0.0) || !stop_fraction.is_finite() {
        return None;
    }

    let risk_amount = balance * risk_percent;
    let notional = (risk_amount / stop_fraction).min(balance * leverage);
    let contracts = (notional / (entry * contract_value)).floor();
    if !(contracts > 0.0) || !contracts.is_finite() {
        return None;
    }

    Some(PositionSize {
        contracts,
        notional,
        risk_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn long_stop_from_swing_low() {
        assert_eq!(stop_loss_price(Side::Long, 100.0, Some(97.0), 0.5, 2.0), 96.5);
    }

    #[test]
    fn long_stop_falls_back_to_atr() {
        assert_eq!(stop_loss_price(Side::Long, 100.0, None, 0.5, 2.0), 97.0);
    }

    #[test]
    fn short_stop_mirrors() {
        assert_eq!(stop_loss_price(Side::Short, 100.0, Some(103.0), 0.5, 2.0), 103.5);
        assert_eq!(stop_loss_price(Side::Short, 100.0, None, 0.0, 2.0), 103.0);
    }

    #[test]
    fn take_profit_scales_risk() {
        assert_eq!(take_profit_price(Side::Long, 100.0, 98.0, 2.0), 104.0);
        assert_eq!(take_profit_price(Side::Short, 100.0, 102.0, 2.0), 96.0);
    }

    #[test]
    fn stop_beyond_entry_sizes_on_distance() {
        // long at 99 with the swing-low stop at 100: 1/99 stop fraction
        let size = position_size(10_000.0, 0.01, 10.0, 1.0, 99.0, 100.0).unwrap();
        assert_relative_eq!(size.notional, 9_900.0, max_relative = 1e-12);
        assert_eq!(size.contracts, 100.0);
    }

    #[test]
    fn nan_stop_is_no_trade() {
        assert!(position_size(10_000.0, 0.01, 10.0, 1.0, 100.0, f64::NAN).is_none());
    }

    #[test]
    fn risk_bound_sizing() {
        // 2% of 10k over a 0.5% stop is 40k notional, under the 10x cap
        let size = position_size(10_000.0, 0.02, 10.0, 0.0001, 100.0, 99.5).unwrap();
        assert_relative_eq!(size.notional, 40_000.0, max_relative = 1e-12);
        assert_relative_eq!(size.risk_amount, 200.0, max_relative = 1e-12);
        assert_relative_eq!(size.contracts, 4_000_000.0, max_relative = 1e-12);
    }

    #[test]
    fn leverage_caps_notional() {
        // 50% risk over a 1% stop would be 500k; 2x leverage caps it at 20k
        let size = position_size(10_000.0, 0.5, 2.0, 1.0, 100.0, 99.0).unwrap();
        assert_relative_eq!(size.notional, 20_000.0);
        assert_eq!(size.contracts, 200.0);
    }

    #[test]
    fn zero_stop_distance_is_no_trade() {
        assert!(position_size(10_000.0, 0.02, 10.0, 1.0, 100.0, 100.0).is_none());
    }

    #[test]
    fn zero_risk_is_no_trade() {
        assert!(position_size(10_000.0, 0.0, 10.0, 1.0, 100.0, 99.0).is_none());
    }

    #[test]
    fn sub_contract_is_no_trade() {
        // notional 100 buys 0.1 of a 1000-unit contract
        assert!(position_size(1_000.0, 0.001, 1.0, 10.0, 100.0, 99.0).is_none());
    }

    #[test]
    fn contracts_are_floored() {
        // 100 risked over a 1/64 stop is 6400 notional
        let size = position_size(10_000.0, 0.01, 1.0, 1.0, 64.0, 63.0).unwrap();
        assert_eq!(size.contracts, 100.0);
        // 6400 / (64 * 3) = 33.3
        let size = position_size(10_000.0, 0.01, 1.0, 3.0, 64.0, 63.0).unwrap();
        assert_eq!(size.contracts, 33.0);
    }
}
