//! Entry and exit signal evaluation.
//!
//! Crossovers compare the current MA pair with the previous one. Any NaN in
//! the pair makes every comparison false, so no signal fires during warm-up.

use super::indicator::IndicatorSnapshot;
use super::position::{EntryReason, ExitReason, Side};
use super::zone::Zone;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub zone: Zone,
    pub bullish_cross: bool,
    pub bearish_cross: bool,
    pub is_bullish: bool,
    pub is_bearish: bool,
    pub long_entry: bool,
    pub short_entry: bool,
}

pub fn evaluate(snapshot: &IndicatorSnapshot, zone: Zone, allow_trend_continuation: bool) -> Signal {
    let IndicatorSnapshot {
        fast,
        slow,
        prev_fast,
        prev_slow,
        ..
    } = *snapshot;

    let bullish_cross = prev_fast <= prev_slow && fast > slow;
    let bearish_cross = prev_fast >= prev_slow && fast < slow;
    let is_bullish = fast > slow;
    let is_bearish = fast < slow;

    let long_entry =
        zone == Zone::Discount && (bullish_cross || (is_bullish && allow_trend_continuation));
    let short_entry =
        zone == Zone::Premium && (bearish_cross || (is_bearish && allow_trend_continuation));

    Signal {
        zone,
        bullish_cross,
        bearish_cross,
        is_bullish,
        is_bearish,
        long_entry,
        short_entry,
    }
}

impl Signal {
    /// The entry to take, if any. Long is checked first, although the zone
    /// gates make both firing at once impossible.
    pub fn entry(&self) -> Option<(Side, EntryReason)> {
        if self.long_entry {
            let reason = if self.bullish_cross {
                EntryReason::Crossover
            } else {
                EntryReason::Continuation
            };
            Some((Side::Long, reason))
        } else if self.short_entry {
            let reason = if self.bearish_cross {
                EntryReason::Crossover
            } else {
                EntryReason::Continuation
            };
            Some((Side::Short, reason))
        } else {
            None
        }
    }

    /// Signal-driven exit for an open `side`. Trend reversal wins over a zone
    /// change when both apply.
    pub fn exit_reason(&self, side: Side, exit_on_zone_change: bool) -> Option<ExitReason> {
        let (reversed, opposite_zone) = match side {
            Side::Long => (self.is_bearish, Zone::Premium),
            Side::Short => (self.is_bullish, Zone::Discount),
        };
        if reversed {
            Some(ExitReason::TrendReversal)
        } else if exit_on_zone_change && self.zone == opposite_zone {
            Some(ExitReason::ZoneChange)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            fast,
            slow,
            prev_fast,
            prev_slow,
            atr: 1.0,
        }
    }

    #[test]
    fn bullish_crossover_in_discount_goes_long() {
        let sig = evaluate(&snap(9.0, 10.0, 11.0, 10.0), Zone::Discount, false);
        assert!(sig.bullish_cross);
        assert!(sig.long_entry);
        assert_eq!(sig.entry(), Some((Side::Long, EntryReason::Crossover)));
    }

    #[test]
    fn touching_then_crossing_counts() {
        let sig = evaluate(&snap(10.0, 10.0, 10.5, 10.0), Zone::Discount, false);
        assert!(sig.bullish_cross);
    }

    #[test]
    fn crossover_in_wrong_zone_ignored() {
        let sig = evaluate(&snap(9.0, 10.0, 11.0, 10.0), Zone::Premium, false);
        assert!(sig.bullish_cross);
        assert!(!sig.long_entry);
        assert!(!sig.short_entry);
        assert_eq!(sig.entry(), None);
    }

    #[test]
    fn bearish_crossover_in_premium_goes_short() {
        let sig = evaluate(&snap(11.0, 10.0, 9.0, 10.0), Zone::Premium, false);
        assert_eq!(sig.entry(), Some((Side::Short, EntryReason::Crossover)));
    }

    #[test]
    fn continuation_requires_flag() {
        let trending = snap(11.0, 10.0, 12.0, 10.0);
        assert_eq!(evaluate(&trending, Zone::Discount, false).entry(), None);
        assert_eq!(
            evaluate(&trending, Zone::Discount, true).entry(),
            Some((Side::Long, EntryReason::Continuation))
        );
    }

    #[test]
    fn equilibrium_never_enters() {
        let sig = evaluate(&snap(9.0, 10.0, 11.0, 10.0), Zone::Equilibrium, true);
        assert_eq!(sig.entry(), None);
    }

    #[test]
    fn nan_suppresses_signals() {
        let sig = evaluate(&snap(f64::NAN, 10.0, 11.0, 10.0), Zone::Discount, false);
        assert!(!sig.bullish_cross);
        assert!(sig.is_bullish);
        assert!(!sig.long_entry);

        let sig = evaluate(&snap(9.0, 10.0, f64::NAN, 10.0), Zone::Discount, true);
        assert!(!sig.is_bullish && !sig.is_bearish);
        assert_eq!(sig.entry(), None);
    }

    #[test]
    fn trend_reversal_exit() {
        let sig = evaluate(&snap(11.0, 10.0, 9.0, 10.0), Zone::Discount, false);
        assert_eq!(sig.exit_reason(Side::Long, false), Some(ExitReason::TrendReversal));
        assert_eq!(sig.exit_reason(Side::Short, false), None);
    }

    #[test]
    fn zone_change_exit_is_opt_in() {
        let sig = evaluate(&snap(10.0, 9.0, 11.0, 9.0), Zone::Premium, false);
        assert_eq!(sig.exit_reason(Side::Long, false), None);
        assert_eq!(sig.exit_reason(Side::Long, true), Some(ExitReason::ZoneChange));
    }

    #[test]
    fn reversal_beats_zone_change() {
        let sig = evaluate(&snap(9.0, 10.0, 11.0, 10.0), Zone::Discount, false);
        assert_eq!(sig.exit_reason(Side::Short, true), Some(ExitReason::TrendReversal));
    }
}
