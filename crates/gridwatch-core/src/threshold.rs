// ── Threshold and staleness evaluation ──
//
// Pure functions, recomputed on every render tick. Nothing here is
// cached; the inputs are cheap and invalidation tracking is not.

use strum::{Display, EnumIter};

use crate::model::Slot;
use crate::rate::TileReading;

/// Minimum stale window regardless of poll interval.
pub const STALE_FLOOR_MS: i64 = 10_000;

/// Poll periods a tile may miss before it is flagged stale. A tunable
/// default, not a load-bearing constant.
pub const STALE_POLL_MULTIPLIER: i64 = 3;

// ── Warn evaluation ─────────────────────────────────────────────────

/// Per-direction warn flags for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarnState {
    pub rx: bool,
    pub tx: bool,
}

impl WarnState {
    pub fn any(self) -> bool {
        self.rx || self.tx
    }
}

/// Warn iff a threshold is configured, a rate is known, and the rate is
/// below the threshold. An unset threshold or an unmeasured rate never
/// warns.
pub fn warn_below(threshold_bps: Option<u64>, rate_bps: Option<u64>) -> bool {
    matches!((threshold_bps, rate_bps), (Some(t), Some(r)) if r < t)
}

/// Evaluate both directions for one slot against its current reading.
pub fn evaluate(slot: &Slot, reading: Option<&TileReading>) -> WarnState {
    WarnState {
        rx: warn_below(slot.warn_below_rx_bps, reading.and_then(|r| r.rx_bps)),
        tx: warn_below(slot.warn_below_tx_bps, reading.and_then(|r| r.tx_bps)),
    }
}

// ── Staleness ───────────────────────────────────────────────────────

/// A tile is stale when polling is live, a sample has been seen, and no
/// fresh sample arrived within `max(10 s, poll period × 3)` — tolerating
/// a missed cycle or two before flagging.
#[allow(clippy::cast_possible_wrap, clippy::as_conversions)]
pub fn is_stale(paused: bool, last_seen_ms: Option<i64>, now_ms: i64, poll_ms: u64) -> bool {
    if paused {
        return false;
    }
    let Some(seen) = last_seen_ms else {
        return false;
    };
    let window = STALE_FLOOR_MS.max(poll_ms as i64 * STALE_POLL_MULTIPLIER);
    now_ms - seen > window
}

// ── Threshold units ─────────────────────────────────────────────────

/// Human-facing unit for threshold authoring. Values convert to raw bits
/// per second at edit time; storage and evaluation only ever see bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum RateUnit {
    #[strum(serialize = "Kbps")]
    Kbps,
    #[default]
    #[strum(serialize = "Mbps")]
    Mbps,
    #[strum(serialize = "Gbps")]
    Gbps,
}

impl RateUnit {
    pub fn multiplier(self) -> u64 {
        match self {
            Self::Kbps => 1_000,
            Self::Mbps => 1_000_000,
            Self::Gbps => 1_000_000_000,
        }
    }

    /// Next unit in the cycle, for the editor's unit hotkey.
    pub fn next(self) -> Self {
        match self {
            Self::Kbps => Self::Mbps,
            Self::Mbps => Self::Gbps,
            Self::Gbps => Self::Kbps,
        }
    }
}

/// Convert an authored value to raw bits per second.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn to_bps(value: f64, unit: RateUnit) -> u64 {
    (value * unit.multiplier() as f64).round().max(0.0) as u64
}

/// Pick the display unit when re-opening the editor: the largest unit
/// that yields a value ≥ 1 (falling back to Kbps for sub-Kbps values).
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn display_rate(bps: u64) -> (f64, RateUnit) {
    if bps >= RateUnit::Gbps.multiplier() {
        (bps as f64 / RateUnit::Gbps.multiplier() as f64, RateUnit::Gbps)
    } else if bps >= RateUnit::Mbps.multiplier() {
        (bps as f64 / RateUnit::Mbps.multiplier() as f64, RateUnit::Mbps)
    } else {
        (bps as f64 / RateUnit::Kbps.multiplier() as f64, RateUnit::Kbps)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceId, Slot};

    fn reading(rx_bps: Option<u64>, tx_bps: Option<u64>) -> TileReading {
        TileReading {
            rx_bps,
            tx_bps,
            last_seen_ms: 0,
            rx_history: Vec::new(),
            tx_history: Vec::new(),
        }
    }

    #[test]
    fn warn_requires_threshold_and_known_rate() {
        assert!(!warn_below(None, Some(10)));
        assert!(!warn_below(Some(100), None));
        assert!(!warn_below(None, None));
        assert!(warn_below(Some(100), Some(99)));
        assert!(!warn_below(Some(100), Some(100)));
        assert!(!warn_below(Some(100), Some(101)));
        // Measured-at-zero is below any positive threshold.
        assert!(warn_below(Some(1), Some(0)));
    }

    #[test]
    fn evaluate_checks_both_directions() {
        let mut slot = Slot::new(DeviceId::new("rb-4011"), "ether1");
        slot.warn_below_rx_bps = Some(1_000_000);

        let state = evaluate(&slot, Some(&reading(Some(500_000), Some(0))));
        assert!(state.rx);
        // No tx threshold configured — never warns.
        assert!(!state.tx);
        assert!(state.any());

        let ok = evaluate(&slot, Some(&reading(Some(2_000_000), None)));
        assert!(!ok.any());

        // Unmeasured tile never warns.
        assert!(!evaluate(&slot, None).any());
    }

    #[test]
    fn staleness_window_has_ten_second_floor() {
        // 1 s interval → floor dominates: stale strictly after 10 s.
        assert!(!is_stale(false, Some(0), 10_000, 1000));
        assert!(is_stale(false, Some(0), 10_001, 1000));

        // 5 s interval → 3 periods dominate: stale strictly after 15 s.
        assert!(!is_stale(false, Some(0), 15_000, 5000));
        assert!(is_stale(false, Some(0), 15_001, 5000));
    }

    #[test]
    fn staleness_suppressed_when_paused_or_unseen() {
        assert!(!is_stale(true, Some(0), 60_000, 1000));
        assert!(!is_stale(false, None, 60_000, 1000));
    }

    #[test]
    fn staleness_clears_on_fresh_sample() {
        assert!(is_stale(false, Some(0), 20_000, 2000));
        assert!(!is_stale(false, Some(19_000), 20_000, 2000));
    }

    #[test]
    fn unit_conversion_fixed_multipliers() {
        assert_eq!(to_bps(750.0, RateUnit::Kbps), 750_000);
        assert_eq!(to_bps(2.5, RateUnit::Mbps), 2_500_000);
        assert_eq!(to_bps(1.0, RateUnit::Gbps), 1_000_000_000);
    }

    #[test]
    fn display_unit_picks_largest_at_least_one() {
        assert_eq!(display_rate(2_500_000), (2.5, RateUnit::Mbps));
        assert_eq!(display_rate(1_000_000_000), (1.0, RateUnit::Gbps));
        assert_eq!(display_rate(999_999), (999.999, RateUnit::Kbps));
        assert_eq!(display_rate(500), (0.5, RateUnit::Kbps));
    }

    #[test]
    fn edit_round_trip_preserves_value() {
        let bps = to_bps(40.0, RateUnit::Mbps);
        let (value, unit) = display_rate(bps);
        assert_eq!(to_bps(value, unit), bps);
        assert_eq!(unit, RateUnit::Mbps);
    }
}
