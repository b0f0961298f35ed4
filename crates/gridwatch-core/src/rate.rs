// ── Rate engine ──
//
// Converts raw monotonic byte counters into bits-per-second and keeps a
// bounded rolling history per (device, interface) key. All state here is
// session-local: constructed once per wallboard session, empty again
// after any reload, never persisted.

use std::collections::{HashMap, VecDeque};

use crate::model::PortKey;

/// Samples retained per direction — enough for a compact sparkline
/// without unbounded growth.
pub const HISTORY_LEN: usize = 60;

// ── Samples ─────────────────────────────────────────────────────────

/// Raw counters as returned by one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub observed_at_ms: i64,
}

/// Last raw observation plus the rates derived from it.
///
/// Rates are `None` until a second observation exists for the key —
/// "never measured" is distinct from "measured at zero throughput".
#[derive(Debug, Clone)]
pub struct LiveSample {
    raw: RawCounters,
    pub rx_bps: Option<u64>,
    pub tx_bps: Option<u64>,
    pub last_seen_ms: i64,
}

/// Bounded FIFO history of derived rates, oldest dropped first.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    rx: VecDeque<u64>,
    tx: VecDeque<u64>,
}

impl HistoryBuffer {
    fn push(&mut self, rx_bps: u64, tx_bps: u64) {
        if self.rx.len() == HISTORY_LEN {
            self.rx.pop_front();
        }
        if self.tx.len() == HISTORY_LEN {
            self.tx.pop_front();
        }
        self.rx.push_back(rx_bps);
        self.tx.push_back(tx_bps);
    }

    pub fn rx(&self) -> &VecDeque<u64> {
        &self.rx
    }

    pub fn tx(&self) -> &VecDeque<u64> {
        &self.tx
    }
}

// ── Snapshot types ──────────────────────────────────────────────────

/// One tile's worth of derived telemetry, cheap to hand to the render
/// path.
#[derive(Debug, Clone)]
pub struct TileReading {
    pub rx_bps: Option<u64>,
    pub tx_bps: Option<u64>,
    pub last_seen_ms: i64,
    pub rx_history: Vec<u64>,
    pub tx_history: Vec<u64>,
}

/// Immutable view of the whole engine after a poll cycle, published
/// through a watch channel so the render path never touches engine
/// internals.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    readings: HashMap<PortKey, TileReading>,
}

impl TelemetrySnapshot {
    pub fn reading(&self, key: &PortKey) -> Option<&TileReading> {
        self.readings.get(key)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

// ── RateEngine ──────────────────────────────────────────────────────

/// Stateful counter→rate derivation, keyed by (device, interface).
#[derive(Debug, Default)]
pub struct RateEngine {
    live: HashMap<PortKey, LiveSample>,
    history: HashMap<PortKey, HistoryBuffer>,
}

impl RateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one counter observation.
    ///
    /// With a prior observation and a positive time delta, derives
    /// `round(delta_bytes / delta_seconds) * 8` per direction. A counter
    /// that went backwards (device reboot, 32/64-bit rollover) yields
    /// zero for that tick, never a negative rate. The first observation
    /// for a key yields `None`.
    pub fn ingest(&mut self, key: PortKey, rx_bytes: u64, tx_bytes: u64, now_ms: i64) {
        let raw = RawCounters {
            rx_bytes,
            tx_bytes,
            observed_at_ms: now_ms,
        };

        let prev = self.live.get(&key).map(|sample| sample.raw);
        let (rx_bps, tx_bps) = match prev {
            Some(p) if now_ms > p.observed_at_ms => {
                #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
                let delta_seconds = (now_ms - p.observed_at_ms) as f64 / 1000.0;
                (
                    Some(rate_bps(p.rx_bytes, rx_bytes, delta_seconds)),
                    Some(rate_bps(p.tx_bytes, tx_bytes, delta_seconds)),
                )
            }
            _ => (None, None),
        };

        self.history
            .entry(key.clone())
            .or_default()
            .push(rx_bps.unwrap_or(0), tx_bps.unwrap_or(0));

        self.live.insert(
            key,
            LiveSample {
                raw,
                rx_bps,
                tx_bps,
                last_seen_ms: now_ms,
            },
        );
    }

    pub fn sample(&self, key: &PortKey) -> Option<&LiveSample> {
        self.live.get(key)
    }

    pub fn history(&self, key: &PortKey) -> Option<&HistoryBuffer> {
        self.history.get(key)
    }

    /// Export an immutable snapshot for the render path.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let readings = self
            .live
            .iter()
            .map(|(key, sample)| {
                let history = self.history.get(key);
                let reading = TileReading {
                    rx_bps: sample.rx_bps,
                    tx_bps: sample.tx_bps,
                    last_seen_ms: sample.last_seen_ms,
                    rx_history: history
                        .map_or_else(Vec::new, |h| h.rx.iter().copied().collect()),
                    tx_history: history
                        .map_or_else(Vec::new, |h| h.tx.iter().copied().collect()),
                };
                (key.clone(), reading)
            })
            .collect();

        TelemetrySnapshot { readings }
    }
}

/// Derive a single direction's rate from two counter values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn rate_bps(prev_bytes: u64, now_bytes: u64, delta_seconds: f64) -> u64 {
    if now_bytes < prev_bytes {
        // Counter reset — report zero for this tick rather than a
        // nonsensical negative delta.
        return 0;
    }
    (((now_bytes - prev_bytes) as f64) / delta_seconds).round() as u64 * 8
}
