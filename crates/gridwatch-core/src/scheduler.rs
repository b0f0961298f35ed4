// ── Polling scheduler ──
//
// One repeating tick drives one poll cycle. A cycle collects the wanted
// (device, interface) pairs across the whole configured grid (every
// page stays warm), groups them per device under hard caps, and polls
// devices strictly sequentially so per-device API load stays
// predictable. A failing device is skipped for the cycle; in-flight
// requests are never cancelled — only the timer restarts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use chrono::Utc;
use gridwatch_api::GatewayClient;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{DeviceId, PortKey, Slot};
use crate::rate::{RateEngine, TelemetrySnapshot};
use crate::wallboard::GridView;

/// Upper bound on distinct devices polled per cycle.
pub const MAX_DEVICES_PER_CYCLE: usize = 12;

/// Upper bound on interface names per device request.
pub const MAX_INTERFACES_PER_DEVICE: usize = 12;

// ── Poll settings ───────────────────────────────────────────────────

/// User-selectable poll cadence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum PollInterval {
    #[serde(rename = "1s")]
    #[strum(serialize = "1s")]
    OneSecond,
    #[default]
    #[serde(rename = "2s")]
    #[strum(serialize = "2s")]
    TwoSeconds,
    #[serde(rename = "5s")]
    #[strum(serialize = "5s")]
    FiveSeconds,
}

impl PollInterval {
    pub fn as_millis(self) -> u64 {
        match self {
            Self::OneSecond => 1000,
            Self::TwoSeconds => 2000,
            Self::FiveSeconds => 5000,
        }
    }

    /// Next cadence in the cycle, for the interval hotkey.
    pub fn next(self) -> Self {
        match self {
            Self::OneSecond => Self::TwoSeconds,
            Self::TwoSeconds => Self::FiveSeconds,
            Self::FiveSeconds => Self::OneSecond,
        }
    }
}

/// Scheduler control state. Any change restarts the repeating timer —
/// the only form of cancellation the scheduler performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: PollInterval,
    /// User-initiated pause.
    pub paused: bool,
    /// Whether the wallboard is actually being watched (terminal focus).
    /// Cycles are skipped entirely — not queued — while invisible.
    pub visible: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: PollInterval::default(),
            paused: false,
            visible: true,
        }
    }
}

// ── Cycle planning ──────────────────────────────────────────────────

/// One device's worth of work within a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollBatch {
    pub device: DeviceId,
    pub interfaces: Vec<String>,
}

/// Group the wanted interface names of every non-null slot by device,
/// preserving first-seen order, deduplicating names, and applying the
/// per-cycle and per-device caps.
pub fn plan_cycle(slots: &[Option<Slot>]) -> Vec<PollBatch> {
    let mut order: Vec<DeviceId> = Vec::new();
    let mut by_device: HashMap<DeviceId, Vec<String>> = HashMap::new();

    for slot in slots.iter().flatten() {
        let names = match by_device.entry(slot.device.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                order.push(slot.device.clone());
                entry.insert(Vec::new())
            }
        };
        if names.len() < MAX_INTERFACES_PER_DEVICE && !names.contains(&slot.interface) {
            names.push(slot.interface.clone());
        }
    }

    order
        .into_iter()
        .take(MAX_DEVICES_PER_CYCLE)
        .map(|device| {
            let interfaces = by_device.remove(&device).unwrap_or_default();
            PollBatch { device, interfaces }
        })
        .collect()
}

// ── Poll task ───────────────────────────────────────────────────────

/// Background polling loop.
///
/// Owns the [`RateEngine`] for the session and publishes a fresh
/// [`TelemetrySnapshot`] after every completed cycle. Settings changes
/// rebuild the interval timer; pause/invisibility turn ticks into
/// no-ops without touching the timer cadence.
pub(crate) async fn poll_task(
    api: GatewayClient,
    grid_rx: watch::Receiver<GridView>,
    mut settings_rx: watch::Receiver<PollSettings>,
    telemetry_tx: watch::Sender<std::sync::Arc<TelemetrySnapshot>>,
    cancel: CancellationToken,
) {
    let mut engine = RateEngine::new();
    let mut settings = *settings_rx.borrow();
    let mut interval = tokio::time::interval(Duration::from_millis(settings.interval.as_millis()));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = settings_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                settings = *settings_rx.borrow_and_update();
                // Cancel-and-restart the repeating timer; in-flight
                // requests from a previous tick are not aborted.
                interval =
                    tokio::time::interval(Duration::from_millis(settings.interval.as_millis()));
                interval.tick().await;
            }
            _ = interval.tick() => {
                if settings.paused || !settings.visible {
                    continue;
                }
                let batches = plan_cycle(&grid_rx.borrow().slots);
                run_cycle(&api, &mut engine, batches).await;
                let _ = telemetry_tx.send(std::sync::Arc::new(engine.snapshot()));
            }
        }
    }

    debug!("poll task shut down");
}

/// Execute one cycle: poll each batched device in turn, feeding every
/// returned counter into the engine. One unreachable device must not
/// interrupt the rest of the cycle or spam notifications every tick, so
/// fetch failures are logged at debug and otherwise swallowed.
async fn run_cycle(api: &GatewayClient, engine: &mut RateEngine, batches: Vec<PollBatch>) {
    for batch in batches {
        match api.fetch_counters(batch.device.as_str(), &batch.interfaces).await {
            Ok(counters) => {
                let now_ms = Utc::now().timestamp_millis();
                for counter in counters {
                    engine.ingest(
                        PortKey::new(batch.device.clone(), counter.name),
                        counter.rx_bytes,
                        counter.tx_bytes,
                        now_ms,
                    );
                }
            }
            Err(e) => {
                debug!(device = %batch.device, error = %e, "counter fetch failed, device skipped this cycle");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn slot(device: &str, interface: &str) -> Option<Slot> {
        Some(Slot::new(DeviceId::new(device), interface))
    }

    #[test]
    fn plan_groups_by_device_preserving_order() {
        let slots = vec![
            slot("b", "ether1"),
            None,
            slot("a", "ether1"),
            slot("b", "ether2"),
        ];

        let batches = plan_cycle(&slots);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].device.as_str(), "b");
        assert_eq!(batches[0].interfaces, vec!["ether1", "ether2"]);
        assert_eq!(batches[1].device.as_str(), "a");
        assert_eq!(batches[1].interfaces, vec!["ether1"]);
    }

    #[test]
    fn plan_dedupes_repeated_pairs() {
        let slots = vec![slot("a", "ether1"), slot("a", "ether1"), slot("a", "ether2")];

        let batches = plan_cycle(&slots);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].interfaces, vec!["ether1", "ether2"]);
    }

    #[test]
    fn plan_caps_interfaces_per_device() {
        let slots: Vec<Option<Slot>> = (0..20).map(|i| slot("a", &format!("ether{i}"))).collect();

        let batches = plan_cycle(&slots);
        assert_eq!(batches[0].interfaces.len(), MAX_INTERFACES_PER_DEVICE);
        assert_eq!(batches[0].interfaces[0], "ether0");
        assert_eq!(batches[0].interfaces[11], "ether11");
    }

    #[test]
    fn plan_caps_devices_per_cycle() {
        let slots: Vec<Option<Slot>> = (0..20).map(|i| slot(&format!("dev{i}"), "ether1")).collect();

        let batches = plan_cycle(&slots);
        assert_eq!(batches.len(), MAX_DEVICES_PER_CYCLE);
        assert_eq!(batches[0].device.as_str(), "dev0");
        assert_eq!(batches[11].device.as_str(), "dev11");
    }

    #[test]
    fn plan_spans_all_pages() {
        // 30 slots is well past any preset capacity — the plan still
        // covers every configured slot, not just the visible page.
        let slots: Vec<Option<Slot>> = (0..30).map(|i| slot("a", &format!("vlan{i}"))).collect();

        let batches = plan_cycle(&slots);
        // Capped per device, but drawn from the full list.
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].interfaces.len(), MAX_INTERFACES_PER_DEVICE);
    }

    #[test]
    fn empty_grid_plans_nothing() {
        let slots: Vec<Option<Slot>> = vec![None; 12];
        assert!(plan_cycle(&slots).is_empty());
    }

    #[test]
    fn interval_cycle_covers_all_choices() {
        assert_eq!(PollInterval::OneSecond.as_millis(), 1000);
        assert_eq!(PollInterval::TwoSeconds.as_millis(), 2000);
        assert_eq!(PollInterval::FiveSeconds.as_millis(), 5000);

        let mut interval = PollInterval::OneSecond;
        for _ in 0..3 {
            interval = interval.next();
        }
        assert_eq!(interval, PollInterval::OneSecond);
    }
}
