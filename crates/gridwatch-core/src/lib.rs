//! Domain layer of the gridwatch wallboard.
//!
//! This crate owns everything between the gateway client and the render
//! layer:
//!
//! - **[`Wallboard`]** — Central facade managing the session lifecycle:
//!   [`new()`](Wallboard::new) restores the locally cached grid for an
//!   instant first render, [`start()`](Wallboard::start) spawns the
//!   background tasks (counter polling, debounced remote persistence,
//!   authoritative remote config load, registry refresh).
//!
//! - **[`SlotGrid`]** / **[`LayoutPreset`]** — The logical tile grid: an
//!   unbounded nullable slot list paged through a closed set of grid
//!   presets. Presets change visibility, never data.
//!
//! - **[`RateEngine`]** — Stateful counter→bitrate derivation with
//!   bounded per-port history, exported as immutable
//!   [`TelemetrySnapshot`]s after each poll cycle.
//!
//! - **[`threshold`]** — Pure warn/staleness predicates recomputed every
//!   render tick, plus human-unit threshold conversion.
//!
//! - **[`DragController`]** — The `Idle -> Dragging -> Idle` machine
//!   behind mouse tile reordering over global slot indices.
//!
//! Background operations degrade silently; foreground operations
//! (manual refresh, sync-now, editor queries) return [`CoreError`] and
//! are surfaced by the UI.

pub mod drag;
pub mod error;
pub mod layout;
pub mod model;
pub mod persist;
pub mod rate;
pub mod scheduler;
pub mod threshold;
pub mod wallboard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use drag::DragController;
pub use error::CoreError;
pub use layout::{LayoutPreset, SlotGrid};
pub use model::{
    DEFAULT_INTERFACE, DeviceId, DeviceSummary, InterfaceInfo, PersistedConfig, PortKey, Slot,
};
pub use persist::{LAYOUT_KEY, SLOTS_KEY};
pub use rate::{HISTORY_LEN, RateEngine, TelemetrySnapshot, TileReading};
pub use scheduler::{
    MAX_DEVICES_PER_CYCLE, MAX_INTERFACES_PER_DEVICE, PollInterval, PollSettings, plan_cycle,
};
pub use wallboard::{GridView, Wallboard};
