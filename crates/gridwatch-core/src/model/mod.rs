//! Canonical domain types for the wallboard.

pub mod device;
pub mod ids;
pub mod slot;

pub use device::{DeviceSummary, InterfaceInfo};
pub use ids::{DeviceId, PortKey};
pub use slot::{DEFAULT_INTERFACE, PersistedConfig, Slot, parse_slot, parse_slots};
