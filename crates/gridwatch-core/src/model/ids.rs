// ── Core identity types ──
//
// DeviceId and PortKey identify everything the wallboard tracks.
// A PortKey is the (device, interface) pair every live sample and
// history buffer is keyed by.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── DeviceId ────────────────────────────────────────────────────────

/// Opaque registry identifier for a managed device.
///
/// The registry hands these out as strings; the wallboard never inspects
/// them beyond equality. Normalized by trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ── PortKey ─────────────────────────────────────────────────────────

/// The (device, interface) pair a tile is bound to.
///
/// Keys the rate engine's live samples and history buffers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortKey {
    pub device: DeviceId,
    pub interface: String,
}

impl PortKey {
    pub fn new(device: DeviceId, interface: impl Into<String>) -> Self {
        Self {
            device,
            interface: interface.into(),
        }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.interface)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn device_id_trims_whitespace() {
        let id = DeviceId::new("  rb-4011 ");
        assert_eq!(id.as_str(), "rb-4011");
    }

    #[test]
    fn device_id_from_str() {
        let id: DeviceId = "hex-s".parse().unwrap();
        assert_eq!(id.to_string(), "hex-s");
    }

    #[test]
    fn port_key_display() {
        let key = PortKey::new(DeviceId::new("rb-4011"), "ether1");
        assert_eq!(key.to_string(), "rb-4011:ether1");
    }

    #[test]
    fn port_keys_hash_by_both_halves() {
        let a = PortKey::new(DeviceId::new("rb-4011"), "ether1");
        let b = PortKey::new(DeviceId::new("rb-4011"), "ether2");
        let c = PortKey::new(DeviceId::new("hex-s"), "ether1");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
