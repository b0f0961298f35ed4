// ── Slot assignments and the persisted configuration shape ──
//
// A Slot binds one grid cell to a (device, interface) pair with optional
// low-throughput warning thresholds. PersistedConfig is the only state
// that ever reaches storage; parsing is deliberately lenient because the
// settings store may hold configs written by older wallboard builds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::DeviceId;
use crate::layout::LayoutPreset;

/// Interface assumed for slots persisted in the legacy bare-string form,
/// which stored only a device id. First wired port on the router family
/// this wallboard fronts.
pub const DEFAULT_INTERFACE: &str = "ether1";

// ── Slot ────────────────────────────────────────────────────────────

/// One occupied grid cell: a (device, interface) binding with optional
/// warn-below thresholds in raw bits per second.
///
/// Thresholds are independently nullable; a missing threshold means that
/// direction never warns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(rename = "deviceId")]
    pub device: DeviceId,
    #[serde(rename = "interfaceName")]
    pub interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn_below_rx_bps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn_below_tx_bps: Option<u64>,
}

impl Slot {
    pub fn new(device: DeviceId, interface: impl Into<String>) -> Self {
        Self {
            device,
            interface: interface.into(),
            warn_below_rx_bps: None,
            warn_below_tx_bps: None,
        }
    }

    /// Key into the rate engine for this slot.
    pub fn port_key(&self) -> super::ids::PortKey {
        super::ids::PortKey::new(self.device.clone(), self.interface.clone())
    }
}

/// Structured slot shape as it appears on the wire / in storage.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotFields {
    device_id: String,
    interface_name: String,
    #[serde(default)]
    warn_below_rx_bps: Option<u64>,
    #[serde(default)]
    warn_below_tx_bps: Option<u64>,
}

/// Parse one persisted slot entry.
///
/// Accepts the structured object form and the legacy bare device-id
/// string (which implies [`DEFAULT_INTERFACE`]). Any other shape —
/// including JSON `null` for an empty cell — parses to `None`.
pub fn parse_slot(value: &Value) -> Option<Slot> {
    match value {
        Value::String(device_id) if !device_id.trim().is_empty() => Some(Slot::new(
            DeviceId::new(device_id),
            DEFAULT_INTERFACE,
        )),
        Value::Object(_) => {
            let fields: SlotFields = serde_json::from_value(value.clone()).ok()?;
            Some(Slot {
                device: DeviceId::new(fields.device_id),
                interface: fields.interface_name,
                warn_below_rx_bps: fields.warn_below_rx_bps,
                warn_below_tx_bps: fields.warn_below_tx_bps,
            })
        }
        _ => None,
    }
}

/// Parse a serialized slots array. A corrupt or non-array payload yields
/// an empty list rather than failing the whole load.
pub fn parse_slots(raw: &str) -> Vec<Option<Slot>> {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };
    entries.iter().map(parse_slot).collect()
}

// ── PersistedConfig ─────────────────────────────────────────────────

/// The only wallboard state that reaches storage: the active layout
/// preset and the full slot assignment list.
///
/// Two copies are kept in sync — an immediate local cache file and the
/// remote settings store, written with debounce. Live samples and history
/// are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PersistedConfig {
    pub layout: LayoutPreset,
    pub slots: Vec<Option<Slot>>,
}

impl PersistedConfig {
    /// Serialize for the local cache file (one JSON document).
    pub fn to_local_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the local cache file, tolerating legacy slot entries.
    /// Returns `None` only when the document is not a JSON object.
    pub fn from_local_json(raw: &str) -> Option<Self> {
        let Ok(Value::Object(doc)) = serde_json::from_str::<Value>(raw) else {
            return None;
        };

        let layout = doc
            .get("layout")
            .and_then(Value::as_str)
            .and_then(|token| token.parse().ok())
            .unwrap_or_default();
        let slots = doc
            .get("slots")
            .and_then(Value::as_array)
            .map_or_else(Vec::new, |entries| entries.iter().map(parse_slot).collect());

        Some(Self { layout, slots })
    }

    /// Serialized slots array for the remote settings store.
    pub fn slots_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.slots)
    }

    /// Layout preset token for the remote settings store.
    pub fn layout_token(&self) -> String {
        self.layout.to_string()
    }

    /// Reassemble a config from the two remote settings values.
    ///
    /// `None` when neither key is present (nothing was ever saved);
    /// otherwise each half parses leniently and falls back to its default.
    pub fn from_settings(layout: Option<&str>, slots: Option<&str>) -> Option<Self> {
        if layout.is_none() && slots.is_none() {
            return None;
        }

        let layout = layout
            .and_then(|token| token.parse().ok())
            .unwrap_or_default();
        let slots = slots.map_or_else(Vec::new, parse_slots);

        Some(Self { layout, slots })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_structured_slot() {
        let value = json!({
            "deviceId": "rb-4011",
            "interfaceName": "ether2",
            "warnBelowRxBps": 1_000_000
        });

        let slot = parse_slot(&value).unwrap();
        assert_eq!(slot.device.as_str(), "rb-4011");
        assert_eq!(slot.interface, "ether2");
        assert_eq!(slot.warn_below_rx_bps, Some(1_000_000));
        assert_eq!(slot.warn_below_tx_bps, None);
    }

    #[test]
    fn parse_legacy_string_slot() {
        let value = json!("hex-s");

        let slot = parse_slot(&value).unwrap();
        assert_eq!(slot.device.as_str(), "hex-s");
        assert_eq!(slot.interface, DEFAULT_INTERFACE);
        assert_eq!(slot.warn_below_rx_bps, None);
    }

    #[test]
    fn parse_unknown_shapes_as_empty() {
        assert!(parse_slot(&json!(null)).is_none());
        assert!(parse_slot(&json!(42)).is_none());
        assert!(parse_slot(&json!(["rb-4011"])).is_none());
        assert!(parse_slot(&json!({"bogus": true})).is_none());
        assert!(parse_slot(&json!("")).is_none());
    }

    #[test]
    fn parse_slots_mixes_forms() {
        let raw = r#"[
            {"deviceId": "rb-4011", "interfaceName": "sfp1"},
            "hex-s",
            null,
            {"unrelated": 1}
        ]"#;

        let slots = parse_slots(raw);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].as_ref().unwrap().interface, "sfp1");
        assert_eq!(slots[1].as_ref().unwrap().interface, DEFAULT_INTERFACE);
        assert!(slots[2].is_none());
        assert!(slots[3].is_none());
    }

    #[test]
    fn parse_slots_corrupt_payload_is_empty() {
        assert!(parse_slots("not json").is_empty());
        assert!(parse_slots(r#"{"a": 1}"#).is_empty());
    }

    #[test]
    fn local_json_round_trip() {
        let mut slot = Slot::new(DeviceId::new("rb-4011"), "ether1");
        slot.warn_below_tx_bps = Some(5_000_000);
        let config = PersistedConfig {
            layout: LayoutPreset::Grid3x3,
            slots: vec![Some(slot), None],
        };

        let raw = config.to_local_json().unwrap();
        let parsed = PersistedConfig::from_local_json(&raw).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn settings_round_trip_including_legacy() {
        let config = PersistedConfig {
            layout: LayoutPreset::Grid4x3,
            slots: vec![None, Some(Slot::new(DeviceId::new("hex-s"), "wlan1"))],
        };

        let layout = config.layout_token();
        let slots = config.slots_json().unwrap();
        let parsed =
            PersistedConfig::from_settings(Some(&layout), Some(&slots)).unwrap();
        assert_eq!(parsed, config);

        // Legacy remote payload: bare device-id strings in the slots array.
        let legacy = PersistedConfig::from_settings(Some("2x2"), Some(r#"["rb-4011"]"#)).unwrap();
        assert_eq!(legacy.layout, LayoutPreset::Grid2x2);
        assert_eq!(
            legacy.slots[0].as_ref().unwrap().interface,
            DEFAULT_INTERFACE
        );
    }

    #[test]
    fn settings_absent_both_keys_is_none() {
        assert!(PersistedConfig::from_settings(None, None).is_none());
        assert!(PersistedConfig::from_settings(Some("3x3"), None).is_some());
    }
}
