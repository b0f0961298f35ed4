// ── Wire types for the fleet gateway API ──
//
// All payloads are camelCase JSON. These are transport shapes only;
// gridwatch-core converts them into its canonical domain types.

use serde::{Deserialize, Serialize};

/// One managed device as reported by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: String,
    /// Human-assigned identity (router system name).
    pub identity: String,
    pub host: String,
    pub port: u16,
    pub online: bool,
}

/// One interface on a device, as reported by interface discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub name: String,
    /// Interface type token, e.g. `"ether"`, `"wlan"`, `"bridge"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub running: bool,
    pub disabled: bool,
}

/// Raw traffic counters for one interface at fetch time.
///
/// Counters are monotonic byte totals; they reset on device reboot and
/// may wrap. Rate derivation is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// One entry in the generic key-value settings store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
