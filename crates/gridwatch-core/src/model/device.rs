// ── Canonical device and interface types ──
//
// Converted from gridwatch-api wire records at the edge; everything
// inside the wallboard works with these.

use gridwatch_api::{DeviceRecord, InterfaceRecord};

use super::ids::DeviceId;

/// One managed device from the registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub id: DeviceId,
    pub identity: String,
    pub host: String,
    pub port: u16,
    pub online: bool,
}

impl From<DeviceRecord> for DeviceSummary {
    fn from(r: DeviceRecord) -> Self {
        Self {
            id: DeviceId::new(r.id),
            identity: r.identity,
            host: r.host,
            port: r.port,
            online: r.online,
        }
    }
}

/// One interface a device exposes, for the slot picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub kind: String,
    pub running: bool,
    pub disabled: bool,
}

impl From<InterfaceRecord> for InterfaceInfo {
    fn from(r: InterfaceRecord) -> Self {
        Self {
            name: r.name,
            kind: r.kind,
            running: r.running,
            disabled: r.disabled,
        }
    }
}
