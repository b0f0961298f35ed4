//! Async HTTP client for the gridwatch fleet gateway.
//!
//! The gateway fronts a fleet of routers and exposes the four surfaces the
//! wallboard consumes:
//!
//! - **Device registry** — [`GatewayClient::list_devices`]: every managed
//!   device with identity, host/port, and an online flag.
//! - **Interface discovery** — [`GatewayClient::list_interfaces`]: the
//!   interfaces a device exposes, with type/running/disabled state.
//! - **Counter fetch** — [`GatewayClient::fetch_counters`]: current raw
//!   byte counters for a named set of interfaces on one device.
//! - **Settings store** — [`GatewayClient::get_setting`] /
//!   [`GatewayClient::put_setting`]: a generic key-value store used for
//!   shared wallboard configuration.
//!
//! All endpoints speak camelCase JSON under `/v1/` and authenticate with
//! an `X-API-Token` header.

pub mod client;
pub mod error;
pub mod types;

pub use client::GatewayClient;
pub use error::Error;
pub use types::{CounterRecord, DeviceRecord, InterfaceRecord, SettingRecord};
