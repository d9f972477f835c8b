//! Device metadata models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Whether an entity accepts administrative requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminState {
    #[default]
    Unlocked,
    Locked,
}

/// Whether an entity is operating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingState {
    #[default]
    Enabled,
    Disabled,
}

/// How to reach an external endpoint (broker topic, HTTP target, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Addressable {
    pub id: String,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    /// Business-unique name.
    pub name: String,
    pub protocol: String,
    pub http_method: String,
    pub address: String,
    pub port: i32,
    pub path: String,
    pub publisher: String,
    pub user: String,
    pub password: String,
    pub topic: String,
}

/// A managed device. `service` and `profile` are references persisted
/// as `(id, name)` projections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    pub description: String,
    pub admin_state: AdminState,
    pub operating_state: OperatingState,
    pub labels: Vec<String>,
    pub location: String,
    pub last_connected: i64,
    pub last_reported: i64,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    pub service: DeviceService,
    pub profile: DeviceProfile,
}

/// The service that owns a set of devices. References an addressable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceService {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    pub description: String,
    pub admin_state: AdminState,
    pub operating_state: OperatingState,
    pub labels: Vec<String>,
    pub last_connected: i64,
    pub last_reported: i64,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    pub addressable: Addressable,
}

/// Template describing a class of devices. Owns its commands: adding a
/// profile persists them, deleting it removes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceProfile {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    pub description: String,
    pub manufacturer: String,
    pub model: String,
    pub labels: Vec<String>,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    pub commands: Vec<Command>,
}

/// An operation a device class supports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Command {
    pub id: String,
    pub name: String,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    pub get: Option<Action>,
    pub put: Option<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Action {
    pub path: String,
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    pub code: String,
    pub description: String,
    pub expected_values: Vec<String>,
}

/// Rule for onboarding devices discovered at runtime. `profile` and
/// `service` are references persisted as `(id, name)` projections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisionWatcher {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    /// Match criteria; every `key:value` pair is indexed.
    pub identifiers: BTreeMap<String, String>,
    pub operating_state: OperatingState,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    pub profile: DeviceProfile,
    pub service: DeviceService,
}
