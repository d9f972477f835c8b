//! Export-client models.

use serde::{Deserialize, Serialize};

/// Registration of an upstream export destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportRegistration {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    /// Destination kind: MQTT_TOPIC, REST_ENDPOINT, ...
    pub destination: String,
    /// Payload format: JSON, XML, ...
    pub format: String,
    pub compression: String,
    pub encryption_algorithm: String,
    pub enable: bool,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}
