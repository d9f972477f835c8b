//! Core-data models: events, readings, value descriptors.

use serde::{Deserialize, Serialize};

/// A batch of readings collected from one device at one instant.
///
/// Readings are owned by their event: persisting an event persists its
/// readings, and deleting it removes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: String,
    /// Name of the device that produced the event.
    pub device: String,
    /// When the event was delivered upstream; zero until exported.
    pub pushed: i64,
    pub created: i64,
    pub modified: i64,
    /// Device-side timestamp, distinct from `created`.
    pub origin: i64,
    /// Optional content checksum used by the export path.
    pub checksum: String,
    pub readings: Vec<Reading>,
}

/// A single measured value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reading {
    pub id: String,
    pub pushed: i64,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    /// Name of the device that produced the reading.
    pub device: String,
    /// Value-descriptor name describing this measurement.
    pub name: String,
    pub value: String,
}

/// Metadata describing a class of reading values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueDescriptor {
    pub id: String,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    /// Business-unique name.
    pub name: String,
    pub description: String,
    pub min: String,
    pub max: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub uom_label: String,
    pub default_value: String,
    pub formatting: String,
    pub labels: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_descriptor_wire_field_names() {
        let descriptor = ValueDescriptor {
            name: "temperature".into(),
            value_type: "Float".into(),
            uom_label: "celsius".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "Float");
        assert_eq!(json["uomLabel"], "celsius");
        assert_eq!(json["defaultValue"], "");

        let back: ValueDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, descriptor);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let event: Event =
            serde_json::from_str(r#"{"device":"thermostat-1","origin":42}"#).unwrap();
        assert_eq!(event.device, "thermostat-1");
        assert_eq!(event.origin, 42);
        assert_eq!(event.pushed, 0);
        assert!(event.readings.is_empty());
    }
}
