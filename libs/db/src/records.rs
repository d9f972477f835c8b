//! Per-entity storage records: how each model maps onto the keyspace.
//!
//! Entities with reference fields persist a projection carrying only
//! `(id, name)` of the referenced entity plus child ids for owned
//! children; decode rebuilds reference stubs and the resolver completes
//! them. Everything else encodes its model directly.
//!
//! Field-value indexes live under `c:<field>:<value>`: plain sets when
//! queries over them are unordered, sorted sets scored by `created`
//! when limited queries must return the oldest entries. Time and score
//! orderings are sorted sets under `c:<timefield>`. Empty field values
//! are not indexed.

use serde::{Deserialize, Serialize};

use verdin_core::models::{
    Addressable, Command, Device, DeviceProfile, DeviceService, Event, ExportRegistration,
    Interval, IntervalAction, Notification, ProvisionWatcher, Reading, Schedule, ScheduleEvent,
    Subscription, Transmission, ValueDescriptor,
};

use crate::document::{from_blob, to_blob, Document, IndexEntry, Reference};
use crate::error::Result;
use crate::schema;

/// Accessor boilerplate shared by every record.
macro_rules! document_identity {
    () => {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn created(&self) -> i64 {
            self.created
        }

        fn set_created(&mut self, ts: i64) {
            self.created = ts;
        }

        fn set_modified(&mut self, ts: i64) {
            self.modified = ts;
        }
    };
}

fn set_entry(out: &mut Vec<IndexEntry>, collection: &str, field: &str, value: &str) {
    if !value.is_empty() {
        out.push(IndexEntry::set(schema::field_key(collection, field, value)));
    }
}

// ---------------------------------------------------------------------------
// Core data
// ---------------------------------------------------------------------------

/// Stored form of an event: readings by id only.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredEvent {
    id: String,
    device: String,
    pushed: i64,
    created: i64,
    modified: i64,
    origin: i64,
    checksum: String,
    reading_ids: Vec<String>,
}

impl Document for Event {
    const COLLECTION: &'static str = schema::EVENTS;

    document_identity!();

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = vec![
            IndexEntry::zset(schema::time_key(Self::COLLECTION, "created"), self.created),
            IndexEntry::zset(schema::time_key(Self::COLLECTION, "pushed"), self.pushed),
            IndexEntry::zset(
                schema::field_key(Self::COLLECTION, "device", &self.device),
                self.created,
            ),
        ];
        if !self.checksum.is_empty() {
            out.push(IndexEntry::zset(
                schema::field_key(Self::COLLECTION, "checksum", &self.checksum),
                self.created,
            ));
        }
        out
    }

    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(&StoredEvent {
            id: self.id.clone(),
            device: self.device.clone(),
            pushed: self.pushed,
            created: self.created,
            modified: self.modified,
            origin: self.origin,
            checksum: self.checksum.clone(),
            reading_ids: self.readings.iter().map(|r| r.id.clone()).collect(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let stored: StoredEvent = from_blob(bytes)?;
        Ok(Event {
            id: stored.id,
            device: stored.device,
            pushed: stored.pushed,
            created: stored.created,
            modified: stored.modified,
            origin: stored.origin,
            checksum: stored.checksum,
            readings: stored
                .reading_ids
                .into_iter()
                .map(|id| Reading { id, ..Default::default() })
                .collect(),
        })
    }
}

impl Document for Reading {
    const COLLECTION: &'static str = schema::READINGS;

    document_identity!();

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out =
            vec![IndexEntry::zset(schema::time_key(Self::COLLECTION, "created"), self.created)];
        for (field, value) in [("device", &self.device), ("name", &self.name)] {
            if !value.is_empty() {
                out.push(IndexEntry::zset(
                    schema::field_key(Self::COLLECTION, field, value),
                    self.created,
                ));
            }
        }
        out
    }
}

impl Document for ValueDescriptor {
    const COLLECTION: &'static str = schema::VALUE_DESCRIPTORS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "uomlabel", &self.uom_label);
        set_entry(&mut out, Self::COLLECTION, "type", &self.value_type);
        for label in &self.labels {
            set_entry(&mut out, Self::COLLECTION, "label", label);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredDevice {
    id: String,
    name: String,
    description: String,
    admin_state: verdin_core::models::AdminState,
    operating_state: verdin_core::models::OperatingState,
    labels: Vec<String>,
    location: String,
    last_connected: i64,
    last_reported: i64,
    created: i64,
    modified: i64,
    origin: i64,
    service_id: String,
    service_name: String,
    profile_id: String,
    profile_name: String,
}

impl Document for Device {
    const COLLECTION: &'static str = schema::DEVICES;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "service", &self.service.id);
        set_entry(&mut out, Self::COLLECTION, "profile", &self.profile.id);
        for label in &self.labels {
            set_entry(&mut out, Self::COLLECTION, "label", label);
        }
        out
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference {
                field: "service",
                collection: schema::DEVICE_SERVICES,
                id: self.service.id.clone(),
                name: self.service.name.clone(),
            },
            Reference {
                field: "profile",
                collection: schema::DEVICE_PROFILES,
                id: self.profile.id.clone(),
                name: self.profile.name.clone(),
            },
        ]
    }

    fn apply_reference(&mut self, field: &'static str, id: &str) {
        match field {
            "service" => self.service.id = id.to_string(),
            "profile" => self.profile.id = id.to_string(),
            _ => {}
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(&StoredDevice {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            admin_state: self.admin_state,
            operating_state: self.operating_state,
            labels: self.labels.clone(),
            location: self.location.clone(),
            last_connected: self.last_connected,
            last_reported: self.last_reported,
            created: self.created,
            modified: self.modified,
            origin: self.origin,
            service_id: self.service.id.clone(),
            service_name: self.service.name.clone(),
            profile_id: self.profile.id.clone(),
            profile_name: self.profile.name.clone(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let stored: StoredDevice = from_blob(bytes)?;
        Ok(Device {
            id: stored.id,
            name: stored.name,
            description: stored.description,
            admin_state: stored.admin_state,
            operating_state: stored.operating_state,
            labels: stored.labels,
            location: stored.location,
            last_connected: stored.last_connected,
            last_reported: stored.last_reported,
            created: stored.created,
            modified: stored.modified,
            origin: stored.origin,
            service: DeviceService {
                id: stored.service_id,
                name: stored.service_name,
                ..Default::default()
            },
            profile: DeviceProfile {
                id: stored.profile_id,
                name: stored.profile_name,
                ..Default::default()
            },
        })
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredDeviceService {
    id: String,
    name: String,
    description: String,
    admin_state: verdin_core::models::AdminState,
    operating_state: verdin_core::models::OperatingState,
    labels: Vec<String>,
    last_connected: i64,
    last_reported: i64,
    created: i64,
    modified: i64,
    origin: i64,
    addressable_id: String,
    addressable_name: String,
}

impl Document for DeviceService {
    const COLLECTION: &'static str = schema::DEVICE_SERVICES;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "addressable", &self.addressable.id);
        for label in &self.labels {
            set_entry(&mut out, Self::COLLECTION, "label", label);
        }
        out
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            field: "addressable",
            collection: schema::ADDRESSABLES,
            id: self.addressable.id.clone(),
            name: self.addressable.name.clone(),
        }]
    }

    fn apply_reference(&mut self, field: &'static str, id: &str) {
        if field == "addressable" {
            self.addressable.id = id.to_string();
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(&StoredDeviceService {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            admin_state: self.admin_state,
            operating_state: self.operating_state,
            labels: self.labels.clone(),
            last_connected: self.last_connected,
            last_reported: self.last_reported,
            created: self.created,
            modified: self.modified,
            origin: self.origin,
            addressable_id: self.addressable.id.clone(),
            addressable_name: self.addressable.name.clone(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let stored: StoredDeviceService = from_blob(bytes)?;
        Ok(DeviceService {
            id: stored.id,
            name: stored.name,
            description: stored.description,
            admin_state: stored.admin_state,
            operating_state: stored.operating_state,
            labels: stored.labels,
            last_connected: stored.last_connected,
            last_reported: stored.last_reported,
            created: stored.created,
            modified: stored.modified,
            origin: stored.origin,
            addressable: Addressable {
                id: stored.addressable_id,
                name: stored.addressable_name,
                ..Default::default()
            },
        })
    }
}

/// Stored form of a profile: commands by id only.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredDeviceProfile {
    id: String,
    name: String,
    description: String,
    manufacturer: String,
    model: String,
    labels: Vec<String>,
    created: i64,
    modified: i64,
    origin: i64,
    command_ids: Vec<String>,
}

impl Document for DeviceProfile {
    const COLLECTION: &'static str = schema::DEVICE_PROFILES;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "manufacturer", &self.manufacturer);
        set_entry(&mut out, Self::COLLECTION, "model", &self.model);
        for label in &self.labels {
            set_entry(&mut out, Self::COLLECTION, "label", label);
        }
        out
    }

    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(&StoredDeviceProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            labels: self.labels.clone(),
            created: self.created,
            modified: self.modified,
            origin: self.origin,
            command_ids: self.commands.iter().map(|c| c.id.clone()).collect(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let stored: StoredDeviceProfile = from_blob(bytes)?;
        Ok(DeviceProfile {
            id: stored.id,
            name: stored.name,
            description: stored.description,
            manufacturer: stored.manufacturer,
            model: stored.model,
            labels: stored.labels,
            created: stored.created,
            modified: stored.modified,
            origin: stored.origin,
            commands: stored
                .command_ids
                .into_iter()
                .map(|id| Command { id, ..Default::default() })
                .collect(),
        })
    }
}

impl Document for Addressable {
    const COLLECTION: &'static str = schema::ADDRESSABLES;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "topic", &self.topic);
        set_entry(&mut out, Self::COLLECTION, "publisher", &self.publisher);
        set_entry(&mut out, Self::COLLECTION, "address", &self.address);
        if self.port != 0 {
            set_entry(&mut out, Self::COLLECTION, "port", &self.port.to_string());
        }
        out
    }
}

impl Document for Command {
    const COLLECTION: &'static str = schema::COMMANDS;

    document_identity!();

    // Command names repeat across profiles; no uniqueness hash.

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "name", &self.name);
        out
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredProvisionWatcher {
    id: String,
    name: String,
    identifiers: std::collections::BTreeMap<String, String>,
    operating_state: verdin_core::models::OperatingState,
    created: i64,
    modified: i64,
    origin: i64,
    profile_id: String,
    profile_name: String,
    service_id: String,
    service_name: String,
}

impl Document for ProvisionWatcher {
    const COLLECTION: &'static str = schema::PROVISION_WATCHERS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "profile", &self.profile.id);
        set_entry(&mut out, Self::COLLECTION, "service", &self.service.id);
        for (key, value) in &self.identifiers {
            set_entry(
                &mut out,
                Self::COLLECTION,
                "identifier",
                &format!("{key}:{value}"),
            );
        }
        out
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference {
                field: "profile",
                collection: schema::DEVICE_PROFILES,
                id: self.profile.id.clone(),
                name: self.profile.name.clone(),
            },
            Reference {
                field: "service",
                collection: schema::DEVICE_SERVICES,
                id: self.service.id.clone(),
                name: self.service.name.clone(),
            },
        ]
    }

    fn apply_reference(&mut self, field: &'static str, id: &str) {
        match field {
            "profile" => self.profile.id = id.to_string(),
            "service" => self.service.id = id.to_string(),
            _ => {}
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(&StoredProvisionWatcher {
            id: self.id.clone(),
            name: self.name.clone(),
            identifiers: self.identifiers.clone(),
            operating_state: self.operating_state,
            created: self.created,
            modified: self.modified,
            origin: self.origin,
            profile_id: self.profile.id.clone(),
            profile_name: self.profile.name.clone(),
            service_id: self.service.id.clone(),
            service_name: self.service.name.clone(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let stored: StoredProvisionWatcher = from_blob(bytes)?;
        Ok(ProvisionWatcher {
            id: stored.id,
            name: stored.name,
            identifiers: stored.identifiers,
            operating_state: stored.operating_state,
            created: stored.created,
            modified: stored.modified,
            origin: stored.origin,
            profile: DeviceProfile {
                id: stored.profile_id,
                name: stored.profile_name,
                ..Default::default()
            },
            service: DeviceService {
                id: stored.service_id,
                name: stored.service_name,
                ..Default::default()
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

impl Document for Schedule {
    const COLLECTION: &'static str = schema::SCHEDULES;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        Vec::new()
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct StoredScheduleEvent {
    id: String,
    name: String,
    schedule: String,
    parameters: String,
    service: String,
    created: i64,
    modified: i64,
    origin: i64,
    addressable_id: String,
    addressable_name: String,
}

impl Document for ScheduleEvent {
    const COLLECTION: &'static str = schema::SCHEDULE_EVENTS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "schedule", &self.schedule);
        set_entry(&mut out, Self::COLLECTION, "service", &self.service);
        set_entry(&mut out, Self::COLLECTION, "addressable", &self.addressable.id);
        out
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            field: "addressable",
            collection: schema::ADDRESSABLES,
            id: self.addressable.id.clone(),
            name: self.addressable.name.clone(),
        }]
    }

    fn apply_reference(&mut self, field: &'static str, id: &str) {
        if field == "addressable" {
            self.addressable.id = id.to_string();
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        to_blob(&StoredScheduleEvent {
            id: self.id.clone(),
            name: self.name.clone(),
            schedule: self.schedule.clone(),
            parameters: self.parameters.clone(),
            service: self.service.clone(),
            created: self.created,
            modified: self.modified,
            origin: self.origin,
            addressable_id: self.addressable.id.clone(),
            addressable_name: self.addressable.name.clone(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let stored: StoredScheduleEvent = from_blob(bytes)?;
        Ok(ScheduleEvent {
            id: stored.id,
            name: stored.name,
            schedule: stored.schedule,
            parameters: stored.parameters,
            service: stored.service,
            created: stored.created,
            modified: stored.modified,
            origin: stored.origin,
            addressable: Addressable {
                id: stored.addressable_id,
                name: stored.addressable_name,
                ..Default::default()
            },
        })
    }
}

impl Document for Interval {
    const COLLECTION: &'static str = schema::INTERVALS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        Vec::new()
    }
}

impl Document for IntervalAction {
    const COLLECTION: &'static str = schema::INTERVAL_ACTIONS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "interval", &self.interval);
        set_entry(&mut out, Self::COLLECTION, "target", &self.target);
        out
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

impl Document for Notification {
    const COLLECTION: &'static str = schema::NOTIFICATIONS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.slug.clone())
    }

    // Field indexes are creation-ordered so limited queries return the
    // oldest entries, matching the time-windowed reads.
    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = vec![
            IndexEntry::zset(schema::time_key(Self::COLLECTION, "created"), self.created),
            IndexEntry::zset(schema::time_key(Self::COLLECTION, "modified"), self.modified),
        ];
        for (field, value) in [
            ("sender", &self.sender),
            ("severity", &self.severity),
            ("status", &self.status),
        ] {
            if !value.is_empty() {
                out.push(IndexEntry::zset(
                    schema::field_key(Self::COLLECTION, field, value),
                    self.created,
                ));
            }
        }
        for label in &self.labels {
            out.push(IndexEntry::zset(
                schema::field_key(Self::COLLECTION, "label", label),
                self.created,
            ));
        }
        out
    }
}

impl Document for Subscription {
    const COLLECTION: &'static str = schema::SUBSCRIPTIONS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.slug.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = Vec::new();
        set_entry(&mut out, Self::COLLECTION, "receiver", &self.receiver);
        for category in &self.subscribed_categories {
            set_entry(&mut out, Self::COLLECTION, "category", category);
        }
        for label in &self.subscribed_labels {
            set_entry(&mut out, Self::COLLECTION, "label", label);
        }
        out
    }
}

impl Document for Transmission {
    const COLLECTION: &'static str = schema::TRANSMISSIONS;

    document_identity!();

    // Transmissions are never unique; redeliveries accumulate.

    fn index_entries(&self) -> Vec<IndexEntry> {
        let mut out = vec![
            IndexEntry::zset(schema::time_key(Self::COLLECTION, "created"), self.created),
            IndexEntry::zset(schema::time_key(Self::COLLECTION, "modified"), self.modified),
            IndexEntry::zset(
                schema::time_key(Self::COLLECTION, "resendcount"),
                self.resend_count,
            ),
        ];
        if !self.notification_slug.is_empty() {
            out.push(IndexEntry::zset(
                schema::field_key(Self::COLLECTION, "slug", &self.notification_slug),
                self.resend_count,
            ));
        }
        if !self.status.is_empty() {
            out.push(IndexEntry::zset(
                schema::field_key(Self::COLLECTION, "status", &self.status),
                self.resend_count,
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

impl Document for ExportRegistration {
    const COLLECTION: &'static str = schema::EXPORT_REGISTRATIONS;

    document_identity!();

    fn unique_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn index_entries(&self) -> Vec<IndexEntry> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_round_trips_with_reading_stubs() {
        let event = Event {
            id: "e1".into(),
            device: "therm-1".into(),
            created: 42,
            readings: vec![
                Reading { id: "r1".into(), value: "20".into(), ..Default::default() },
                Reading { id: "r2".into(), value: "21".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        let decoded = Event::decode(&event.encode().unwrap()).unwrap();
        assert_eq!(decoded.id, "e1");
        assert_eq!(decoded.device, "therm-1");
        let ids: Vec<&str> = decoded.readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2"]);
        // Stub readings carry the id only.
        assert!(decoded.readings[0].value.is_empty());
    }

    #[test]
    fn device_projects_references() {
        let device = Device {
            id: "d1".into(),
            name: "camera-north".into(),
            service: DeviceService { id: "s1".into(), name: "svc".into(), ..Default::default() },
            profile: DeviceProfile {
                id: "p1".into(),
                name: "cam".into(),
                manufacturer: "acme".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let decoded = Device::decode(&device.encode().unwrap()).unwrap();
        assert_eq!(decoded.service.id, "s1");
        assert_eq!(decoded.service.name, "svc");
        assert_eq!(decoded.profile.id, "p1");
        // Projection drops everything but (id, name).
        assert!(decoded.profile.manufacturer.is_empty());
    }

    #[test]
    fn index_entries_match_on_decode() {
        let device = Device {
            id: "d1".into(),
            name: "camera-north".into(),
            labels: vec!["outdoor".into()],
            service: DeviceService { id: "s1".into(), ..Default::default() },
            profile: DeviceProfile { id: "p1".into(), ..Default::default() },
            ..Default::default()
        };
        let decoded = Device::decode(&device.encode().unwrap()).unwrap();
        // Delete mirrors insert only if the stored copy yields the same
        // entries the original produced.
        assert_eq!(device.index_entries(), decoded.index_entries());
    }

    #[test]
    fn empty_field_values_are_not_indexed() {
        let addressable = Addressable { id: "a1".into(), name: "mqtt".into(), ..Default::default() };
        assert!(addressable.index_entries().is_empty());

        let bare = Reading { id: "r1".into(), created: 7, ..Default::default() };
        let entries = bare.index_entries();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["reading:created"]);

        let full = Addressable {
            id: "a1".into(),
            name: "mqtt".into(),
            topic: "edge/up".into(),
            publisher: "edge".into(),
            address: "broker.local".into(),
            port: 1883,
            ..Default::default()
        };
        assert_eq!(full.index_entries().len(), 4);
    }
}
