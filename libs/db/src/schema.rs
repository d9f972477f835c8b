//! Collection names and key builders.
//!
//! The key layout is a compatibility surface shared with operational
//! tooling; nothing outside this module formats keys by hand.
//!
//! For a collection `c` and entity id `id`:
//!
//! | key                     | shape      | holds                         |
//! |-------------------------|------------|-------------------------------|
//! | `id`                    | blob       | the encoded entity            |
//! | `c`                     | sorted set | all ids, score 0              |
//! | `c:name`                | hash       | business key -> id            |
//! | `c:<field>:<value>`     | set        | ids sharing a field value     |
//! | `c:<timefield>`         | sorted set | ids scored by timestamp       |

pub const EVENTS: &str = "event";
pub const READINGS: &str = "reading";
pub const VALUE_DESCRIPTORS: &str = "valueDescriptor";

pub const DEVICES: &str = "device";
pub const DEVICE_PROFILES: &str = "deviceProfile";
pub const DEVICE_SERVICES: &str = "deviceService";
pub const ADDRESSABLES: &str = "addressable";
pub const COMMANDS: &str = "command";
pub const PROVISION_WATCHERS: &str = "provisionWatcher";

pub const SCHEDULES: &str = "schedule";
pub const SCHEDULE_EVENTS: &str = "scheduleEvent";
pub const INTERVALS: &str = "interval";
pub const INTERVAL_ACTIONS: &str = "intervalAction";

pub const NOTIFICATIONS: &str = "notification";
pub const SUBSCRIPTIONS: &str = "subscription";
pub const TRANSMISSIONS: &str = "transmission";

pub const EXPORT_REGISTRATIONS: &str = "exportRegistration";

/// Every primary collection, for scrub-style maintenance.
pub const ALL_COLLECTIONS: &[&str] = &[
    EVENTS,
    READINGS,
    VALUE_DESCRIPTORS,
    DEVICES,
    DEVICE_PROFILES,
    DEVICE_SERVICES,
    ADDRESSABLES,
    COMMANDS,
    PROVISION_WATCHERS,
    SCHEDULES,
    SCHEDULE_EVENTS,
    INTERVALS,
    INTERVAL_ACTIONS,
    NOTIFICATIONS,
    SUBSCRIPTIONS,
    TRANSMISSIONS,
    EXPORT_REGISTRATIONS,
];

/// `c:name` — the uniqueness hash for a collection.
pub fn name_hash(collection: &str) -> String {
    format!("{collection}:name")
}

/// `c:<field>:<value>` — membership index for one field value.
pub fn field_key(collection: &str, field: &str, value: &str) -> String {
    format!("{collection}:{field}:{value}")
}

/// `c:<timefield>` — a timestamp-scored ordering.
pub fn time_key(collection: &str, field: &str) -> String {
    format!("{collection}:{field}")
}

/// `event:readings:<eventId>` — reading ids owned by one event.
pub fn event_readings(event_id: &str) -> String {
    field_key(EVENTS, "readings", event_id)
}

/// `deviceProfile:command:<commandId>` — profiles that own a command.
pub fn profiles_owning_command(command_id: &str) -> String {
    field_key(DEVICE_PROFILES, "command", command_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_the_layout_contract() {
        assert_eq!(name_hash(DEVICES), "device:name");
        assert_eq!(field_key(DEVICES, "label", "sensor"), "device:label:sensor");
        assert_eq!(time_key(EVENTS, "created"), "event:created");
        assert_eq!(event_readings("e1"), "event:readings:e1");
        assert_eq!(profiles_owning_command("c1"), "deviceProfile:command:c1");
    }

    #[test]
    fn collections_are_distinct() {
        let mut names: Vec<&str> = ALL_COLLECTIONS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_COLLECTIONS.len());
    }
}
