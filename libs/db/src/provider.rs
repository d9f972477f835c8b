//! The data-access contract.
//!
//! Services depend on these traits, not on a concrete backend. One
//! trait per service domain; [`DataStore`] is the union for callers
//! that want everything. [`crate::Client`] implements all of them.
//!
//! Shared semantics, uniform across collections:
//!
//! - `add_*` validates or assigns the id, stamps `created`/`modified`,
//!   hardens references, and commits one atomic transaction. A taken
//!   business key fails [`Error::NotUnique`]; a bad reference fails
//!   [`Error::InvalidReference`].
//! - `update_*` merges incoming set fields over the stored copy, then
//!   deletes and reinserts in one transaction. A missing entity fails
//!   [`Error::NotFound`].
//! - `*_by_id` / `*_by_name` fail [`Error::NotFound`] when absent and
//!   [`Error::InvalidIdentifier`] on a malformed id.
//! - A `limit` of zero always yields an empty result.
//!
//! [`Error::NotUnique`]: crate::Error::NotUnique
//! [`Error::InvalidReference`]: crate::Error::InvalidReference
//! [`Error::NotFound`]: crate::Error::NotFound
//! [`Error::InvalidIdentifier`]: crate::Error::InvalidIdentifier

use async_trait::async_trait;

use verdin_core::models::{
    Addressable, Command, Device, DeviceProfile, DeviceService, Event, ExportRegistration,
    Interval, IntervalAction, Notification, ProvisionWatcher, Reading, Schedule, ScheduleEvent,
    Subscription, Transmission, ValueDescriptor,
};

use crate::error::Result;

/// Events, readings, and value descriptors.
#[async_trait]
pub trait CoreDataStore: Send + Sync {
    async fn events(&self) -> Result<Vec<Event>>;
    async fn events_with_limit(&self, limit: usize) -> Result<Vec<Event>>;
    /// Persists the event and its readings in one transaction and
    /// returns the event id.
    async fn add_event(&self, event: Event) -> Result<String>;
    /// Updates event fields; the owned reading set is left as stored.
    async fn update_event(&self, event: Event) -> Result<()>;
    async fn event_by_id(&self, id: &str) -> Result<Event>;
    async fn events_by_checksum(&self, checksum: &str) -> Result<Vec<Event>>;
    async fn event_count(&self) -> Result<u64>;
    async fn event_count_by_device(&self, device: &str) -> Result<u64>;
    /// Removes the event and its readings.
    async fn delete_event_by_id(&self, id: &str) -> Result<()>;
    /// Removes every event of a device, cascading readings; returns
    /// the number of events removed.
    async fn delete_events_by_device(&self, device: &str) -> Result<usize>;
    async fn events_by_device(&self, device: &str, limit: usize) -> Result<Vec<Event>>;
    async fn events_by_creation_time(&self, start: i64, end: i64, limit: usize)
        -> Result<Vec<Event>>;
    /// Events created at least `age_ms` ago.
    async fn events_older_than(&self, age_ms: i64) -> Result<Vec<Event>>;
    /// Events already delivered upstream (`pushed > 0`).
    async fn events_pushed(&self) -> Result<Vec<Event>>;
    /// Drops all events and readings, blobs and indexes alike.
    async fn scrub_all_events(&self) -> Result<()>;

    async fn readings(&self) -> Result<Vec<Reading>>;
    async fn add_reading(&self, reading: Reading) -> Result<String>;
    async fn update_reading(&self, reading: Reading) -> Result<()>;
    async fn reading_by_id(&self, id: &str) -> Result<Reading>;
    async fn reading_count(&self) -> Result<u64>;
    async fn delete_reading_by_id(&self, id: &str) -> Result<()>;
    async fn delete_readings_by_device(&self, device: &str) -> Result<usize>;
    /// Latest readings first.
    async fn readings_by_device(&self, device: &str, limit: usize) -> Result<Vec<Reading>>;
    async fn readings_by_value_descriptor(&self, name: &str, limit: usize)
        -> Result<Vec<Reading>>;
    async fn readings_by_value_descriptor_names(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<Reading>>;
    async fn readings_by_creation_time(
        &self,
        start: i64,
        end: i64,
        limit: usize,
    ) -> Result<Vec<Reading>>;
    async fn readings_by_device_and_value_descriptor(
        &self,
        device: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Reading>>;

    async fn value_descriptors(&self) -> Result<Vec<ValueDescriptor>>;
    async fn add_value_descriptor(&self, descriptor: ValueDescriptor) -> Result<String>;
    async fn update_value_descriptor(&self, descriptor: ValueDescriptor) -> Result<()>;
    async fn delete_value_descriptor_by_id(&self, id: &str) -> Result<()>;
    async fn value_descriptor_by_id(&self, id: &str) -> Result<ValueDescriptor>;
    async fn value_descriptor_by_name(&self, name: &str) -> Result<ValueDescriptor>;
    async fn value_descriptors_by_uom_label(&self, label: &str) -> Result<Vec<ValueDescriptor>>;
    async fn value_descriptors_by_label(&self, label: &str) -> Result<Vec<ValueDescriptor>>;
    async fn value_descriptors_by_type(&self, value_type: &str) -> Result<Vec<ValueDescriptor>>;
    async fn scrub_all_value_descriptors(&self) -> Result<()>;
}

/// Devices, profiles, services, addressables, provision watchers, and
/// commands.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn devices(&self) -> Result<Vec<Device>>;
    async fn add_device(&self, device: Device) -> Result<String>;
    async fn update_device(&self, device: Device) -> Result<()>;
    async fn device_by_id(&self, id: &str) -> Result<Device>;
    async fn device_by_name(&self, name: &str) -> Result<Device>;
    async fn delete_device_by_id(&self, id: &str) -> Result<()>;
    async fn devices_by_profile_id(&self, profile_id: &str) -> Result<Vec<Device>>;
    async fn devices_by_service_id(&self, service_id: &str) -> Result<Vec<Device>>;
    async fn devices_by_label(&self, label: &str) -> Result<Vec<Device>>;

    async fn device_profiles(&self) -> Result<Vec<DeviceProfile>>;
    /// Persists the profile and its commands in one transaction.
    async fn add_device_profile(&self, profile: DeviceProfile) -> Result<String>;
    /// Updates profile fields; the owned command set is left as stored.
    async fn update_device_profile(&self, profile: DeviceProfile) -> Result<()>;
    async fn device_profile_by_id(&self, id: &str) -> Result<DeviceProfile>;
    async fn device_profile_by_name(&self, name: &str) -> Result<DeviceProfile>;
    /// Fails [`Error::StillInUse`] while devices reference the profile;
    /// otherwise removes the profile and its commands.
    ///
    /// [`Error::StillInUse`]: crate::Error::StillInUse
    async fn delete_device_profile_by_id(&self, id: &str) -> Result<()>;
    async fn device_profiles_by_model(&self, model: &str) -> Result<Vec<DeviceProfile>>;
    async fn device_profiles_by_manufacturer(
        &self,
        manufacturer: &str,
    ) -> Result<Vec<DeviceProfile>>;
    async fn device_profiles_by_manufacturer_model(
        &self,
        manufacturer: &str,
        model: &str,
    ) -> Result<Vec<DeviceProfile>>;
    async fn device_profiles_by_label(&self, label: &str) -> Result<Vec<DeviceProfile>>;

    async fn commands(&self) -> Result<Vec<Command>>;
    async fn command_by_id(&self, id: &str) -> Result<Command>;
    async fn commands_by_name(&self, name: &str) -> Result<Vec<Command>>;
    /// Fails [`Error::NotFound`] when the profile itself is missing.
    ///
    /// [`Error::NotFound`]: crate::Error::NotFound
    async fn commands_by_profile_id(&self, profile_id: &str) -> Result<Vec<Command>>;
    /// Fails [`Error::StillInUse`] while a profile owns the command.
    ///
    /// [`Error::StillInUse`]: crate::Error::StillInUse
    async fn delete_command_by_id(&self, id: &str) -> Result<()>;

    async fn device_services(&self) -> Result<Vec<DeviceService>>;
    async fn add_device_service(&self, service: DeviceService) -> Result<String>;
    async fn update_device_service(&self, service: DeviceService) -> Result<()>;
    async fn device_service_by_id(&self, id: &str) -> Result<DeviceService>;
    async fn device_service_by_name(&self, name: &str) -> Result<DeviceService>;
    async fn delete_device_service_by_id(&self, id: &str) -> Result<()>;
    async fn device_services_by_addressable_id(
        &self,
        addressable_id: &str,
    ) -> Result<Vec<DeviceService>>;
    async fn device_services_by_label(&self, label: &str) -> Result<Vec<DeviceService>>;

    async fn addressables(&self) -> Result<Vec<Addressable>>;
    async fn add_addressable(&self, addressable: Addressable) -> Result<String>;
    async fn update_addressable(&self, addressable: Addressable) -> Result<()>;
    async fn addressable_by_id(&self, id: &str) -> Result<Addressable>;
    async fn addressable_by_name(&self, name: &str) -> Result<Addressable>;
    async fn delete_addressable_by_id(&self, id: &str) -> Result<()>;
    async fn addressables_by_topic(&self, topic: &str) -> Result<Vec<Addressable>>;
    async fn addressables_by_port(&self, port: i32) -> Result<Vec<Addressable>>;
    async fn addressables_by_publisher(&self, publisher: &str) -> Result<Vec<Addressable>>;
    async fn addressables_by_address(&self, address: &str) -> Result<Vec<Addressable>>;

    async fn provision_watchers(&self) -> Result<Vec<ProvisionWatcher>>;
    async fn add_provision_watcher(&self, watcher: ProvisionWatcher) -> Result<String>;
    async fn update_provision_watcher(&self, watcher: ProvisionWatcher) -> Result<()>;
    async fn provision_watcher_by_id(&self, id: &str) -> Result<ProvisionWatcher>;
    async fn provision_watcher_by_name(&self, name: &str) -> Result<ProvisionWatcher>;
    async fn delete_provision_watcher_by_id(&self, id: &str) -> Result<()>;
    async fn provision_watchers_by_profile_id(
        &self,
        profile_id: &str,
    ) -> Result<Vec<ProvisionWatcher>>;
    async fn provision_watchers_by_service_id(
        &self,
        service_id: &str,
    ) -> Result<Vec<ProvisionWatcher>>;
    async fn provision_watchers_by_identifier(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<ProvisionWatcher>>;

    /// Drops every metadata collection, blobs and indexes alike.
    async fn scrub_metadata(&self) -> Result<()>;
}

/// Legacy schedules and the interval forms that replaced them.
#[async_trait]
pub trait SchedulerStore: Send + Sync {
    async fn schedules(&self) -> Result<Vec<Schedule>>;
    async fn add_schedule(&self, schedule: Schedule) -> Result<String>;
    async fn update_schedule(&self, schedule: Schedule) -> Result<()>;
    async fn schedule_by_id(&self, id: &str) -> Result<Schedule>;
    async fn schedule_by_name(&self, name: &str) -> Result<Schedule>;
    async fn delete_schedule_by_id(&self, id: &str) -> Result<()>;

    async fn schedule_events(&self) -> Result<Vec<ScheduleEvent>>;
    async fn add_schedule_event(&self, event: ScheduleEvent) -> Result<String>;
    async fn update_schedule_event(&self, event: ScheduleEvent) -> Result<()>;
    async fn schedule_event_by_id(&self, id: &str) -> Result<ScheduleEvent>;
    async fn schedule_event_by_name(&self, name: &str) -> Result<ScheduleEvent>;
    async fn delete_schedule_event_by_id(&self, id: &str) -> Result<()>;
    async fn schedule_events_by_schedule_name(&self, name: &str) -> Result<Vec<ScheduleEvent>>;
    async fn schedule_events_by_addressable_id(&self, id: &str) -> Result<Vec<ScheduleEvent>>;

    async fn intervals(&self) -> Result<Vec<Interval>>;
    async fn intervals_with_limit(&self, limit: usize) -> Result<Vec<Interval>>;
    async fn add_interval(&self, interval: Interval) -> Result<String>;
    async fn update_interval(&self, interval: Interval) -> Result<()>;
    async fn interval_by_id(&self, id: &str) -> Result<Interval>;
    async fn interval_by_name(&self, name: &str) -> Result<Interval>;
    async fn delete_interval_by_id(&self, id: &str) -> Result<()>;
    async fn scrub_all_intervals(&self) -> Result<()>;

    async fn interval_actions(&self) -> Result<Vec<IntervalAction>>;
    async fn add_interval_action(&self, action: IntervalAction) -> Result<String>;
    async fn update_interval_action(&self, action: IntervalAction) -> Result<()>;
    async fn interval_action_by_id(&self, id: &str) -> Result<IntervalAction>;
    async fn interval_action_by_name(&self, name: &str) -> Result<IntervalAction>;
    async fn delete_interval_action_by_id(&self, id: &str) -> Result<()>;
    async fn interval_actions_by_interval_name(&self, name: &str) -> Result<Vec<IntervalAction>>;
    async fn interval_actions_by_target(&self, target: &str) -> Result<Vec<IntervalAction>>;
    async fn scrub_all_interval_actions(&self) -> Result<()>;
}

/// Notifications, subscriptions, and transmissions.
#[async_trait]
pub trait NotificationsStore: Send + Sync {
    async fn notifications(&self) -> Result<Vec<Notification>>;
    async fn add_notification(&self, notification: Notification) -> Result<String>;
    async fn update_notification(&self, notification: Notification) -> Result<()>;
    async fn notification_by_id(&self, id: &str) -> Result<Notification>;
    async fn notification_by_slug(&self, slug: &str) -> Result<Notification>;
    async fn notifications_by_sender(&self, sender: &str, limit: usize)
        -> Result<Vec<Notification>>;
    async fn notifications_by_status(&self, status: &str, limit: usize)
        -> Result<Vec<Notification>>;
    async fn notifications_by_labels(
        &self,
        labels: &[String],
        limit: usize,
    ) -> Result<Vec<Notification>>;
    async fn notifications_by_creation_time(
        &self,
        start: i64,
        end: i64,
        limit: usize,
    ) -> Result<Vec<Notification>>;
    /// Removes the notification and its transmissions.
    async fn delete_notification_by_id(&self, id: &str) -> Result<()>;
    async fn delete_notification_by_slug(&self, slug: &str) -> Result<()>;
    /// Removes every notification (and its transmissions) not modified
    /// within the last `age_ms` milliseconds.
    async fn cleanup_old(&self, age_ms: i64) -> Result<()>;
    /// Removes every notification and transmission.
    async fn cleanup(&self) -> Result<()>;

    async fn subscriptions(&self) -> Result<Vec<Subscription>>;
    async fn add_subscription(&self, subscription: Subscription) -> Result<String>;
    async fn update_subscription(&self, subscription: Subscription) -> Result<()>;
    async fn subscription_by_id(&self, id: &str) -> Result<Subscription>;
    async fn subscription_by_slug(&self, slug: &str) -> Result<Subscription>;
    async fn subscriptions_by_receiver(&self, receiver: &str) -> Result<Vec<Subscription>>;
    async fn subscriptions_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Subscription>>;
    async fn subscriptions_by_labels(&self, labels: &[String]) -> Result<Vec<Subscription>>;
    async fn subscriptions_by_categories_labels(
        &self,
        categories: &[String],
        labels: &[String],
    ) -> Result<Vec<Subscription>>;
    async fn delete_subscription_by_id(&self, id: &str) -> Result<()>;
    async fn delete_subscription_by_slug(&self, slug: &str) -> Result<()>;

    async fn add_transmission(&self, transmission: Transmission) -> Result<String>;
    async fn update_transmission(&self, transmission: Transmission) -> Result<()>;
    async fn transmission_by_id(&self, id: &str) -> Result<Transmission>;
    /// A negative `resend_limit` disables the resend-count filter.
    async fn transmissions_by_notification_slug(
        &self,
        slug: &str,
        resend_limit: i64,
    ) -> Result<Vec<Transmission>>;
    async fn transmissions_by_status(
        &self,
        status: &str,
        resend_limit: i64,
    ) -> Result<Vec<Transmission>>;
    async fn transmissions_by_time(
        &self,
        start: i64,
        end: i64,
        resend_limit: i64,
    ) -> Result<Vec<Transmission>>;
    async fn delete_transmissions_by_notification_slug(&self, slug: &str) -> Result<()>;
}

/// Export destination registrations.
#[async_trait]
pub trait ExportStore: Send + Sync {
    async fn registrations(&self) -> Result<Vec<ExportRegistration>>;
    async fn add_registration(&self, registration: ExportRegistration) -> Result<String>;
    async fn update_registration(&self, registration: ExportRegistration) -> Result<()>;
    async fn registration_by_id(&self, id: &str) -> Result<ExportRegistration>;
    async fn registration_by_name(&self, name: &str) -> Result<ExportRegistration>;
    async fn delete_registration_by_id(&self, id: &str) -> Result<()>;
    async fn delete_registration_by_name(&self, name: &str) -> Result<()>;
    async fn scrub_all_registrations(&self) -> Result<()>;
}

/// The whole contract; implemented automatically for any type that
/// implements every domain trait.
pub trait DataStore:
    CoreDataStore + MetadataStore + SchedulerStore + NotificationsStore + ExportStore
{
}

impl<T> DataStore for T where
    T: CoreDataStore + MetadataStore + SchedulerStore + NotificationsStore + ExportStore
{
}
