//! Entity models for the edge platform.
//!
//! These are plain data carriers with serde derives. Reference fields
//! hold the full referenced entity; the storage layer persists only an
//! `(id, name)` projection of a reference and re-resolves the rest when
//! reading back.

mod data;
mod export;
mod metadata;
mod notifications;
mod scheduler;

pub use data::{Event, Reading, ValueDescriptor};
pub use export::ExportRegistration;
pub use metadata::{
    Action, Addressable, AdminState, Command, Device, DeviceProfile, DeviceService,
    OperatingState, ProvisionWatcher, Response,
};
pub use notifications::{Notification, Subscription, Transmission};
pub use scheduler::{Interval, IntervalAction, Schedule, ScheduleEvent};
