//! Scheduling models: legacy schedules and the interval forms that
//! replaced them. Both are persisted; services migrate at their own
//! pace.

use serde::{Deserialize, Serialize};

use super::Addressable;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    pub start: String,
    pub end: String,
    pub frequency: String,
    pub cron: String,
    pub run_once: bool,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}

/// An action fired by a schedule. References an addressable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleEvent {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    /// Name of the owning schedule.
    pub schedule: String,
    pub parameters: String,
    /// Name of the service the action is dispatched to.
    pub service: String,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
    pub addressable: Addressable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interval {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    pub start: String,
    pub end: String,
    pub frequency: String,
    pub cron: String,
    pub run_once: bool,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntervalAction {
    pub id: String,
    /// Business-unique name.
    pub name: String,
    /// Name of the interval that triggers this action.
    pub interval: String,
    pub parameters: String,
    /// Name of the target service or endpoint.
    pub target: String,
    pub protocol: String,
    pub http_method: String,
    pub address: String,
    pub port: i32,
    pub path: String,
    pub publisher: String,
    pub user: String,
    pub password: String,
    pub topic: String,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}
