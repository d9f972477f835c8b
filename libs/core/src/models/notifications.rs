//! Alerts and notifications models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    pub id: String,
    /// Business-unique, human-readable key.
    pub slug: String,
    pub sender: String,
    pub category: String,
    pub severity: String,
    pub content: String,
    pub content_type: String,
    pub description: String,
    /// Lifecycle status: NEW, PROCESSED, ESCALATED.
    pub status: String,
    pub labels: Vec<String>,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscription {
    pub id: String,
    /// Business-unique, human-readable key.
    pub slug: String,
    pub receiver: String,
    pub description: String,
    pub subscribed_categories: Vec<String>,
    pub subscribed_labels: Vec<String>,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}

/// One delivery attempt record for a notification. Never name-unique;
/// redeliveries accumulate and bump `resend_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transmission {
    pub id: String,
    /// Slug of the notification this delivery belongs to.
    pub notification_slug: String,
    pub receiver: String,
    /// Delivery status: SENT, FAILED, ACKNOWLEDGED, ...
    pub status: String,
    pub resend_count: i64,
    pub records: Vec<String>,
    pub created: i64,
    pub modified: i64,
    pub origin: i64,
}
