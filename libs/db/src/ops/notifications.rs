//! Notification operations: notifications, subscriptions, and
//! transmissions, plus age-based cleanup.
//!
//! Deleting a notification cascades to its transmissions through the
//! per-slug score set. Transmission slug/status indexes are scored by
//! resend count, so resend-limit filters are plain score ranges.

use async_trait::async_trait;
use tracing::{debug, info};

use verdin_core::models::{Notification, Subscription, Transmission};
use verdin_core::{timestamp_ms, ObjectId};

use crate::client::Client;
use crate::error::Result;
use crate::kv::{Order, Session, Tx};
use crate::mutation::{add_doc, delete_doc, exec_guarded, remove_ops, update_doc};
use crate::provider::NotificationsStore;
use crate::query;
use crate::schema;

/// Mirror removal for a notification and every transmission carrying
/// its slug.
fn delete_notification_tx(
    session: &mut dyn Session,
    notification: &Notification,
) -> Result<Tx> {
    let mut tx = remove_ops(notification);
    let slug_key = schema::field_key(schema::TRANSMISSIONS, "slug", &notification.slug);
    for id in session.zrange(&slug_key, 0, -1, Order::Asc)? {
        let transmission: Transmission = query::get_by_id(session, &id)?;
        tx.merge(remove_ops(&transmission));
    }
    Ok(tx)
}

#[async_trait]
impl NotificationsStore for Client {
    async fn notifications(&self) -> Result<Vec<Notification>> {
        let mut s = self.session().await?;
        query::all::<Notification>(&mut *s)
    }

    async fn add_notification(&self, notification: Notification) -> Result<String> {
        let mut s = self.session().await?;
        let notification = add_doc(&mut *s, notification)?;
        Ok(notification.id)
    }

    async fn update_notification(&self, notification: Notification) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, notification).map(|_| ())
    }

    async fn notification_by_id(&self, id: &str) -> Result<Notification> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn notification_by_slug(&self, slug: &str) -> Result<Notification> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, slug)
    }

    async fn notifications_by_sender(
        &self,
        sender: &str,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::NOTIFICATIONS, "sender", sender);
        query::head(&mut *s, &key, limit, Order::Asc)
    }

    async fn notifications_by_status(
        &self,
        status: &str,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::NOTIFICATIONS, "status", status);
        query::head(&mut *s, &key, limit, Order::Asc)
    }

    async fn notifications_by_labels(
        &self,
        labels: &[String],
        limit: usize,
    ) -> Result<Vec<Notification>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut s = self.session().await?;
        // Label indexes are creation-scored; merge the per-label ranges
        // and keep the oldest entries across all of them.
        let mut ids = Vec::new();
        for label in labels {
            let key = schema::field_key(schema::NOTIFICATIONS, "label", label);
            for id in s.zrange(&key, 0, -1, Order::Asc)? {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        let mut found: Vec<Notification> = query::fetch_many(&mut *s, &ids)?;
        found.sort_by_key(|n| n.created);
        found.truncate(limit);
        Ok(found)
    }

    async fn notifications_by_creation_time(
        &self,
        start: i64,
        end: i64,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut s = self.session().await?;
        let key = schema::time_key(schema::NOTIFICATIONS, "created");
        query::by_score(&mut *s, &key, Some(start), Some(end), Some(limit))
    }

    async fn delete_notification_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let notification: Notification = query::get_by_id(&mut *s, id)?;
        let tx = delete_notification_tx(&mut *s, &notification)?;
        exec_guarded(&mut *s, tx)?;
        debug!(id, slug = %notification.slug, "notification deleted");
        Ok(())
    }

    async fn delete_notification_by_slug(&self, slug: &str) -> Result<()> {
        let mut s = self.session().await?;
        let notification: Notification = query::get_by_name(&mut *s, slug)?;
        let tx = delete_notification_tx(&mut *s, &notification)?;
        exec_guarded(&mut *s, tx)?;
        debug!(slug, "notification deleted");
        Ok(())
    }

    async fn cleanup_old(&self, age_ms: i64) -> Result<()> {
        let mut s = self.session().await?;
        let cutoff = timestamp_ms() - age_ms;
        let key = schema::time_key(schema::NOTIFICATIONS, "modified");
        let ids = s.zrange_by_score(&key, None, Some(cutoff), None)?;
        let removed = ids.len();
        for id in ids {
            let notification: Notification = query::get_by_id(&mut *s, &id)?;
            let tx = delete_notification_tx(&mut *s, &notification)?;
            exec_guarded(&mut *s, tx)?;
        }
        info!(age_ms, removed, "cleaned up old notifications");
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        let mut s = self.session().await?;
        super::scrub_collection(&mut *s, schema::NOTIFICATIONS)?;
        super::scrub_collection(&mut *s, schema::TRANSMISSIONS)?;
        info!("cleaned up all notifications and transmissions");
        Ok(())
    }

    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut s = self.session().await?;
        query::all::<Subscription>(&mut *s)
    }

    async fn add_subscription(&self, subscription: Subscription) -> Result<String> {
        let mut s = self.session().await?;
        let subscription = add_doc(&mut *s, subscription)?;
        Ok(subscription.id)
    }

    async fn update_subscription(&self, subscription: Subscription) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, subscription).map(|_| ())
    }

    async fn subscription_by_id(&self, id: &str) -> Result<Subscription> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn subscription_by_slug(&self, slug: &str) -> Result<Subscription> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, slug)
    }

    async fn subscriptions_by_receiver(&self, receiver: &str) -> Result<Vec<Subscription>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::SUBSCRIPTIONS, "receiver", receiver);
        query::by_set(&mut *s, &key)
    }

    async fn subscriptions_by_categories(
        &self,
        categories: &[String],
    ) -> Result<Vec<Subscription>> {
        let mut s = self.session().await?;
        let keys: Vec<String> = categories
            .iter()
            .map(|c| schema::field_key(schema::SUBSCRIPTIONS, "category", c))
            .collect();
        query::by_union(&mut *s, &keys, None)
    }

    async fn subscriptions_by_labels(&self, labels: &[String]) -> Result<Vec<Subscription>> {
        let mut s = self.session().await?;
        let keys: Vec<String> = labels
            .iter()
            .map(|l| schema::field_key(schema::SUBSCRIPTIONS, "label", l))
            .collect();
        query::by_union(&mut *s, &keys, None)
    }

    async fn subscriptions_by_categories_labels(
        &self,
        categories: &[String],
        labels: &[String],
    ) -> Result<Vec<Subscription>> {
        let mut s = self.session().await?;
        let keys: Vec<String> = categories
            .iter()
            .map(|c| schema::field_key(schema::SUBSCRIPTIONS, "category", c))
            .chain(labels.iter().map(|l| schema::field_key(schema::SUBSCRIPTIONS, "label", l)))
            .collect();
        query::by_union(&mut *s, &keys, None)
    }

    async fn delete_subscription_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<Subscription>(&mut *s, id).map(|_| ())
    }

    async fn delete_subscription_by_slug(&self, slug: &str) -> Result<()> {
        let mut s = self.session().await?;
        let subscription: Subscription = query::get_by_name(&mut *s, slug)?;
        exec_guarded(&mut *s, remove_ops(&subscription))
    }

    async fn add_transmission(&self, transmission: Transmission) -> Result<String> {
        let mut s = self.session().await?;
        let transmission = add_doc(&mut *s, transmission)?;
        Ok(transmission.id)
    }

    async fn update_transmission(&self, transmission: Transmission) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, transmission).map(|_| ())
    }

    async fn transmission_by_id(&self, id: &str) -> Result<Transmission> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn transmissions_by_notification_slug(
        &self,
        slug: &str,
        resend_limit: i64,
    ) -> Result<Vec<Transmission>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::TRANSMISSIONS, "slug", slug);
        let max = if resend_limit < 0 { None } else { Some(resend_limit) };
        query::by_score(&mut *s, &key, None, max, None)
    }

    async fn transmissions_by_status(
        &self,
        status: &str,
        resend_limit: i64,
    ) -> Result<Vec<Transmission>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::TRANSMISSIONS, "status", status);
        let max = if resend_limit < 0 { None } else { Some(resend_limit) };
        query::by_score(&mut *s, &key, None, max, None)
    }

    async fn transmissions_by_time(
        &self,
        start: i64,
        end: i64,
        resend_limit: i64,
    ) -> Result<Vec<Transmission>> {
        let mut s = self.session().await?;
        let created = schema::time_key(schema::TRANSMISSIONS, "created");
        let resends = schema::time_key(schema::TRANSMISSIONS, "resendcount");
        let ids = s.zrange_by_score(&created, Some(start), Some(end), None)?;
        let mut kept = Vec::with_capacity(ids.len());
        for id in ids {
            let over_limit = resend_limit >= 0
                && s.zscore(&resends, &id)?.map_or(true, |n| n > resend_limit as f64);
            if !over_limit {
                kept.push(id);
            }
        }
        query::fetch_many(&mut *s, &kept)
    }

    async fn delete_transmissions_by_notification_slug(&self, slug: &str) -> Result<()> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::TRANSMISSIONS, "slug", slug);
        let ids = s.zrange(&key, 0, -1, Order::Asc)?;
        let mut tx = Tx::new();
        let removed = ids.len();
        for id in ids {
            let transmission: Transmission = query::get_by_id(&mut *s, &id)?;
            tx.merge(remove_ops(&transmission));
        }
        exec_guarded(&mut *s, tx)?;
        debug!(slug, removed, "transmissions deleted by slug");
        Ok(())
    }
}
