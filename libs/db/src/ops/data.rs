//! Core-data operations: events, readings, value descriptors.
//!
//! Events own their readings: one transaction writes the event, every
//! reading, and the ownership set; deletion mirrors it exactly.

use async_trait::async_trait;
use tracing::{debug, info};

use verdin_core::models::{Event, Reading, ValueDescriptor};
use verdin_core::{timestamp_ms, ObjectId};

use crate::client::Client;
use crate::document::{merge_over, Document};
use crate::error::Result;
use crate::kv::{Order, Session, Tx, WriteOp};
use crate::mutation::{
    add_doc, delete_doc, exec_guarded, insert_tx, prepare_new, remove_ops, update_doc,
};
use crate::provider::CoreDataStore;
use crate::query;
use crate::resolver;
use crate::schema;

/// Build the full write set for an event and its readings.
fn add_event_tx(event: &mut Event, now: i64) -> Result<Tx> {
    prepare_new(event, now)?;
    for reading in &mut event.readings {
        if reading.device.is_empty() {
            reading.device = event.device.clone();
        }
        prepare_new(reading, now)?;
    }

    // Readings first took their ids; the event blob stores them.
    let mut tx = insert_tx(event, false)?;
    for reading in &event.readings {
        tx.merge(insert_tx(reading, false)?);
        tx.push(WriteOp::ZAdd {
            key: schema::event_readings(event.id()),
            score: reading.created as f64,
            member: reading.id.clone(),
        });
    }
    Ok(tx)
}

/// Fetch an event with full readings and build its mirror removal,
/// cascading the readings and the ownership set.
fn delete_event_tx(session: &mut dyn Session, id: &str) -> Result<(Event, Tx)> {
    ObjectId::parse(id)?;
    let mut event: Event = query::get_by_id(session, id)?;
    resolver::resolve_event(session, &mut event, 0)?;

    let mut tx = remove_ops(&event);
    tx.push(WriteOp::Unlink { key: schema::event_readings(id) });
    for reading in &event.readings {
        tx.merge(remove_ops(reading));
    }
    Ok((event, tx))
}

#[async_trait]
impl CoreDataStore for Client {
    async fn events(&self) -> Result<Vec<Event>> {
        let mut s = self.session().await?;
        let events = query::all::<Event>(&mut *s)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn events_with_limit(&self, limit: usize) -> Result<Vec<Event>> {
        let mut s = self.session().await?;
        let events = query::all_limited::<Event>(&mut *s, limit)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn add_event(&self, mut event: Event) -> Result<String> {
        let mut s = self.session().await?;
        let tx = add_event_tx(&mut event, timestamp_ms())?;
        exec_guarded(&mut *s, tx)?;
        debug!(id = %event.id, readings = event.readings.len(), "event added");
        Ok(event.id)
    }

    async fn update_event(&self, event: Event) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(&event.id)?;
        let stored: Event = query::get_by_id(&mut *s, &event.id)?;
        let mut merged = merge_over(&event, &stored)?;
        // Reading ownership never changes through update.
        merged.readings = stored.readings.clone();
        merged.set_modified(timestamp_ms());

        let mut tx = remove_ops(&stored);
        tx.merge(insert_tx(&merged, false)?);
        exec_guarded(&mut *s, tx)
    }

    async fn event_by_id(&self, id: &str) -> Result<Event> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let mut event: Event = query::get_by_id(&mut *s, id)?;
        resolver::resolve_event(&mut *s, &mut event, 0)?;
        Ok(event)
    }

    async fn events_by_checksum(&self, checksum: &str) -> Result<Vec<Event>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::EVENTS, "checksum", checksum);
        let events = query::by_range::<Event>(&mut *s, &key, 0, -1, Order::Asc)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn event_count(&self) -> Result<u64> {
        let mut s = self.session().await?;
        Ok(s.zcard(schema::EVENTS)?)
    }

    async fn event_count_by_device(&self, device: &str) -> Result<u64> {
        let mut s = self.session().await?;
        Ok(s.zcard(&schema::field_key(schema::EVENTS, "device", device))?)
    }

    async fn delete_event_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        let (event, tx) = delete_event_tx(&mut *s, id)?;
        exec_guarded(&mut *s, tx)?;
        debug!(id = %event.id, readings = event.readings.len(), "event deleted");
        Ok(())
    }

    async fn delete_events_by_device(&self, device: &str) -> Result<usize> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::EVENTS, "device", device);
        let ids = s.zrange(&key, 0, -1, Order::Asc)?;
        let mut tx = Tx::new();
        for id in &ids {
            let (_, event_tx) = delete_event_tx(&mut *s, id)?;
            tx.merge(event_tx);
        }
        exec_guarded(&mut *s, tx)?;
        info!(device, removed = ids.len(), "events deleted by device");
        Ok(ids.len())
    }

    async fn events_by_device(&self, device: &str, limit: usize) -> Result<Vec<Event>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::EVENTS, "device", device);
        let events = query::head::<Event>(&mut *s, &key, limit, Order::Asc)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn events_by_creation_time(
        &self,
        start: i64,
        end: i64,
        limit: usize,
    ) -> Result<Vec<Event>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut s = self.session().await?;
        let key = schema::time_key(schema::EVENTS, "created");
        let events =
            query::by_score::<Event>(&mut *s, &key, Some(start), Some(end), Some(limit))?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn events_older_than(&self, age_ms: i64) -> Result<Vec<Event>> {
        let mut s = self.session().await?;
        let key = schema::time_key(schema::EVENTS, "created");
        let cutoff = timestamp_ms() - age_ms;
        let events = query::by_score::<Event>(&mut *s, &key, None, Some(cutoff), None)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn events_pushed(&self) -> Result<Vec<Event>> {
        let mut s = self.session().await?;
        let key = schema::time_key(schema::EVENTS, "pushed");
        let events = query::by_score::<Event>(&mut *s, &key, Some(1), None, None)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_event)
    }

    async fn scrub_all_events(&self) -> Result<()> {
        let mut s = self.session().await?;
        super::scrub_collection(&mut *s, schema::EVENTS)?;
        super::scrub_collection(&mut *s, schema::READINGS)?;
        info!("scrubbed all events and readings");
        Ok(())
    }

    async fn readings(&self) -> Result<Vec<Reading>> {
        let mut s = self.session().await?;
        query::all::<Reading>(&mut *s)
    }

    async fn add_reading(&self, reading: Reading) -> Result<String> {
        let mut s = self.session().await?;
        let reading = add_doc(&mut *s, reading)?;
        Ok(reading.id)
    }

    async fn update_reading(&self, reading: Reading) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, reading).map(|_| ())
    }

    async fn reading_by_id(&self, id: &str) -> Result<Reading> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn reading_count(&self) -> Result<u64> {
        let mut s = self.session().await?;
        Ok(s.zcard(schema::READINGS)?)
    }

    async fn delete_reading_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<Reading>(&mut *s, id).map(|_| ())
    }

    async fn delete_readings_by_device(&self, device: &str) -> Result<usize> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::READINGS, "device", device);
        let ids = s.zrange(&key, 0, -1, Order::Asc)?;
        let mut tx = Tx::new();
        for id in &ids {
            let reading: Reading = query::get_by_id(&mut *s, id)?;
            tx.merge(remove_ops(&reading));
        }
        exec_guarded(&mut *s, tx)?;
        info!(device, removed = ids.len(), "readings deleted by device");
        Ok(ids.len())
    }

    async fn readings_by_device(&self, device: &str, limit: usize) -> Result<Vec<Reading>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::READINGS, "device", device);
        query::head::<Reading>(&mut *s, &key, limit, Order::Desc)
    }

    async fn readings_by_value_descriptor(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Reading>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::READINGS, "name", name);
        query::head::<Reading>(&mut *s, &key, limit, Order::Asc)
    }

    async fn readings_by_value_descriptor_names(
        &self,
        names: &[String],
        limit: usize,
    ) -> Result<Vec<Reading>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut s = self.session().await?;
        let mut out = Vec::new();
        for name in names {
            let key = schema::field_key(schema::READINGS, "name", name);
            let remaining = limit - out.len();
            out.extend(query::head::<Reading>(&mut *s, &key, remaining, Order::Asc)?);
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    async fn readings_by_creation_time(
        &self,
        start: i64,
        end: i64,
        limit: usize,
    ) -> Result<Vec<Reading>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut s = self.session().await?;
        let key = schema::time_key(schema::READINGS, "created");
        query::by_score::<Reading>(&mut *s, &key, Some(start), Some(end), Some(limit))
    }

    async fn readings_by_device_and_value_descriptor(
        &self,
        device: &str,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Reading>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut s = self.session().await?;
        query::by_range_filtered::<Reading>(
            &mut *s,
            &schema::field_key(schema::READINGS, "device", device),
            &schema::field_key(schema::READINGS, "name", name),
            0,
            limit as i64 - 1,
        )
    }

    async fn value_descriptors(&self) -> Result<Vec<ValueDescriptor>> {
        let mut s = self.session().await?;
        query::all::<ValueDescriptor>(&mut *s)
    }

    async fn add_value_descriptor(&self, descriptor: ValueDescriptor) -> Result<String> {
        let mut s = self.session().await?;
        let descriptor = add_doc(&mut *s, descriptor)?;
        Ok(descriptor.id)
    }

    async fn update_value_descriptor(&self, descriptor: ValueDescriptor) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, descriptor).map(|_| ())
    }

    async fn delete_value_descriptor_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<ValueDescriptor>(&mut *s, id).map(|_| ())
    }

    async fn value_descriptor_by_id(&self, id: &str) -> Result<ValueDescriptor> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn value_descriptor_by_name(&self, name: &str) -> Result<ValueDescriptor> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, name)
    }

    async fn value_descriptors_by_uom_label(&self, label: &str) -> Result<Vec<ValueDescriptor>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::VALUE_DESCRIPTORS, "uomlabel", label);
        query::by_set(&mut *s, &key)
    }

    async fn value_descriptors_by_label(&self, label: &str) -> Result<Vec<ValueDescriptor>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::VALUE_DESCRIPTORS, "label", label);
        query::by_set(&mut *s, &key)
    }

    async fn value_descriptors_by_type(&self, value_type: &str) -> Result<Vec<ValueDescriptor>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::VALUE_DESCRIPTORS, "type", value_type);
        query::by_set(&mut *s, &key)
    }

    async fn scrub_all_value_descriptors(&self) -> Result<()> {
        let mut s = self.session().await?;
        super::scrub_collection(&mut *s, schema::VALUE_DESCRIPTORS)?;
        info!("scrubbed all value descriptors");
        Ok(())
    }
}
