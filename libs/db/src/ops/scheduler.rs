//! Scheduling operations: legacy schedules and schedule events, plus
//! the interval forms that replaced them. Everything here is the
//! generic document machinery; schedule events add an addressable
//! reference.

use async_trait::async_trait;
use tracing::info;

use verdin_core::models::{Interval, IntervalAction, Schedule, ScheduleEvent};
use verdin_core::ObjectId;

use crate::client::Client;
use crate::error::Result;
use crate::mutation::{add_doc, delete_doc, update_doc};
use crate::provider::SchedulerStore;
use crate::query;
use crate::resolver;
use crate::schema;

#[async_trait]
impl SchedulerStore for Client {
    async fn schedules(&self) -> Result<Vec<Schedule>> {
        let mut s = self.session().await?;
        query::all::<Schedule>(&mut *s)
    }

    async fn add_schedule(&self, schedule: Schedule) -> Result<String> {
        let mut s = self.session().await?;
        let schedule = add_doc(&mut *s, schedule)?;
        Ok(schedule.id)
    }

    async fn update_schedule(&self, schedule: Schedule) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, schedule).map(|_| ())
    }

    async fn schedule_by_id(&self, id: &str) -> Result<Schedule> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn schedule_by_name(&self, name: &str) -> Result<Schedule> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, name)
    }

    async fn delete_schedule_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<Schedule>(&mut *s, id).map(|_| ())
    }

    async fn schedule_events(&self) -> Result<Vec<ScheduleEvent>> {
        let mut s = self.session().await?;
        let events = query::all::<ScheduleEvent>(&mut *s)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_schedule_event)
    }

    async fn add_schedule_event(&self, event: ScheduleEvent) -> Result<String> {
        let mut s = self.session().await?;
        let event = add_doc(&mut *s, event)?;
        Ok(event.id)
    }

    async fn update_schedule_event(&self, event: ScheduleEvent) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, event).map(|_| ())
    }

    async fn schedule_event_by_id(&self, id: &str) -> Result<ScheduleEvent> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let mut event: ScheduleEvent = query::get_by_id(&mut *s, id)?;
        resolver::resolve_schedule_event(&mut *s, &mut event, 0)?;
        Ok(event)
    }

    async fn schedule_event_by_name(&self, name: &str) -> Result<ScheduleEvent> {
        let mut s = self.session().await?;
        let mut event: ScheduleEvent = query::get_by_name(&mut *s, name)?;
        resolver::resolve_schedule_event(&mut *s, &mut event, 0)?;
        Ok(event)
    }

    async fn delete_schedule_event_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<ScheduleEvent>(&mut *s, id).map(|_| ())
    }

    async fn schedule_events_by_schedule_name(&self, name: &str) -> Result<Vec<ScheduleEvent>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::SCHEDULE_EVENTS, "schedule", name);
        let events = query::by_set::<ScheduleEvent>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_schedule_event)
    }

    async fn schedule_events_by_addressable_id(&self, id: &str) -> Result<Vec<ScheduleEvent>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::SCHEDULE_EVENTS, "addressable", id);
        let events = query::by_set::<ScheduleEvent>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, events, resolver::resolve_schedule_event)
    }

    async fn intervals(&self) -> Result<Vec<Interval>> {
        let mut s = self.session().await?;
        query::all::<Interval>(&mut *s)
    }

    async fn intervals_with_limit(&self, limit: usize) -> Result<Vec<Interval>> {
        let mut s = self.session().await?;
        query::all_limited::<Interval>(&mut *s, limit)
    }

    async fn add_interval(&self, interval: Interval) -> Result<String> {
        let mut s = self.session().await?;
        let interval = add_doc(&mut *s, interval)?;
        Ok(interval.id)
    }

    async fn update_interval(&self, interval: Interval) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, interval).map(|_| ())
    }

    async fn interval_by_id(&self, id: &str) -> Result<Interval> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn interval_by_name(&self, name: &str) -> Result<Interval> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, name)
    }

    async fn delete_interval_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<Interval>(&mut *s, id).map(|_| ())
    }

    async fn scrub_all_intervals(&self) -> Result<()> {
        let mut s = self.session().await?;
        super::scrub_collection(&mut *s, schema::INTERVALS)?;
        info!("scrubbed all intervals");
        Ok(())
    }

    async fn interval_actions(&self) -> Result<Vec<IntervalAction>> {
        let mut s = self.session().await?;
        query::all::<IntervalAction>(&mut *s)
    }

    async fn add_interval_action(&self, action: IntervalAction) -> Result<String> {
        let mut s = self.session().await?;
        let action = add_doc(&mut *s, action)?;
        Ok(action.id)
    }

    async fn update_interval_action(&self, action: IntervalAction) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, action).map(|_| ())
    }

    async fn interval_action_by_id(&self, id: &str) -> Result<IntervalAction> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn interval_action_by_name(&self, name: &str) -> Result<IntervalAction> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, name)
    }

    async fn delete_interval_action_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<IntervalAction>(&mut *s, id).map(|_| ())
    }

    async fn interval_actions_by_interval_name(&self, name: &str) -> Result<Vec<IntervalAction>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::INTERVAL_ACTIONS, "interval", name);
        query::by_set(&mut *s, &key)
    }

    async fn interval_actions_by_target(&self, target: &str) -> Result<Vec<IntervalAction>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::INTERVAL_ACTIONS, "target", target);
        query::by_set(&mut *s, &key)
    }

    async fn scrub_all_interval_actions(&self) -> Result<()> {
        let mut s = self.session().await?;
        super::scrub_collection(&mut *s, schema::INTERVAL_ACTIONS)?;
        info!("scrubbed all interval actions");
        Ok(())
    }
}
