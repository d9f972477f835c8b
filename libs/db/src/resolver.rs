//! Referential resolution.
//!
//! Decoded documents carry reference stubs: only `(id, name)` of the
//! referenced entity, or bare child ids. This module completes them
//! from the store. Depth is bounded at the deepest legitimate chain
//! (device -> service -> addressable); anything deeper can only mean
//! corrupted stored data and fails instead of recursing away.

use verdin_core::models::{Device, DeviceProfile, DeviceService, Event, ProvisionWatcher, ScheduleEvent};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::kv::Session;
use crate::query;

/// Deepest legitimate reference chain.
pub(crate) const MAX_DEPTH: usize = 3;

fn descend(depth: usize) -> Result<usize> {
    if depth >= MAX_DEPTH {
        return Err(Error::InvalidReference(
            "reference chain exceeds the schema depth; stored data is corrupt".into(),
        ));
    }
    Ok(depth + 1)
}

/// Replace each reading stub with its stored copy. A dangling id fails
/// `NotFound`; an event must never point at missing readings.
pub(crate) fn resolve_event(session: &mut dyn Session, event: &mut Event, depth: usize) -> Result<()> {
    let _ = descend(depth)?;
    for reading in &mut event.readings {
        let id = reading.id.clone();
        *reading = query::get_by_id(session, &id)?;
    }
    Ok(())
}

pub(crate) fn resolve_device(session: &mut dyn Session, device: &mut Device, depth: usize) -> Result<()> {
    let next = descend(depth)?;
    if !device.service.id.is_empty() {
        let id = device.service.id.clone();
        device.service = query::get_by_id(session, &id)?;
        resolve_device_service(session, &mut device.service, next)?;
    }
    if !device.profile.id.is_empty() {
        let id = device.profile.id.clone();
        device.profile = query::get_by_id(session, &id)?;
        resolve_device_profile(session, &mut device.profile, next)?;
    }
    Ok(())
}

pub(crate) fn resolve_device_service(
    session: &mut dyn Session,
    service: &mut DeviceService,
    depth: usize,
) -> Result<()> {
    let _ = descend(depth)?;
    if !service.addressable.id.is_empty() {
        let id = service.addressable.id.clone();
        service.addressable = query::get_by_id(session, &id)?;
    }
    Ok(())
}

/// Replace each command stub with its stored copy.
pub(crate) fn resolve_device_profile(
    session: &mut dyn Session,
    profile: &mut DeviceProfile,
    depth: usize,
) -> Result<()> {
    let _ = descend(depth)?;
    for command in &mut profile.commands {
        let id = command.id.clone();
        *command = query::get_by_id(session, &id)?;
    }
    Ok(())
}

pub(crate) fn resolve_provision_watcher(
    session: &mut dyn Session,
    watcher: &mut ProvisionWatcher,
    depth: usize,
) -> Result<()> {
    let next = descend(depth)?;
    if !watcher.profile.id.is_empty() {
        let id = watcher.profile.id.clone();
        watcher.profile = query::get_by_id(session, &id)?;
        resolve_device_profile(session, &mut watcher.profile, next)?;
    }
    if !watcher.service.id.is_empty() {
        let id = watcher.service.id.clone();
        watcher.service = query::get_by_id(session, &id)?;
        resolve_device_service(session, &mut watcher.service, next)?;
    }
    Ok(())
}

pub(crate) fn resolve_schedule_event(
    session: &mut dyn Session,
    event: &mut ScheduleEvent,
    depth: usize,
) -> Result<()> {
    let _ = descend(depth)?;
    if !event.addressable.id.is_empty() {
        let id = event.addressable.id.clone();
        event.addressable = query::get_by_id(session, &id)?;
    }
    Ok(())
}

/// Fetch-and-resolve helpers so operation modules stay declarative.
pub(crate) fn resolve_all<D, F>(
    session: &mut dyn Session,
    mut docs: Vec<D>,
    mut resolve: F,
) -> Result<Vec<D>>
where
    D: Document,
    F: FnMut(&mut dyn Session, &mut D, usize) -> Result<()>,
{
    for doc in &mut docs {
        resolve(session, doc, 0)?;
    }
    Ok(docs)
}
