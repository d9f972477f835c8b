//! Metadata operations: devices, profiles, services, addressables,
//! provision watchers, commands.
//!
//! Profiles own their commands the way events own readings. Deletions
//! that would orphan references fail `StillInUse` instead.

use async_trait::async_trait;
use tracing::{debug, info};

use verdin_core::models::{
    Addressable, Command, Device, DeviceProfile, DeviceService, ProvisionWatcher,
};
use verdin_core::{timestamp_ms, ObjectId};

use crate::client::Client;
use crate::document::{merge_over, Document};
use crate::error::{Error, Result};
use crate::kv::{Session, Tx, WriteOp};
use crate::mutation::{
    add_doc, delete_doc, exec_guarded, harden_references, insert_tx, prepare_new, remove_ops,
    update_doc,
};
use crate::provider::MetadataStore;
use crate::query;
use crate::resolver;
use crate::schema;

/// Build the full write set for a profile and its commands.
fn add_profile_tx(
    session: &mut dyn Session,
    profile: &mut DeviceProfile,
    now: i64,
) -> Result<Tx> {
    prepare_new(profile, now)?;
    for command in &mut profile.commands {
        prepare_new(command, now)?;
    }

    let mut tx = Tx::new();
    harden_references(session, profile, &mut tx)?;
    tx.merge(insert_tx(profile, true)?);
    for command in &profile.commands {
        tx.merge(insert_tx(command, false)?);
        tx.push(WriteOp::SAdd {
            key: schema::profiles_owning_command(&command.id),
            member: profile.id.clone(),
        });
    }
    Ok(tx)
}

/// Fetch a profile with full commands and build its mirror removal.
/// A command adopted by another profile only loses this profile's
/// ownership entry; its blob stays until the last owner goes.
fn delete_profile_tx(session: &mut dyn Session, id: &str) -> Result<(DeviceProfile, Tx)> {
    ObjectId::parse(id)?;
    let mut profile: DeviceProfile = query::get_by_id(session, id)?;
    resolver::resolve_device_profile(session, &mut profile, 0)?;

    let mut tx = remove_ops(&profile);
    for command in &profile.commands {
        let owners = session.smembers(&schema::profiles_owning_command(&command.id))?;
        if owners.iter().all(|o| o == &profile.id) {
            tx.merge(remove_ops(command));
        }
        tx.push(WriteOp::SRem {
            key: schema::profiles_owning_command(&command.id),
            member: profile.id.clone(),
        });
    }
    Ok((profile, tx))
}

/// `StillInUse` when any id remains in the referencing set.
fn ensure_unreferenced(session: &mut dyn Session, key: &str, what: &str) -> Result<()> {
    let holders = session.smembers(key)?;
    if holders.is_empty() {
        return Ok(());
    }
    Err(Error::StillInUse(format!(
        "{what} is referenced by {} other entities",
        holders.len()
    )))
}

#[async_trait]
impl MetadataStore for Client {
    async fn devices(&self) -> Result<Vec<Device>> {
        let mut s = self.session().await?;
        let devices = query::all::<Device>(&mut *s)?;
        resolver::resolve_all(&mut *s, devices, resolver::resolve_device)
    }

    async fn add_device(&self, device: Device) -> Result<String> {
        let mut s = self.session().await?;
        let device = add_doc(&mut *s, device)?;
        Ok(device.id)
    }

    async fn update_device(&self, device: Device) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, device).map(|_| ())
    }

    async fn device_by_id(&self, id: &str) -> Result<Device> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let mut device: Device = query::get_by_id(&mut *s, id)?;
        resolver::resolve_device(&mut *s, &mut device, 0)?;
        Ok(device)
    }

    async fn device_by_name(&self, name: &str) -> Result<Device> {
        let mut s = self.session().await?;
        let mut device: Device = query::get_by_name(&mut *s, name)?;
        resolver::resolve_device(&mut *s, &mut device, 0)?;
        Ok(device)
    }

    async fn delete_device_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<Device>(&mut *s, id).map(|_| ())
    }

    async fn devices_by_profile_id(&self, profile_id: &str) -> Result<Vec<Device>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICES, "profile", profile_id);
        let devices = query::by_set::<Device>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, devices, resolver::resolve_device)
    }

    async fn devices_by_service_id(&self, service_id: &str) -> Result<Vec<Device>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICES, "service", service_id);
        let devices = query::by_set::<Device>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, devices, resolver::resolve_device)
    }

    async fn devices_by_label(&self, label: &str) -> Result<Vec<Device>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICES, "label", label);
        let devices = query::by_set::<Device>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, devices, resolver::resolve_device)
    }

    async fn device_profiles(&self) -> Result<Vec<DeviceProfile>> {
        let mut s = self.session().await?;
        let profiles = query::all::<DeviceProfile>(&mut *s)?;
        resolver::resolve_all(&mut *s, profiles, resolver::resolve_device_profile)
    }

    async fn add_device_profile(&self, mut profile: DeviceProfile) -> Result<String> {
        let mut s = self.session().await?;
        let tx = add_profile_tx(&mut *s, &mut profile, timestamp_ms())?;
        exec_guarded(&mut *s, tx)?;
        debug!(id = %profile.id, commands = profile.commands.len(), "device profile added");
        Ok(profile.id)
    }

    async fn update_device_profile(&self, profile: DeviceProfile) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(&profile.id)?;
        let stored: DeviceProfile = query::get_by_id(&mut *s, &profile.id)?;
        let mut merged = merge_over(&profile, &stored)?;
        // Command ownership never changes through update.
        merged.commands = stored.commands.clone();
        merged.set_modified(timestamp_ms());

        let mut tx = remove_ops(&stored);
        let renamed = merged.name != stored.name;
        tx.merge(insert_tx(&merged, renamed)?);
        exec_guarded(&mut *s, tx)
    }

    async fn device_profile_by_id(&self, id: &str) -> Result<DeviceProfile> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let mut profile: DeviceProfile = query::get_by_id(&mut *s, id)?;
        resolver::resolve_device_profile(&mut *s, &mut profile, 0)?;
        Ok(profile)
    }

    async fn device_profile_by_name(&self, name: &str) -> Result<DeviceProfile> {
        let mut s = self.session().await?;
        let mut profile: DeviceProfile = query::get_by_name(&mut *s, name)?;
        resolver::resolve_device_profile(&mut *s, &mut profile, 0)?;
        Ok(profile)
    }

    async fn delete_device_profile_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        ensure_unreferenced(
            &mut *s,
            &schema::field_key(schema::DEVICES, "profile", id),
            "device profile",
        )?;
        let (profile, tx) = delete_profile_tx(&mut *s, id)?;
        exec_guarded(&mut *s, tx)?;
        debug!(id = %profile.id, commands = profile.commands.len(), "device profile deleted");
        Ok(())
    }

    async fn device_profiles_by_model(&self, model: &str) -> Result<Vec<DeviceProfile>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICE_PROFILES, "model", model);
        let profiles = query::by_set::<DeviceProfile>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, profiles, resolver::resolve_device_profile)
    }

    async fn device_profiles_by_manufacturer(
        &self,
        manufacturer: &str,
    ) -> Result<Vec<DeviceProfile>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICE_PROFILES, "manufacturer", manufacturer);
        let profiles = query::by_set::<DeviceProfile>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, profiles, resolver::resolve_device_profile)
    }

    async fn device_profiles_by_manufacturer_model(
        &self,
        manufacturer: &str,
        model: &str,
    ) -> Result<Vec<DeviceProfile>> {
        let mut s = self.session().await?;
        let keys = vec![
            schema::field_key(schema::DEVICE_PROFILES, "manufacturer", manufacturer),
            schema::field_key(schema::DEVICE_PROFILES, "model", model),
        ];
        let profiles = query::by_intersection::<DeviceProfile>(&mut *s, &keys)?;
        resolver::resolve_all(&mut *s, profiles, resolver::resolve_device_profile)
    }

    async fn device_profiles_by_label(&self, label: &str) -> Result<Vec<DeviceProfile>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICE_PROFILES, "label", label);
        let profiles = query::by_set::<DeviceProfile>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, profiles, resolver::resolve_device_profile)
    }

    async fn commands(&self) -> Result<Vec<Command>> {
        let mut s = self.session().await?;
        query::all::<Command>(&mut *s)
    }

    async fn command_by_id(&self, id: &str) -> Result<Command> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn commands_by_name(&self, name: &str) -> Result<Vec<Command>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::COMMANDS, "name", name);
        query::by_set(&mut *s, &key)
    }

    async fn commands_by_profile_id(&self, profile_id: &str) -> Result<Vec<Command>> {
        let mut s = self.session().await?;
        ObjectId::parse(profile_id)?;
        let mut profile: DeviceProfile = query::get_by_id(&mut *s, profile_id)?;
        resolver::resolve_device_profile(&mut *s, &mut profile, 0)?;
        Ok(profile.commands)
    }

    async fn delete_command_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        ensure_unreferenced(&mut *s, &schema::profiles_owning_command(id), "command")?;
        delete_doc::<Command>(&mut *s, id).map(|_| ())
    }

    async fn device_services(&self) -> Result<Vec<DeviceService>> {
        let mut s = self.session().await?;
        let services = query::all::<DeviceService>(&mut *s)?;
        resolver::resolve_all(&mut *s, services, resolver::resolve_device_service)
    }

    async fn add_device_service(&self, service: DeviceService) -> Result<String> {
        let mut s = self.session().await?;
        let service = add_doc(&mut *s, service)?;
        Ok(service.id)
    }

    async fn update_device_service(&self, service: DeviceService) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, service).map(|_| ())
    }

    async fn device_service_by_id(&self, id: &str) -> Result<DeviceService> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let mut service: DeviceService = query::get_by_id(&mut *s, id)?;
        resolver::resolve_device_service(&mut *s, &mut service, 0)?;
        Ok(service)
    }

    async fn device_service_by_name(&self, name: &str) -> Result<DeviceService> {
        let mut s = self.session().await?;
        let mut service: DeviceService = query::get_by_name(&mut *s, name)?;
        resolver::resolve_device_service(&mut *s, &mut service, 0)?;
        Ok(service)
    }

    async fn delete_device_service_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        ensure_unreferenced(
            &mut *s,
            &schema::field_key(schema::DEVICES, "service", id),
            "device service",
        )?;
        delete_doc::<DeviceService>(&mut *s, id).map(|_| ())
    }

    async fn device_services_by_addressable_id(
        &self,
        addressable_id: &str,
    ) -> Result<Vec<DeviceService>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICE_SERVICES, "addressable", addressable_id);
        let services = query::by_set::<DeviceService>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, services, resolver::resolve_device_service)
    }

    async fn device_services_by_label(&self, label: &str) -> Result<Vec<DeviceService>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::DEVICE_SERVICES, "label", label);
        let services = query::by_set::<DeviceService>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, services, resolver::resolve_device_service)
    }

    async fn addressables(&self) -> Result<Vec<Addressable>> {
        let mut s = self.session().await?;
        query::all::<Addressable>(&mut *s)
    }

    async fn add_addressable(&self, addressable: Addressable) -> Result<String> {
        let mut s = self.session().await?;
        let addressable = add_doc(&mut *s, addressable)?;
        Ok(addressable.id)
    }

    async fn update_addressable(&self, addressable: Addressable) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, addressable).map(|_| ())
    }

    async fn addressable_by_id(&self, id: &str) -> Result<Addressable> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        query::get_by_id(&mut *s, id)
    }

    async fn addressable_by_name(&self, name: &str) -> Result<Addressable> {
        let mut s = self.session().await?;
        query::get_by_name(&mut *s, name)
    }

    async fn delete_addressable_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        ensure_unreferenced(
            &mut *s,
            &schema::field_key(schema::DEVICE_SERVICES, "addressable", id),
            "addressable",
        )?;
        delete_doc::<Addressable>(&mut *s, id).map(|_| ())
    }

    async fn addressables_by_topic(&self, topic: &str) -> Result<Vec<Addressable>> {
        let mut s = self.session().await?;
        query::by_set(&mut *s, &schema::field_key(schema::ADDRESSABLES, "topic", topic))
    }

    async fn addressables_by_port(&self, port: i32) -> Result<Vec<Addressable>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::ADDRESSABLES, "port", &port.to_string());
        query::by_set(&mut *s, &key)
    }

    async fn addressables_by_publisher(&self, publisher: &str) -> Result<Vec<Addressable>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::ADDRESSABLES, "publisher", publisher);
        query::by_set(&mut *s, &key)
    }

    async fn addressables_by_address(&self, address: &str) -> Result<Vec<Addressable>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::ADDRESSABLES, "address", address);
        query::by_set(&mut *s, &key)
    }

    async fn provision_watchers(&self) -> Result<Vec<ProvisionWatcher>> {
        let mut s = self.session().await?;
        let watchers = query::all::<ProvisionWatcher>(&mut *s)?;
        resolver::resolve_all(&mut *s, watchers, resolver::resolve_provision_watcher)
    }

    async fn add_provision_watcher(&self, watcher: ProvisionWatcher) -> Result<String> {
        let mut s = self.session().await?;
        let watcher = add_doc(&mut *s, watcher)?;
        Ok(watcher.id)
    }

    async fn update_provision_watcher(&self, watcher: ProvisionWatcher) -> Result<()> {
        let mut s = self.session().await?;
        update_doc(&mut *s, watcher).map(|_| ())
    }

    async fn provision_watcher_by_id(&self, id: &str) -> Result<ProvisionWatcher> {
        let mut s = self.session().await?;
        ObjectId::parse(id)?;
        let mut watcher: ProvisionWatcher = query::get_by_id(&mut *s, id)?;
        resolver::resolve_provision_watcher(&mut *s, &mut watcher, 0)?;
        Ok(watcher)
    }

    async fn provision_watcher_by_name(&self, name: &str) -> Result<ProvisionWatcher> {
        let mut s = self.session().await?;
        let mut watcher: ProvisionWatcher = query::get_by_name(&mut *s, name)?;
        resolver::resolve_provision_watcher(&mut *s, &mut watcher, 0)?;
        Ok(watcher)
    }

    async fn delete_provision_watcher_by_id(&self, id: &str) -> Result<()> {
        let mut s = self.session().await?;
        delete_doc::<ProvisionWatcher>(&mut *s, id).map(|_| ())
    }

    async fn provision_watchers_by_profile_id(
        &self,
        profile_id: &str,
    ) -> Result<Vec<ProvisionWatcher>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::PROVISION_WATCHERS, "profile", profile_id);
        let watchers = query::by_set::<ProvisionWatcher>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, watchers, resolver::resolve_provision_watcher)
    }

    async fn provision_watchers_by_service_id(
        &self,
        service_id: &str,
    ) -> Result<Vec<ProvisionWatcher>> {
        let mut s = self.session().await?;
        let key = schema::field_key(schema::PROVISION_WATCHERS, "service", service_id);
        let watchers = query::by_set::<ProvisionWatcher>(&mut *s, &key)?;
        resolver::resolve_all(&mut *s, watchers, resolver::resolve_provision_watcher)
    }

    async fn provision_watchers_by_identifier(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<ProvisionWatcher>> {
        let mut s = self.session().await?;
        let index = schema::field_key(
            schema::PROVISION_WATCHERS,
            "identifier",
            &format!("{key}:{value}"),
        );
        let watchers = query::by_set::<ProvisionWatcher>(&mut *s, &index)?;
        resolver::resolve_all(&mut *s, watchers, resolver::resolve_provision_watcher)
    }

    async fn scrub_metadata(&self) -> Result<()> {
        let mut s = self.session().await?;
        for collection in [
            schema::DEVICES,
            schema::DEVICE_PROFILES,
            schema::DEVICE_SERVICES,
            schema::ADDRESSABLES,
            schema::COMMANDS,
            schema::PROVISION_WATCHERS,
        ] {
            super::scrub_collection(&mut *s, collection)?;
        }
        info!("scrubbed all metadata collections");
        Ok(())
    }
}
