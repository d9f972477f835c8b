//! End-to-end operation tests against the in-memory engine, driven
//! through the public contract traits.

use verdin_core::models::{
    Addressable, Device, DeviceProfile, DeviceService, Event, ExportRegistration, Interval,
    IntervalAction, Notification, ProvisionWatcher, Reading, Transmission, ValueDescriptor,
};
use verdin_core::ObjectId;

use crate::client::{Client, ClientConfig};
use crate::error::Error;
use crate::kv::{KvError, MemoryEngine};
use crate::provider::{
    CoreDataStore, ExportStore, MetadataStore, NotificationsStore, SchedulerStore,
};

async fn client() -> (Client, MemoryEngine) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let engine = MemoryEngine::new();
    let client = Client::connect(ClientConfig::default(), Box::new(engine.clone()))
        .await
        .unwrap();
    (client, engine)
}

fn descriptor(name: &str) -> ValueDescriptor {
    ValueDescriptor {
        name: name.to_string(),
        value_type: "Int64".to_string(),
        uom_label: "count".to_string(),
        ..Default::default()
    }
}

fn addressable(name: &str) -> Addressable {
    Addressable {
        name: name.to_string(),
        protocol: "HTTP".to_string(),
        address: "camera.local".to_string(),
        port: 49986,
        ..Default::default()
    }
}

fn service_named(name: &str, addressable_name: &str) -> DeviceService {
    DeviceService {
        name: name.to_string(),
        addressable: Addressable { name: addressable_name.to_string(), ..Default::default() },
        ..Default::default()
    }
}

fn profile_named(name: &str) -> DeviceProfile {
    DeviceProfile {
        name: name.to_string(),
        manufacturer: "acme".to_string(),
        model: "m1".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn value_descriptor_bulk_add_and_uniqueness() {
    let (client, engine) = client().await;
    for n in 0..110 {
        client.add_value_descriptor(descriptor(&format!("vd-{n}"))).await.unwrap();
    }
    assert_eq!(client.value_descriptors().await.unwrap().len(), 110);

    let keys_before = engine.key_count();
    let err = client.add_value_descriptor(descriptor("vd-7")).await.unwrap_err();
    assert!(matches!(err, Error::NotUnique(name) if name == "vd-7"));
    assert_eq!(engine.key_count(), keys_before, "failed insert must write nothing");

    let found = client.value_descriptor_by_name("vd-42").await.unwrap();
    assert_eq!(found.uom_label, "count");
    assert!(matches!(
        client.value_descriptor_by_name("vd-999").await.unwrap_err(),
        Error::NotFound
    ));
}

#[tokio::test]
async fn event_resolves_readings_and_delete_cascades() {
    let (client, engine) = client().await;
    let readings: Vec<Reading> = (0..5)
        .map(|n| Reading {
            name: format!("temp-{n}"),
            value: n.to_string(),
            ..Default::default()
        })
        .collect();
    let event = Event {
        device: "thermostat-1".to_string(),
        checksum: "abc123".to_string(),
        readings,
        ..Default::default()
    };
    let id = client.add_event(event).await.unwrap();

    let stored = client.event_by_id(&id).await.unwrap();
    assert_eq!(stored.readings.len(), 5);
    // Reading device names inherit from the owning event.
    assert!(stored.readings.iter().all(|r| r.device == "thermostat-1"));
    assert_eq!(client.reading_count().await.unwrap(), 5);
    assert_eq!(client.events_by_checksum("abc123").await.unwrap().len(), 1);

    let reading_id = stored.readings[0].id.clone();
    client.delete_event_by_id(&id).await.unwrap();
    assert!(matches!(client.event_by_id(&id).await.unwrap_err(), Error::NotFound));
    assert!(matches!(client.reading_by_id(&reading_id).await.unwrap_err(), Error::NotFound));
    assert_eq!(client.reading_count().await.unwrap(), 0);
    assert_eq!(engine.key_count(), 0, "cascade must leave no index keys behind");
}

#[tokio::test]
async fn event_time_and_device_queries() {
    let (client, _) = client().await;
    for n in 0..100i64 {
        let device = if n % 2 == 0 { "dev-even" } else { "dev-odd" };
        let event = Event {
            device: device.to_string(),
            created: (n + 1) * 1_000_000,
            ..Default::default()
        };
        client.add_event(event).await.unwrap();
    }
    assert_eq!(client.event_count().await.unwrap(), 100);
    assert_eq!(client.event_count_by_device("dev-even").await.unwrap(), 50);

    let window = client
        .events_by_creation_time(10_000_000, 20_000_000, 100)
        .await
        .unwrap();
    assert_eq!(window.len(), 11);
    assert!(window.windows(2).all(|w| w[0].created <= w[1].created));

    let limited = client.events_by_device("dev-odd", 10).await.unwrap();
    assert_eq!(limited.len(), 10);
    assert!(limited.windows(2).all(|w| w[0].created <= w[1].created));

    let age = verdin_core::timestamp_ms() - 50_500_000;
    let old = client.events_older_than(age).await.unwrap();
    assert_eq!(old.len(), 50);
    assert!(old.iter().all(|e| e.created <= 50_500_000));

    assert!(client.events_pushed().await.unwrap().is_empty());
    let mut mark = client.events_by_device("dev-even", 1).await.unwrap().remove(0);
    mark.pushed = 777;
    client.update_event(mark.clone()).await.unwrap();
    let pushed = client.events_pushed().await.unwrap();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].id, mark.id);

    let removed = client.delete_events_by_device("dev-odd").await.unwrap();
    assert_eq!(removed, 50);
    assert_eq!(client.event_count().await.unwrap(), 50);
}

#[tokio::test]
async fn readings_by_device_newest_first() {
    let (client, _) = client().await;
    for n in 0..20i64 {
        let reading = Reading {
            device: "dev-1".to_string(),
            name: "temp".to_string(),
            value: n.to_string(),
            created: (n + 1) * 1000,
            ..Default::default()
        };
        client.add_reading(reading).await.unwrap();
    }
    let recent = client.readings_by_device("dev-1", 5).await.unwrap();
    assert_eq!(recent.len(), 5);
    assert!(recent.windows(2).all(|w| w[0].created >= w[1].created));
    assert_eq!(recent[0].created, 20_000);
}

#[tokio::test]
async fn references_harden_by_name() {
    let (client, _) = client().await;
    client.add_addressable(addressable("addr-1")).await.unwrap();
    let service_id = client
        .add_device_service(service_named("svc-1", "addr-1"))
        .await
        .unwrap();

    let service = client.device_service_by_id(&service_id).await.unwrap();
    assert_eq!(service.addressable.address, "camera.local");
    assert_eq!(service.addressable.port, 49986);

    let err = client
        .add_device_service(service_named("svc-2", "no-such-addressable"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidReference(_)));

    client.add_device_profile(profile_named("prof-1")).await.unwrap();
    let device = Device {
        name: "cam-1".to_string(),
        service: DeviceService { name: "svc-1".to_string(), ..Default::default() },
        profile: DeviceProfile { name: "prof-1".to_string(), ..Default::default() },
        ..Default::default()
    };
    let device_id = client.add_device(device).await.unwrap();
    let device = client.device_by_id(&device_id).await.unwrap();
    assert_eq!(device.service.name, "svc-1");
    assert_eq!(device.service.addressable.name, "addr-1");
    assert_eq!(device.profile.manufacturer, "acme");
}

#[tokio::test]
async fn owned_command_cannot_be_deleted_directly() {
    let (client, _) = client().await;
    let mut profile = profile_named("prof-cmd");
    profile.commands = vec![verdin_core::models::Command {
        name: "get-temp".to_string(),
        ..Default::default()
    }];
    let profile_id = client.add_device_profile(profile).await.unwrap();

    let commands = client.commands_by_profile_id(&profile_id).await.unwrap();
    assert_eq!(commands.len(), 1);
    let command_id = commands[0].id.clone();

    let err = client.delete_command_by_id(&command_id).await.unwrap_err();
    assert!(matches!(err, Error::StillInUse(_)));

    client.delete_device_profile_by_id(&profile_id).await.unwrap();
    assert!(matches!(client.command_by_id(&command_id).await.unwrap_err(), Error::NotFound));
}

#[tokio::test]
async fn shared_command_survives_until_last_owner_deleted() {
    let (client, _) = client().await;
    let mut first = profile_named("prof-share-a");
    first.commands =
        vec![verdin_core::models::Command { name: "get-temp".to_string(), ..Default::default() }];
    let first_id = client.add_device_profile(first).await.unwrap();
    let command = client.commands_by_profile_id(&first_id).await.unwrap().remove(0);

    // Second profile adopts the existing command by id.
    let mut second = profile_named("prof-share-b");
    second.commands = vec![command.clone()];
    let second_id = client.add_device_profile(second).await.unwrap();

    client.delete_device_profile_by_id(&first_id).await.unwrap();
    assert_eq!(client.command_by_id(&command.id).await.unwrap().name, "get-temp");
    let survivor = client.device_profile_by_id(&second_id).await.unwrap();
    assert_eq!(survivor.commands.len(), 1);

    client.delete_device_profile_by_id(&second_id).await.unwrap();
    assert!(matches!(client.command_by_id(&command.id).await.unwrap_err(), Error::NotFound));
}

#[tokio::test]
async fn referenced_service_and_profile_cannot_be_deleted() {
    let (client, _) = client().await;
    client.add_addressable(addressable("addr-2")).await.unwrap();
    let service_id = client
        .add_device_service(service_named("svc-ref", "addr-2"))
        .await
        .unwrap();
    let profile_id = client.add_device_profile(profile_named("prof-ref")).await.unwrap();
    let device_id = client
        .add_device(Device {
            name: "dev-ref".to_string(),
            service: DeviceService { name: "svc-ref".to_string(), ..Default::default() },
            profile: DeviceProfile { name: "prof-ref".to_string(), ..Default::default() },
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(matches!(
        client.delete_device_service_by_id(&service_id).await.unwrap_err(),
        Error::StillInUse(_)
    ));
    assert!(matches!(
        client.delete_device_profile_by_id(&profile_id).await.unwrap_err(),
        Error::StillInUse(_)
    ));

    client.delete_device_by_id(&device_id).await.unwrap();
    client.delete_device_service_by_id(&service_id).await.unwrap();
    client.delete_device_profile_by_id(&profile_id).await.unwrap();
}

#[tokio::test]
async fn provision_watchers_found_by_identifier() {
    let (client, _) = client().await;
    client.add_addressable(addressable("addr-3")).await.unwrap();
    client.add_device_service(service_named("svc-w", "addr-3")).await.unwrap();
    client.add_device_profile(profile_named("prof-w")).await.unwrap();

    let mut watcher = ProvisionWatcher {
        name: "watcher-1".to_string(),
        profile: DeviceProfile { name: "prof-w".to_string(), ..Default::default() },
        service: DeviceService { name: "svc-w".to_string(), ..Default::default() },
        ..Default::default()
    };
    watcher.identifiers.insert("mac".to_string(), "aa:bb".to_string());
    client.add_provision_watcher(watcher).await.unwrap();

    let hits = client.provision_watchers_by_identifier("mac", "aa:bb").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].service.name, "svc-w");
    assert!(client
        .provision_watchers_by_identifier("mac", "cc:dd")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn limit_zero_returns_empty() {
    let (client, _) = client().await;
    client.add_event(Event { device: "d".to_string(), ..Default::default() }).await.unwrap();
    assert!(client.events_with_limit(0).await.unwrap().is_empty());
    assert!(client.events_by_device("d", 0).await.unwrap().is_empty());
    assert!(client.readings_by_device("d", 0).await.unwrap().is_empty());
    assert!(client.notifications_by_sender("s", 0).await.unwrap().is_empty());
    assert!(client.intervals_with_limit(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_merges_over_stored_copy() {
    let (client, _) = client().await;
    let id = client.add_value_descriptor(descriptor("vd-merge")).await.unwrap();
    let stored = client.value_descriptor_by_id(&id).await.unwrap();
    assert!(stored.created > 0);

    // Sparse update: unset fields keep their stored values.
    let patch = ValueDescriptor {
        id: id.clone(),
        description: "merged".to_string(),
        ..Default::default()
    };
    client.update_value_descriptor(patch).await.unwrap();
    let merged = client.value_descriptor_by_id(&id).await.unwrap();
    assert_eq!(merged.name, "vd-merge");
    assert_eq!(merged.description, "merged");
    assert_eq!(merged.created, stored.created);
    assert_eq!(merged.uom_label, "count");

    // Renaming onto a taken business key fails atomically.
    client.add_value_descriptor(descriptor("vd-taken")).await.unwrap();
    let rename = ValueDescriptor {
        id: id.clone(),
        name: "vd-taken".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        client.update_value_descriptor(rename).await.unwrap_err(),
        Error::NotUnique(_)
    ));
    assert_eq!(client.value_descriptor_by_id(&id).await.unwrap().name, "vd-merge");

    // Renaming onto a free key moves the uniqueness entry.
    let rename = ValueDescriptor {
        id: id.clone(),
        name: "vd-renamed".to_string(),
        ..Default::default()
    };
    client.update_value_descriptor(rename).await.unwrap();
    assert!(matches!(
        client.value_descriptor_by_name("vd-merge").await.unwrap_err(),
        Error::NotFound
    ));
    assert_eq!(client.value_descriptor_by_name("vd-renamed").await.unwrap().id, id);
}

#[tokio::test]
async fn malformed_and_missing_ids() {
    let (client, _) = client().await;
    assert!(matches!(
        client.event_by_id("not-an-id").await.unwrap_err(),
        Error::InvalidIdentifier(_)
    ));
    assert!(matches!(
        client.delete_device_by_id("xyz").await.unwrap_err(),
        Error::InvalidIdentifier(_)
    ));
    let absent = ObjectId::generate().into_string();
    assert!(matches!(client.delete_event_by_id(&absent).await.unwrap_err(), Error::NotFound));
    assert!(matches!(client.device_by_id(&absent).await.unwrap_err(), Error::NotFound));
}

#[tokio::test]
async fn notification_delete_cascades_transmissions() {
    let (client, _) = client().await;
    let notification = Notification {
        slug: "alert-1".to_string(),
        sender: "core".to_string(),
        status: "NEW".to_string(),
        ..Default::default()
    };
    client.add_notification(notification).await.unwrap();

    let mut transmission_ids = Vec::new();
    for resends in [0i64, 2, 5] {
        let id = client
            .add_transmission(Transmission {
                notification_slug: "alert-1".to_string(),
                status: "SENT".to_string(),
                resend_count: resends,
                ..Default::default()
            })
            .await
            .unwrap();
        transmission_ids.push(id);
    }

    let capped = client.transmissions_by_notification_slug("alert-1", 2).await.unwrap();
    assert_eq!(capped.len(), 2);
    assert!(capped.iter().all(|t| t.resend_count <= 2));
    let all = client.transmissions_by_notification_slug("alert-1", -1).await.unwrap();
    assert_eq!(all.len(), 3);
    let sent = client.transmissions_by_status("SENT", 0).await.unwrap();
    assert_eq!(sent.len(), 1);

    client.delete_notification_by_slug("alert-1").await.unwrap();
    for id in &transmission_ids {
        assert!(matches!(client.transmission_by_id(id).await.unwrap_err(), Error::NotFound));
    }
    assert!(matches!(
        client.notification_by_slug("alert-1").await.unwrap_err(),
        Error::NotFound
    ));
}

#[tokio::test]
async fn limited_notification_queries_return_oldest_first() {
    let (client, _) = client().await;
    for n in 0..10i64 {
        client
            .add_notification(Notification {
                slug: format!("n-{n}"),
                sender: "core".to_string(),
                status: "NEW".to_string(),
                labels: vec!["ops".to_string()],
                created: (n + 1) * 1000,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let oldest = |items: &[Notification]| -> Vec<String> {
        items.iter().map(|n| n.slug.clone()).collect()
    };

    let by_sender = client.notifications_by_sender("core", 3).await.unwrap();
    assert_eq!(oldest(&by_sender), ["n-0", "n-1", "n-2"]);

    let by_status = client.notifications_by_status("NEW", 4).await.unwrap();
    assert_eq!(oldest(&by_status), ["n-0", "n-1", "n-2", "n-3"]);

    let by_labels = client
        .notifications_by_labels(&["ops".to_string()], 2)
        .await
        .unwrap();
    assert_eq!(oldest(&by_labels), ["n-0", "n-1"]);
}

#[tokio::test]
async fn notification_cleanup_by_age() {
    let (client, _) = client().await;
    for n in 0..3 {
        client
            .add_notification(Notification {
                slug: format!("n-{n}"),
                sender: "core".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    // Nothing is older than an hour yet.
    client.cleanup_old(3_600_000).await.unwrap();
    assert_eq!(client.notifications().await.unwrap().len(), 3);

    client.cleanup_old(0).await.unwrap();
    assert!(client.notifications().await.unwrap().is_empty());
}

#[tokio::test]
async fn scrub_removes_whole_collections() {
    let (client, engine) = client().await;
    for n in 0..10 {
        client
            .add_event(Event {
                device: format!("dev-{n}"),
                checksum: format!("ck-{n}"),
                readings: vec![Reading { name: "t".to_string(), ..Default::default() }],
                ..Default::default()
            })
            .await
            .unwrap();
    }
    client.scrub_all_events().await.unwrap();
    assert_eq!(client.event_count().await.unwrap(), 0);
    assert_eq!(client.reading_count().await.unwrap(), 0);
    assert!(client.events().await.unwrap().is_empty());
    assert_eq!(engine.key_count(), 0);
}

#[tokio::test]
async fn interval_actions_follow_their_interval() {
    let (client, _) = client().await;
    client
        .add_interval(Interval {
            name: "midnight".to_string(),
            frequency: "24h".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    for n in 0..3 {
        client
            .add_interval_action(IntervalAction {
                name: format!("purge-{n}"),
                interval: "midnight".to_string(),
                target: "core-data".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    let actions = client.interval_actions_by_interval_name("midnight").await.unwrap();
    assert_eq!(actions.len(), 3);
    let targeted = client.interval_actions_by_target("core-data").await.unwrap();
    assert_eq!(targeted.len(), 3);

    client.scrub_all_interval_actions().await.unwrap();
    assert!(client.interval_actions().await.unwrap().is_empty());
    assert_eq!(client.intervals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn export_registration_roundtrip() -> anyhow::Result<()> {
    let (client, _) = client().await;
    let id = client
        .add_registration(ExportRegistration {
            name: "export-1".to_string(),
            format: "JSON".to_string(),
            destination: "REST_ENDPOINT".to_string(),
            ..Default::default()
        })
        .await?;
    assert_eq!(client.registration_by_name("export-1").await?.id, id);

    client.delete_registration_by_name("export-1").await?;
    assert!(matches!(client.registration_by_id(&id).await.unwrap_err(), Error::NotFound));
    assert!(matches!(
        client.delete_registration_by_name("export-1").await.unwrap_err(),
        Error::NotFound
    ));
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_terminal() {
    let (client, _) = client().await;
    client.add_event(Event { device: "d".to_string(), ..Default::default() }).await.unwrap();
    client.close();
    client.close();
    assert!(client.is_closed());
    let err = client.events().await.unwrap_err();
    assert!(matches!(err, Error::Transport(KvError::Closed)));
}
