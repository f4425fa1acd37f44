//! Device queries against a real MongoDB started in a container

use domain_devices::{
    CreateDevice, DeviceError, DeviceFilter, DeviceService, DeviceStatus, MongoDeviceRepository,
    NearbyQuery, UpdateDevice,
};
use serde_json::json;
use test_utils::assertions::{assert_non_decreasing, assert_some};
use test_utils::{TestDataBuilder, TestMongo};

async fn service_for(
    mongo: &TestMongo,
    test_name: &str,
) -> (DeviceService<MongoDeviceRepository>, TestDataBuilder) {
    let builder = TestDataBuilder::from_test_name(test_name);
    let repository = MongoDeviceRepository::new(&mongo.database(&builder.database_name()));
    repository.init_indexes().await.unwrap();
    (DeviceService::new(repository), builder)
}

#[tokio::test]
async fn test_create_then_get_returns_equal_device() {
    let mongo = TestMongo::new().await;
    let (service, builder) = service_for(&mongo, "create_then_get").await;

    let device_id = builder.device_id("thermo", "living-room");
    let mut config = domain_devices::DeviceConfig::new();
    config.insert("target_celsius".to_string(), json!(21.5));
    config.insert("schedule".to_string(), json!({ "weekday": "06:30" }));

    let created = service
        .create_device(
            CreateDevice::new(&device_id, "Living room thermostat", "sensor")
                .with_location(113.94, 22.54)
                .with_config(config.clone()),
        )
        .await
        .unwrap();

    let fetched = service.get_device(&device_id).await.unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.status, DeviceStatus::Online);
    assert_eq!(fetched.config, config);
    assert_eq!(fetched.created_at, fetched.updated_at);
    assert_eq!(assert_some(fetched.location, "location").longitude(), 113.94);
}

#[tokio::test]
async fn test_duplicate_device_id_is_rejected_and_original_kept() {
    let mongo = TestMongo::new().await;
    let (service, builder) = service_for(&mongo, "duplicate_device_id").await;
    let device_id = builder.device_id("lock", "front");

    service
        .create_device(CreateDevice::new(&device_id, "Front door", "lock"))
        .await
        .unwrap();

    let err = service
        .create_device(
            CreateDevice::new(&device_id, "Impostor", "camera")
                .with_status(DeviceStatus::Offline),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DeviceError::DuplicateKey(ref id) if *id == device_id));

    let original = service.get_device(&device_id).await.unwrap();
    assert_eq!(original.name, "Front door");
    assert_eq!(original.device_type, "lock");
    assert_eq!(original.status, DeviceStatus::Online);
}

#[tokio::test]
async fn test_get_update_delete_missing_device() {
    let mongo = TestMongo::new().await;
    let (service, _) = service_for(&mongo, "missing_device").await;

    assert!(matches!(
        service.get_device("nope").await,
        Err(DeviceError::NotFound(_))
    ));
    assert!(matches!(
        service
            .update_device("nope", UpdateDevice::default())
            .await,
        Err(DeviceError::NotFound(_))
    ));
    assert!(!service.delete_device("nope").await.unwrap());
}

#[tokio::test]
async fn test_update_is_partial_and_refreshes_updated_at() {
    let mongo = TestMongo::new().await;
    let (service, builder) = service_for(&mongo, "partial_update").await;
    let device_id = builder.device_id("plug", "desk");

    let created = service
        .create_device(CreateDevice::new(&device_id, "Desk plug", "plug"))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let updated = service
        .update_device(
            &device_id,
            UpdateDevice {
                status: Some(DeviceStatus::Maintenance),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, DeviceStatus::Maintenance);
    assert_eq!(updated.name, "Desk plug");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    assert!(service.delete_device(&device_id).await.unwrap());
    assert!(!service.delete_device(&device_id).await.unwrap());
}

#[tokio::test]
async fn test_list_filters_by_type_status_and_search() {
    let mongo = TestMongo::new().await;
    let (service, _) = service_for(&mongo, "list_filters").await;

    for (id, name, kind, status) in [
        ("light-1", "Kitchen Light", "light", DeviceStatus::Online),
        ("light-2", "Hall light", "light", DeviceStatus::Offline),
        ("cam-1", "Porch camera", "camera", DeviceStatus::Online),
        ("lock.1", "Back door", "lock", DeviceStatus::Maintenance),
    ] {
        service
            .create_device(CreateDevice::new(id, name, kind).with_status(status))
            .await
            .unwrap();
    }

    let all = service.list_devices(DeviceFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);

    let online_lights = service
        .list_devices(DeviceFilter {
            device_type: Some("light".to_string()),
            status: Some(DeviceStatus::Online),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(online_lights.len(), 1);
    assert_eq!(online_lights[0].device_id, "light-1");

    let by_name = service
        .list_devices(DeviceFilter {
            search: Some("LIGHT".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_name.len(), 2);

    // A regex metacharacter in the term is matched literally
    let literal = service
        .list_devices(DeviceFilter {
            search: Some("k.1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(literal.len(), 1);
    assert_eq!(literal[0].device_id, "lock.1");
}

#[tokio::test]
async fn test_nearby_returns_located_devices_in_distance_order() {
    let mongo = TestMongo::new().await;
    let (service, _) = service_for(&mongo, "nearby_order").await;

    // Roughly 0 m, ~111 m, ~222 m and ~1.1 km north of the origin
    for (id, lat) in [
        ("far", 0.01),
        ("mid", 0.002),
        ("near", 0.001),
        ("origin", 0.0),
    ] {
        service
            .create_device(CreateDevice::new(id, id, "sensor").with_location(0.0, lat))
            .await
            .unwrap();
    }
    service
        .create_device(CreateDevice::new("nowhere", "No location", "sensor"))
        .await
        .unwrap();

    let hits = service
        .nearby_devices(NearbyQuery::new(0.0, 0.0).within(500.0).limit(10))
        .await
        .unwrap();

    let ids: Vec<&str> = hits.iter().map(|h| h.device.device_id.as_str()).collect();
    assert_eq!(ids, vec!["origin", "near", "mid"]);

    let distances: Vec<f64> = hits.iter().map(|h| h.distance_meters).collect();
    assert_non_decreasing(&distances, "nearby distances");
    assert!(distances.iter().all(|d| *d <= 500.0));

    let limited = service
        .nearby_devices(NearbyQuery::new(0.0, 0.0).within(500.0).limit(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].device.device_id, "origin");
}

#[tokio::test]
async fn test_nearby_status_filter() {
    let mongo = TestMongo::new().await;
    let (service, _) = service_for(&mongo, "nearby_status").await;

    service
        .create_device(CreateDevice::new("a", "A", "alarm").with_location(10.0, 10.0))
        .await
        .unwrap();
    service
        .create_device(
            CreateDevice::new("b", "B", "alarm")
                .with_location(10.0, 10.0001)
                .with_status(DeviceStatus::Offline),
        )
        .await
        .unwrap();

    let offline = service
        .nearby_devices(
            NearbyQuery::new(10.0, 10.0)
                .within(1000.0)
                .with_status(DeviceStatus::Offline),
        )
        .await
        .unwrap();

    assert_eq!(offline.len(), 1);
    assert_eq!(offline[0].device.device_id, "b");
}

#[tokio::test]
async fn test_stats_groups_sum_to_total() {
    let mongo = TestMongo::new().await;
    let (service, _) = service_for(&mongo, "device_stats").await;

    for (id, kind, status) in [
        ("l1", "light", DeviceStatus::Online),
        ("l2", "light", DeviceStatus::Online),
        ("l3", "light", DeviceStatus::Offline),
        ("c1", "camera", DeviceStatus::Maintenance),
        ("m1", "motion", DeviceStatus::Online),
    ] {
        service
            .create_device(CreateDevice::new(id, id, kind).with_status(status))
            .await
            .unwrap();
    }

    let stats = service.device_stats().await.unwrap();

    assert_eq!(stats.total, 5);
    assert_eq!(stats.by_type.iter().map(|k| k.count).sum::<u64>(), 5);
    assert_eq!(stats.by_status.iter().map(|k| k.count).sum::<u64>(), 5);

    // Count descending, ties by key ascending
    let types: Vec<(Option<&str>, u64)> = stats
        .by_type
        .iter()
        .map(|k| (k.key.as_deref(), k.count))
        .collect();
    assert_eq!(
        types,
        vec![(Some("light"), 3), (Some("camera"), 1), (Some("motion"), 1)]
    );
}

#[tokio::test]
async fn test_init_indexes_is_idempotent() {
    let mongo = TestMongo::new().await;
    let db = mongo.database("idempotent_indexes");
    let repository = MongoDeviceRepository::new(&db);

    repository.init_indexes().await.unwrap();
    repository.init_indexes().await.unwrap();

    let names = db
        .collection::<mongodb::bson::Document>("devices")
        .list_index_names()
        .await
        .unwrap();
    // _id plus the four declared indexes
    assert_eq!(names.len(), 5);
    assert!(names.contains(&"idx_location_2dsphere".to_string()));
}

#[tokio::test]
async fn test_create_rejects_config_bson_cannot_hold() {
    let mongo = TestMongo::new().await;
    let (service, builder) = service_for(&mongo, "unencodable_config").await;
    let device_id = builder.device_id("plug", "desk");

    let mut config = domain_devices::DeviceConfig::new();
    config.insert("serial".to_string(), json!(u64::MAX));

    let err = service
        .create_device(CreateDevice::new(&device_id, "Desk plug", "plug").with_config(config))
        .await
        .unwrap_err();

    assert!(matches!(err, DeviceError::InvalidArgument(_)));
    assert!(matches!(
        service.get_device(&device_id).await,
        Err(DeviceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_partially_stored_device_does_not_break_reads() {
    let mongo = TestMongo::new().await;
    let (service, builder) = service_for(&mongo, "partial_document").await;
    let db = mongo.database(&builder.database_name());

    let legacy_id = builder.device_id("sensor", "legacy");
    db.collection::<mongodb::bson::Document>("devices")
        .insert_one(mongodb::bson::doc! {
            "device_id": legacy_id.as_str(),
            "name": "Imported sensor",
            "type": "sensor",
            "location": { "type": "Point", "coordinates": [113.94, 22.54] },
        })
        .await
        .unwrap();
    service
        .create_device(
            CreateDevice::new(builder.device_id("sensor", "new"), "New sensor", "sensor")
                .with_location(113.9401, 22.5401),
        )
        .await
        .unwrap();

    let legacy = service.get_device(&legacy_id).await.unwrap();
    assert_eq!(legacy.status, DeviceStatus::Online);
    assert!(legacy.created_at.is_none());

    let all = service.list_devices(DeviceFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let hits = service
        .nearby_devices(NearbyQuery::new(113.94, 22.54).within(500.0))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].device.device_id, legacy_id);
}
