use forced_audio_router::audio::DeviceCatalog;
use forced_audio_router::error::CatalogError;
use std::sync::{Arc, Mutex};

mod test_utils;
use test_utils::{DeviceBuilder, scenarios};

#[test]
fn test_replace_all_dedups_by_address_and_sorts() {
    let catalog = DeviceCatalog::new();
    catalog.replace_all(vec![
        scenarios::speaker(),
        scenarios::car_kit(),
        DeviceBuilder::new()
            .name("Car Kit (duplicate)")
            .address("00:1A:7D:DA:71:13")
            .build(),
        scenarios::earbuds(),
    ]);

    assert_eq!(catalog.count(), 3);
    let names: Vec<_> = catalog
        .snapshot()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, vec!["Car Kit", "Galaxy Buds", "Soundcore Speaker"]);
}

#[test]
fn test_replace_all_is_idempotent() {
    let catalog = DeviceCatalog::new();
    let devices = vec![scenarios::speaker(), scenarios::car_kit(), scenarios::speaker()];

    catalog.replace_all(devices.clone());
    let first: Vec<_> = catalog.snapshot().iter().map(|d| d.serialize()).collect();

    catalog.replace_all(devices);
    let second: Vec<_> = catalog.snapshot().iter().map(|d| d.serialize()).collect();

    assert_eq!(first, second);
}

#[test]
fn test_replace_with_empty_list_empties_catalog() {
    let catalog = DeviceCatalog::new();
    catalog.replace_all(vec![scenarios::speaker()]);
    catalog.replace_all(Vec::new());

    assert!(catalog.is_empty());
    assert_eq!(
        catalog.get(0),
        Err(CatalogError::IndexOutOfRange { index: 0, count: 0 })
    );
}

#[test]
fn test_get_and_position_of() {
    let catalog = DeviceCatalog::new();
    catalog.replace_all(vec![scenarios::speaker(), scenarios::car_kit()]);

    assert_eq!(catalog.get(0).unwrap(), scenarios::car_kit());
    assert_eq!(catalog.get(1).unwrap(), scenarios::speaker());
    assert!(catalog.get(2).is_err());
    assert_eq!(catalog.position_of("F4:4E:FD:01:02:03"), Some(1));
    assert_eq!(catalog.position_of("00:00:00:00:00:00"), None);
}

#[test]
fn test_old_snapshot_survives_replacement() {
    let catalog = DeviceCatalog::new();
    catalog.replace_all(vec![scenarios::speaker()]);
    let before = catalog.snapshot();

    catalog.replace_all(vec![scenarios::car_kit(), scenarios::earbuds()]);

    assert_eq!(before.len(), 1);
    assert_eq!(before[0], scenarios::speaker());
    assert_eq!(catalog.count(), 2);
}

#[test]
fn test_observers_receive_new_content() {
    let catalog = DeviceCatalog::new();
    let seen: Arc<Mutex<Vec<usize>>> = Arc::default();

    let seen_clone = Arc::clone(&seen);
    catalog.subscribe(Box::new(move |devices| {
        seen_clone.lock().unwrap().push(devices.len());
    }));

    catalog.replace_all(vec![scenarios::speaker()]);
    catalog.replace_all(vec![scenarios::speaker(), scenarios::car_kit()]);

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_superseded_scan_is_ignored() {
    let catalog = DeviceCatalog::new();
    let slow = catalog.begin_scan();
    let fast = catalog.begin_scan();

    assert!(catalog.complete_scan(fast, vec![scenarios::car_kit()]));
    assert!(!catalog.complete_scan(slow, vec![scenarios::speaker(), scenarios::earbuds()]));

    assert_eq!(catalog.count(), 1);
    assert_eq!(catalog.get(0).unwrap(), scenarios::car_kit());
}

#[test]
fn test_scan_completion_notifies_observers_once() {
    let catalog = DeviceCatalog::new();
    let calls: Arc<Mutex<usize>> = Arc::default();

    let calls_clone = Arc::clone(&calls);
    catalog.subscribe(Box::new(move |_| *calls_clone.lock().unwrap() += 1));

    let stale = catalog.begin_scan();
    let latest = catalog.begin_scan();
    catalog.complete_scan(stale, vec![scenarios::speaker()]);
    catalog.complete_scan(latest, vec![scenarios::earbuds()]);

    assert_eq!(*calls.lock().unwrap(), 1);
}
