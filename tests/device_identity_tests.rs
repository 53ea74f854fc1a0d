use forced_audio_router::audio::DeviceIdentity;
use forced_audio_router::error::IdentityError;
use std::collections::HashSet;

mod test_utils;
use test_utils::{DeviceBuilder, scenarios};

#[test]
fn test_serialized_form_round_trips() {
    let mut devices = scenarios::awkward_names();
    devices.push(scenarios::car_kit());

    for device in devices {
        let parsed = DeviceIdentity::parse(&device.serialize()).unwrap();
        assert_eq!(parsed, device);
        assert_eq!(parsed.name(), device.name(), "name lost for {device}");
    }
}

#[test]
fn test_serialized_form_layout() {
    let device = scenarios::car_kit();
    assert_eq!(device.serialize(), "00:1A:7D:DA:71:13|Car Kit");
}

#[test]
fn test_from_str_matches_parse() {
    let parsed: DeviceIdentity = "AC:80:0A:11:22:33|Galaxy Buds".parse().unwrap();
    assert_eq!(parsed, scenarios::earbuds());
    assert_eq!(parsed.name(), "Galaxy Buds");

    let err = "no delimiter here".parse::<DeviceIdentity>().unwrap_err();
    assert!(matches!(err, IdentityError::Malformed(_)));
}

#[test]
fn test_empty_string_is_malformed() {
    assert_eq!(
        DeviceIdentity::parse(""),
        Err(IdentityError::Malformed(String::new()))
    );
}

#[test]
fn test_hash_follows_address() {
    let mut set = HashSet::new();
    set.insert(DeviceBuilder::new().name("First").address("AA").build());
    set.insert(DeviceBuilder::new().name("Second").address("AA").build());
    set.insert(DeviceBuilder::new().name("First").address("BB").build());

    assert_eq!(set.len(), 2);
}

#[test]
fn test_display_sort_order() {
    let mut devices = vec![
        scenarios::speaker(),
        scenarios::car_kit(),
        DeviceBuilder::new().name("Car Kit").address("00:00:00:00:00:01").build(),
        scenarios::earbuds(),
    ];
    devices.sort_by(|a, b| a.display_cmp(b));

    let order: Vec<_> = devices.iter().map(|d| d.address().to_string()).collect();
    assert_eq!(
        order,
        vec![
            "00:00:00:00:00:01",
            "00:1A:7D:DA:71:13",
            "AC:80:0A:11:22:33",
            "F4:4E:FD:01:02:03",
        ]
    );
}
