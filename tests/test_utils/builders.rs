//! Test utility builders for creating devices and preferences
//!
//! Individual methods may not be used by all tests, so dead code warnings are suppressed.

#![allow(dead_code)]

use forced_audio_router::audio::{ConnectedDeviceInfo, DeviceIdentity};
use forced_audio_router::config::Preferences;

/// Builder for creating test DeviceIdentity instances
pub struct DeviceBuilder {
    name: String,
    address: String,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self {
            name: "Test Headphones".to_string(),
            address: "00:11:22:33:44:55".to_string(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    pub fn build(self) -> DeviceIdentity {
        DeviceIdentity::new(self.name, self.address)
    }

    pub fn connected(self) -> ConnectedDeviceInfo {
        ConnectedDeviceInfo::new(self.build(), false)
    }

    pub fn routed(self) -> ConnectedDeviceInfo {
        ConnectedDeviceInfo::new(self.build(), true)
    }
}

impl Default for DeviceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Preferences instances
pub struct PreferencesBuilder {
    enabled: bool,
    priority_device: Option<DeviceIdentity>,
}

impl PreferencesBuilder {
    pub fn new() -> Self {
        Self {
            enabled: true,
            priority_device: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn priority(mut self, device: DeviceIdentity) -> Self {
        self.priority_device = Some(device);
        self
    }

    pub fn build(self) -> Preferences {
        Preferences {
            enabled: self.enabled,
            priority_device: self.priority_device,
        }
    }
}

impl Default for PreferencesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for creating common test scenarios
pub mod scenarios {
    use super::*;

    pub fn car_kit() -> DeviceIdentity {
        DeviceBuilder::new()
            .name("Car Kit")
            .address("00:1A:7D:DA:71:13")
            .build()
    }

    pub fn earbuds() -> DeviceIdentity {
        DeviceBuilder::new()
            .name("Galaxy Buds")
            .address("AC:80:0A:11:22:33")
            .build()
    }

    pub fn speaker() -> DeviceIdentity {
        DeviceBuilder::new()
            .name("Soundcore Speaker")
            .address("F4:4E:FD:01:02:03")
            .build()
    }

    /// Earbuds are active, the car kit is connected but idle
    pub fn car_kit_connected_idle() -> Vec<ConnectedDeviceInfo> {
        vec![
            ConnectedDeviceInfo::new(earbuds(), true),
            ConnectedDeviceInfo::new(car_kit(), false),
        ]
    }

    /// Configuration file text for a given routing state
    pub fn config_toml(enabled: bool, priority_device: Option<&DeviceIdentity>) -> String {
        let mut content = format!("[routing]\nenabled = {enabled}\n");
        if let Some(device) = priority_device {
            content.push_str(&format!("priority_device = \"{}\"\n", device.serialize()));
        }
        content
    }

    /// Devices with names that stress display ordering and serialization
    pub fn awkward_names() -> Vec<DeviceIdentity> {
        vec![
            DeviceBuilder::new().name("").address("01:00:00:00:00:00").build(),
            DeviceBuilder::new()
                .name("Pipe | In Name")
                .address("02:00:00:00:00:00")
                .build(),
            DeviceBuilder::new()
                .name("🎵 Music Device 🎵")
                .address("03:00:00:00:00:00")
                .build(),
            DeviceBuilder::new()
                .name("Device with spaces")
                .address("04:00:00:00:00:00")
                .build(),
        ]
    }
}
