use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::DeviceIdentity;
use crate::error::IdentityError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub platform: PlatformConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// How often the daemon checks the config file for edits.
    pub check_interval_ms: u64,
    pub log_level: String,
}

/// The persisted routing preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub enabled: bool,

    /// `address|name`; kept raw so a malformed value surfaces when decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub show_switching_actions: bool,  // Switched to / failed to switch to the priority device
    pub show_preference_changes: bool, // Enabled/disabled, priority device changed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub pactl_path: PathBuf,
    pub bluetoothctl_path: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
            log_level: "info".to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            show_switching_actions: true,
            show_preference_changes: false,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            pactl_path: PathBuf::from("pactl"),
            bluetoothctl_path: PathBuf::from("bluetoothctl"),
        }
    }
}

impl RoutingConfig {
    pub fn decode_priority_device(&self) -> Result<Option<DeviceIdentity>, IdentityError> {
        self.priority_device
            .as_deref()
            .map(DeviceIdentity::parse)
            .transpose()
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
