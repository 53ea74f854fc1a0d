use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{debug, info};

use super::loader::ConfigLoader;
use super::types::{Config, RoutingConfig};
use crate::audio::{DeviceIdentity, IDENTITY_DELIMITER};
use crate::error::IdentityError;
use crate::system::FileSystemInterface;

/// Decoded routing preferences: the whole persistent configuration surface
/// the router acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub enabled: bool,
    pub priority_device: Option<DeviceIdentity>,
}

impl Preferences {
    pub fn from_routing(routing: &RoutingConfig) -> Result<Self, IdentityError> {
        Ok(Self {
            enabled: routing.enabled,
            priority_device: routing.decode_priority_device()?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, IdentityError> {
        Self::from_routing(&config.routing)
    }
}

struct StoreState {
    config: Config,
    last_modified: Option<SystemTime>,
}

/// Durable preference store with change notification.
///
/// Writes are serialized and published to subscribers in the order they were
/// made. Subscribers always observe the latest snapshot.
pub struct PreferenceStore<F: FileSystemInterface> {
    loader: ConfigLoader<F>,
    state: Mutex<StoreState>,
    sender: watch::Sender<Preferences>,
}

impl<F: FileSystemInterface> PreferenceStore<F> {
    /// Load the configuration. A malformed priority device is an error here
    /// rather than a silent default.
    pub fn open(loader: ConfigLoader<F>) -> Result<Self> {
        let config = loader.load_config()?;
        let preferences = Preferences::from_config(&config).with_context(|| {
            format!("Invalid routing preferences in {}", loader.config_path().display())
        })?;
        let last_modified = loader.modified_time();

        info!(
            "Routing {}, priority device: {}",
            if preferences.enabled { "enabled" } else { "disabled" },
            describe(&preferences.priority_device)
        );

        let (sender, _) = watch::channel(preferences);
        Ok(Self {
            loader,
            state: Mutex::new(StoreState {
                config,
                last_modified,
            }),
            sender,
        })
    }

    pub fn snapshot(&self) -> Preferences {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.sender.subscribe()
    }

    pub fn config(&self) -> Config {
        self.lock_state().config.clone()
    }

    pub fn config_path(&self) -> &Path {
        self.loader.config_path()
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        debug!("Setting routing enabled = {}", enabled);
        self.update(|routing| routing.enabled = enabled)
    }

    /// Persist the priority device, or clear it with `None`.
    pub fn set_priority_device(&self, device: Option<&DeviceIdentity>) -> Result<()> {
        if let Some(device) = device {
            if device.address().contains(IDENTITY_DELIMITER) {
                bail!(
                    "device address {:?} contains the '{}' delimiter",
                    device.address(),
                    IDENTITY_DELIMITER
                );
            }
        }

        debug!("Setting priority device = {}", describe(&device.cloned()));
        let serialized = device.map(DeviceIdentity::serialize);
        self.update(move |routing| routing.priority_device = serialized)
    }

    /// Re-read the file and publish its preferences. Returns whether they changed.
    /// On a parse or decode error the previous snapshot stays in effect.
    pub fn reload(&self) -> Result<bool> {
        let mut state = self.lock_state();

        let config = self.loader.load_config()?;
        let preferences = Preferences::from_config(&config).with_context(|| {
            format!(
                "Invalid routing preferences in {}",
                self.loader.config_path().display()
            )
        })?;

        state.config = config;
        state.last_modified = self.loader.modified_time();
        Ok(self.publish(preferences))
    }

    /// Reload only when the file changed since it was last read or written.
    pub fn reload_if_modified(&self) -> Result<bool> {
        let last_modified = self.lock_state().last_modified;
        if !self.loader.is_config_modified(last_modified) {
            return Ok(false);
        }

        info!(
            "Configuration file {} changed, reloading",
            self.loader.config_path().display()
        );
        self.reload()
    }

    fn update(&self, mutate: impl FnOnce(&mut RoutingConfig)) -> Result<()> {
        let mut state = self.lock_state();

        let mut config = state.config.clone();
        mutate(&mut config.routing);
        let preferences = Preferences::from_config(&config)?;

        self.loader.save_config(&config)?;
        state.config = config;
        state.last_modified = self.loader.modified_time();

        self.publish(preferences);
        Ok(())
    }

    fn publish(&self, preferences: Preferences) -> bool {
        self.sender.send_if_modified(|current| {
            let changed = *current != preferences
                || current.priority_device.as_ref().map(DeviceIdentity::name)
                    != preferences.priority_device.as_ref().map(DeviceIdentity::name);
            if changed {
                *current = preferences;
            }
            changed
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub(crate) fn describe(device: &Option<DeviceIdentity>) -> String {
    device
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}
