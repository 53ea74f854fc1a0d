use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::audio::{DeviceCatalog, DeviceIdentity};
use crate::config::PreferenceStore;
use crate::error::{CatalogError, ScanError};
use crate::system::{DeviceScanner, FileSystemInterface};

/// Devices shown when the host has no audio tooling to enumerate with.
pub fn placeholder_devices() -> Vec<DeviceIdentity> {
    vec![
        DeviceIdentity::new("Fake Device 1", "00:11:22:33:44:55"),
        DeviceIdentity::new("Fake Device 2", "AA:BB:CC:DD:EE:FF"),
    ]
}

/// Result of a catalog refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Catalog replaced with this many scanned devices
    Updated(usize),
    /// Enumeration unavailable; catalog holds the placeholder set
    Placeholder(usize),
    /// Scan failed; the previous catalog is still shown
    Retained(ScanError),
    /// A newer refresh started before this one finished
    Superseded,
}

/// One line of the picker list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRow {
    pub device: DeviceIdentity,
    pub is_priority: bool,
    pub is_selected: bool,
}

/// Scan, choose and save the priority device.
///
/// The picker reads the priority device from the store only when building
/// rows, so edits made elsewhere show up on the next [`rows`](Self::rows).
pub struct DevicePicker<S: DeviceScanner, F: FileSystemInterface> {
    scanner: S,
    store: Arc<PreferenceStore<F>>,
    catalog: DeviceCatalog,
    selected: Mutex<Option<DeviceIdentity>>,
}

impl<S: DeviceScanner, F: FileSystemInterface> DevicePicker<S, F> {
    pub fn new(scanner: S, store: Arc<PreferenceStore<F>>) -> Self {
        Self {
            scanner,
            store,
            catalog: DeviceCatalog::new(),
            selected: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let ticket = self.catalog.begin_scan();
        debug!("Refreshing device catalog ({:?})", ticket);

        let outcome = match self.scanner.scan_known().await {
            Ok(devices) => {
                if !self.catalog.complete_scan(ticket, devices) {
                    return RefreshOutcome::Superseded;
                }
                RefreshOutcome::Updated(self.catalog.count())
            }
            Err(ScanError::Unavailable(reason)) => {
                warn!("Device enumeration unavailable ({}), showing placeholders", reason);
                if !self.catalog.complete_scan(ticket, placeholder_devices()) {
                    return RefreshOutcome::Superseded;
                }
                RefreshOutcome::Placeholder(self.catalog.count())
            }
            Err(e) => {
                warn!("Device scan failed, keeping {} devices: {}", self.catalog.count(), e);
                return RefreshOutcome::Retained(e);
            }
        };

        self.drop_stale_selection();
        info!("Device catalog refreshed: {:?}", outcome);
        outcome
    }

    pub fn select(&self, index: usize) -> Result<DeviceIdentity, CatalogError> {
        let device = self.catalog.get(index)?;
        debug!("Selected {}", device);
        *self.lock_selected() = Some(device.clone());
        Ok(device)
    }

    pub fn select_address(&self, address: &str) -> Result<DeviceIdentity, CatalogError> {
        let index = self
            .catalog
            .position_of(address)
            .ok_or_else(|| CatalogError::UnknownAddress(address.to_string()))?;
        self.select(index)
    }

    pub fn clear_selection(&self) {
        *self.lock_selected() = None;
    }

    pub fn selected(&self) -> Option<DeviceIdentity> {
        self.lock_selected().clone()
    }

    /// Persist the selection as the priority device. Nothing selected clears it.
    pub fn save(&self) -> Result<Option<DeviceIdentity>> {
        let selected = self.selected();
        self.store.set_priority_device(selected.as_ref())?;
        match &selected {
            Some(device) => info!("Priority device saved: {}", device),
            None => info!("Priority device cleared"),
        }
        Ok(selected)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.store.set_enabled(enabled)?;
        info!("Routing {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn rows(&self) -> Vec<PickerRow> {
        let priority = self.store.snapshot().priority_device;
        let selected = self.selected();

        self.catalog
            .snapshot()
            .iter()
            .map(|device| PickerRow {
                device: device.clone(),
                is_priority: priority.as_ref() == Some(device),
                is_selected: selected.as_ref() == Some(device),
            })
            .collect()
    }

    fn drop_stale_selection(&self) {
        let mut selected = self.lock_selected();
        if let Some(device) = selected.as_ref() {
            if self.catalog.position_of(device.address()).is_none() {
                debug!("Selected device {} no longer listed", device);
                *selected = None;
            }
        }
    }

    fn lock_selected(&self) -> MutexGuard<'_, Option<DeviceIdentity>> {
        self.selected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::system::{MockAudioSystem, MockFileSystem};
    use std::path::PathBuf;

    fn picker() -> (DevicePicker<MockAudioSystem, MockFileSystem>, MockAudioSystem, MockFileSystem) {
        let audio = MockAudioSystem::new();
        let mock_fs = MockFileSystem::new();
        mock_fs.add_file("/test/config.toml", String::new());
        let store = PreferenceStore::open(ConfigLoader::new(
            mock_fs.clone(),
            PathBuf::from("/test/config.toml"),
        ))
        .unwrap();
        (DevicePicker::new(audio.clone(), Arc::new(store)), audio, mock_fs)
    }

    #[tokio::test]
    async fn test_refresh_lists_connected_and_paired() {
        let (picker, audio, _) = picker();
        audio.connect(DeviceIdentity::new("Speaker", "11:11:11:11:11:11"));
        audio.add_paired(DeviceIdentity::new("Buds", "22:22:22:22:22:22"));

        assert_eq!(picker.refresh().await, RefreshOutcome::Updated(2));
        let names: Vec<_> = picker.rows().iter().map(|r| r.device.name().to_string()).collect();
        assert_eq!(names, vec!["Buds", "Speaker"]);
    }

    #[tokio::test]
    async fn test_unavailable_shows_placeholders() {
        let (picker, audio, _) = picker();
        audio.set_scan_failure(Some(ScanError::Unavailable("no pactl".to_string())));

        assert_eq!(picker.refresh().await, RefreshOutcome::Placeholder(2));
        assert_eq!(picker.catalog().get(0).unwrap().name(), "Fake Device 1");
    }

    #[tokio::test]
    async fn test_failed_scan_keeps_previous_catalog() {
        let (picker, audio, _) = picker();
        audio.connect(DeviceIdentity::new("Speaker", "11:11:11:11:11:11"));
        picker.refresh().await;

        let failure = ScanError::Failed("exit 1".to_string());
        audio.set_scan_failure(Some(failure.clone()));
        assert_eq!(picker.refresh().await, RefreshOutcome::Retained(failure));
        assert_eq!(picker.catalog().count(), 1);
    }

    #[tokio::test]
    async fn test_save_selection_and_clear() {
        let (picker, audio, mock_fs) = picker();
        audio.connect(DeviceIdentity::new("Speaker", "11:11:11:11:11:11"));
        picker.refresh().await;

        picker.select(0).unwrap();
        let saved = picker.save().unwrap();
        assert_eq!(saved.unwrap().address(), "11:11:11:11:11:11");
        assert!(
            mock_fs
                .file_content("/test/config.toml")
                .unwrap()
                .contains("11:11:11:11:11:11|Speaker")
        );

        let rows = picker.rows();
        assert!(rows[0].is_priority);
        assert!(rows[0].is_selected);

        picker.clear_selection();
        assert_eq!(picker.save().unwrap(), None);
        assert!(!picker.rows()[0].is_priority);
    }

    #[tokio::test]
    async fn test_select_out_of_range() {
        let (picker, _, _) = picker();
        picker.refresh().await;

        assert_eq!(
            picker.select(3),
            Err(CatalogError::IndexOutOfRange { index: 3, count: 0 })
        );
        assert_eq!(
            picker.select_address("00:00:00:00:00:00"),
            Err(CatalogError::UnknownAddress("00:00:00:00:00:00".to_string()))
        );
    }

    #[tokio::test]
    async fn test_selection_dropped_when_device_disappears() {
        let (picker, audio, _) = picker();
        audio.connect(DeviceIdentity::new("Speaker", "11:11:11:11:11:11"));
        picker.refresh().await;
        picker.select(0).unwrap();

        audio.disconnect("11:11:11:11:11:11");
        picker.refresh().await;
        assert_eq!(picker.selected(), None);
    }
}
