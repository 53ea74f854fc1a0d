use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;

use crate::audio::device::normalize_address;
use crate::audio::{ConnectedDeviceInfo, DeviceIdentity, RouteEvent};
use crate::error::{ActivationError, ScanError};
use crate::system::traits::{
    DeviceActivator, DeviceScanner, FileSystemInterface, RouteEventSource,
};

/// Mock audio system for testing - provides controllable device behavior
#[derive(Clone, Default)]
pub struct MockAudioSystem {
    pub connected: Arc<Mutex<Vec<ConnectedDeviceInfo>>>,
    pub paired: Arc<Mutex<Vec<DeviceIdentity>>>,
    pub activation_calls: Arc<Mutex<Vec<DeviceIdentity>>>,
    pub scan_calls: Arc<Mutex<usize>>,
    pub scan_failure: Arc<Mutex<Option<ScanError>>>,
    pub should_fail_activation: Arc<Mutex<bool>>,
    pub route_subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<RouteEvent>>>>,
}

impl MockAudioSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a device without routing audio to it
    pub fn connect(&self, device: DeviceIdentity) {
        self.connected
            .lock()
            .unwrap()
            .push(ConnectedDeviceInfo::new(device, false));
    }

    /// Connect a device and make it the active route
    pub fn connect_routed(&self, device: DeviceIdentity) {
        let mut connected = self.connected.lock().unwrap();
        for info in connected.iter_mut() {
            info.is_currently_routed = false;
        }
        connected.push(ConnectedDeviceInfo::new(device, true));
    }

    pub fn disconnect(&self, address: &str) {
        let address = normalize_address(address);
        self.connected
            .lock()
            .unwrap()
            .retain(|info| info.device.address() != address);
    }

    /// Remember a paired device that is not connected
    pub fn add_paired(&self, device: DeviceIdentity) {
        self.paired.lock().unwrap().push(device);
    }

    /// Make every scan fail with the given error, or succeed again with `None`
    pub fn set_scan_failure(&self, failure: Option<ScanError>) {
        *self.scan_failure.lock().unwrap() = failure;
    }

    pub fn set_activation_failure(&self, should_fail: bool) {
        *self.should_fail_activation.lock().unwrap() = should_fail;
    }

    /// Deliver a route event to every subscriber
    pub fn trigger_route_change(&self, event: RouteEvent) {
        let mut subscribers = self.route_subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn get_activation_calls(&self) -> Vec<DeviceIdentity> {
        self.activation_calls.lock().unwrap().clone()
    }

    pub fn clear_activation_calls(&self) {
        self.activation_calls.lock().unwrap().clear();
    }

    pub fn scan_count(&self) -> usize {
        *self.scan_calls.lock().unwrap()
    }

    /// Address of the currently routed device, if any
    pub fn routed_address(&self) -> Option<String> {
        self.connected
            .lock()
            .unwrap()
            .iter()
            .find(|info| info.is_currently_routed)
            .map(|info| info.device.address().to_string())
    }
}

impl DeviceScanner for MockAudioSystem {
    async fn scan(&self) -> Result<Vec<ConnectedDeviceInfo>, ScanError> {
        *self.scan_calls.lock().unwrap() += 1;
        if let Some(err) = self.scan_failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.connected.lock().unwrap().clone())
    }

    async fn scan_known(&self) -> Result<Vec<DeviceIdentity>, ScanError> {
        let mut devices: Vec<DeviceIdentity> = self
            .scan()
            .await?
            .into_iter()
            .map(|info| info.device)
            .collect();
        devices.extend(self.paired.lock().unwrap().iter().cloned());
        Ok(devices)
    }
}

impl DeviceActivator for MockAudioSystem {
    async fn activate(&self, device: &DeviceIdentity) -> Result<(), ActivationError> {
        self.activation_calls.lock().unwrap().push(device.clone());

        if *self.should_fail_activation.lock().unwrap() {
            return Err(ActivationError::Failed {
                device: device.to_string(),
                reason: "Mock activation failure".to_string(),
            });
        }

        let mut connected = self.connected.lock().unwrap();
        if !connected.iter().any(|info| info.device == *device) {
            return Err(ActivationError::NotConnected(device.to_string()));
        }
        for info in connected.iter_mut() {
            info.is_currently_routed = info.device == *device;
        }
        Ok(())
    }
}

impl RouteEventSource for MockAudioSystem {
    fn subscribe_route_events(&self) -> Result<mpsc::UnboundedReceiver<RouteEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.route_subscribers.lock().unwrap().push(tx);
        Ok(rx)
    }
}

/// Mock file system for testing - provides controllable file operations
#[derive(Clone, Default)]
pub struct MockFileSystem {
    pub files: Arc<Mutex<HashMap<PathBuf, String>>>,
    pub modified: Arc<Mutex<HashMap<PathBuf, SystemTime>>>,
    pub write_calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub directory_creation_calls: Arc<Mutex<Vec<PathBuf>>>,
    pub clock: Arc<Mutex<u64>>,
    pub should_fail_read: Arc<Mutex<bool>>,
    pub should_fail_write: Arc<Mutex<bool>>,
    pub should_fail_create_dir: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a file, as another process editing it would
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: String) {
        let path = path.as_ref().to_path_buf();
        self.touch(&path);
        self.files.lock().unwrap().insert(path, content);
    }

    pub fn file_content<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn get_write_calls(&self) -> Vec<(PathBuf, String)> {
        self.write_calls.lock().unwrap().clone()
    }

    pub fn get_directory_creation_calls(&self) -> Vec<PathBuf> {
        self.directory_creation_calls.lock().unwrap().clone()
    }

    pub fn set_read_failure(&self, should_fail: bool) {
        *self.should_fail_read.lock().unwrap() = should_fail;
    }

    pub fn set_write_failure(&self, should_fail: bool) {
        *self.should_fail_write.lock().unwrap() = should_fail;
    }

    pub fn set_create_dir_failure(&self, should_fail: bool) {
        *self.should_fail_create_dir.lock().unwrap() = should_fail;
    }

    // Every write advances a fake clock by one second.
    fn touch(&self, path: &Path) {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1;
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1000 + *clock);
        self.modified.lock().unwrap().insert(path.to_path_buf(), time);
    }
}

impl FileSystemInterface for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        if *self.should_fail_read.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock read failure"));
        }

        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        self.write_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));

        if *self.should_fail_write.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock write failure"));
        }

        self.add_file(path, content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.directory_creation_calls
            .lock()
            .unwrap()
            .push(path.to_path_buf());

        if *self.should_fail_create_dir.lock().unwrap() {
            return Err(anyhow::anyhow!("Mock create directory failure"));
        }
        Ok(())
    }

    fn modified_time(&self, path: &Path) -> Result<SystemTime> {
        self.modified
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
    }
}
