use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::audio::{ConnectedDeviceInfo, DeviceIdentity, RouteEvent};
use crate::error::{ActivationError, ScanError};

/// Enumerates audio devices - abstracts the sound server and BlueZ tooling
pub trait DeviceScanner: Send + Sync {
    /// Currently connected Bluetooth audio devices with their routed status.
    /// An empty list means nothing is connected; it is not an error.
    fn scan(&self) -> impl Future<Output = Result<Vec<ConnectedDeviceInfo>, ScanError>> + Send;

    /// Devices worth offering in the picker: connected ones plus any the
    /// platform remembers. Defaults to the connected set.
    fn scan_known(&self) -> impl Future<Output = Result<Vec<DeviceIdentity>, ScanError>> + Send {
        async move {
            let connected = self.scan().await?;
            Ok(connected.into_iter().map(|info| info.device).collect())
        }
    }
}

/// Makes a device the active audio output
pub trait DeviceActivator: Send + Sync {
    fn activate(
        &self,
        device: &DeviceIdentity,
    ) -> impl Future<Output = Result<(), ActivationError>> + Send;
}

// One platform handle is usually shared by the daemon and the picker.
impl<T: DeviceScanner> DeviceScanner for Arc<T> {
    fn scan(&self) -> impl Future<Output = Result<Vec<ConnectedDeviceInfo>, ScanError>> + Send {
        (**self).scan()
    }

    fn scan_known(&self) -> impl Future<Output = Result<Vec<DeviceIdentity>, ScanError>> + Send {
        (**self).scan_known()
    }
}

impl<T: DeviceActivator> DeviceActivator for Arc<T> {
    fn activate(
        &self,
        device: &DeviceIdentity,
    ) -> impl Future<Output = Result<(), ActivationError>> + Send {
        (**self).activate(device)
    }
}

/// Source of route-change notifications
pub trait RouteEventSource {
    /// Start delivering route events. Each call returns an independent stream.
    fn subscribe_route_events(&self) -> Result<mpsc::UnboundedReceiver<RouteEvent>>;
}

/// Trait for file system operations - abstracts std::fs for testability
pub trait FileSystemInterface: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Replace the file contents so readers never see a half-written file.
    fn write_atomic(&self, path: &Path, content: &str) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Last modification time, used to notice edits made by other processes.
    fn modified_time(&self, path: &Path) -> Result<std::time::SystemTime>;
}
