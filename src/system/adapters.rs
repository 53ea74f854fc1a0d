use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::bluetoothctl::BluetoothctlClient;
use crate::audio::pactl::PactlClient;
use crate::audio::{ConnectedDeviceInfo, DeviceIdentity, RouteChangeListener, RouteEvent};
use crate::config::PlatformConfig;
use crate::error::{ActivationError, ScanError};
use crate::system::traits::{
    DeviceActivator, DeviceScanner, FileSystemInterface, RouteEventSource,
};

/// Production audio system on PulseAudio or PipeWire-Pulse, with BlueZ for paired devices
pub struct PulseAudioSystem {
    pactl: PactlClient,
    bluetoothctl: BluetoothctlClient,
    listener: RouteChangeListener,
}

impl PulseAudioSystem {
    pub fn new(platform: &PlatformConfig) -> Self {
        info!(
            "Using {} for audio routing and {} for paired devices",
            platform.pactl_path.display(),
            platform.bluetoothctl_path.display()
        );

        Self {
            pactl: PactlClient::new(&platform.pactl_path),
            bluetoothctl: BluetoothctlClient::new(&platform.bluetoothctl_path),
            listener: RouteChangeListener::new(&platform.pactl_path),
        }
    }
}

impl DeviceScanner for PulseAudioSystem {
    async fn scan(&self) -> Result<Vec<ConnectedDeviceInfo>, ScanError> {
        let sinks = self.pactl.bluetooth_sinks().await?;
        let default_sink = self.pactl.default_sink().await?;

        Ok(sinks
            .into_iter()
            .map(|sink| {
                let routed = default_sink.as_deref() == Some(sink.sink_name.as_str());
                ConnectedDeviceInfo::new(sink.device, routed)
            })
            .collect())
    }

    async fn scan_known(&self) -> Result<Vec<DeviceIdentity>, ScanError> {
        let mut devices: Vec<DeviceIdentity> = self
            .pactl
            .bluetooth_sinks()
            .await?
            .into_iter()
            .map(|sink| sink.device)
            .collect();

        // Paired but disconnected devices are a bonus; the picker still works without BlueZ.
        match self.bluetoothctl.paired_devices().await {
            Ok(paired) => {
                let connected: HashSet<String> =
                    devices.iter().map(|d| d.address().to_string()).collect();
                devices.extend(
                    paired
                        .into_iter()
                        .filter(|d| !connected.contains(d.address())),
                );
            }
            Err(e) => warn!("Could not list paired devices: {}", e),
        }

        debug!("Found {} known Bluetooth audio devices", devices.len());
        Ok(devices)
    }
}

impl DeviceActivator for PulseAudioSystem {
    async fn activate(&self, device: &DeviceIdentity) -> Result<(), ActivationError> {
        let sinks = self
            .pactl
            .bluetooth_sinks()
            .await
            .map_err(|e| ActivationError::Failed {
                device: device.to_string(),
                reason: e.to_string(),
            })?;

        let sink = sinks
            .iter()
            .find(|sink| sink.device == *device)
            .ok_or_else(|| ActivationError::NotConnected(device.to_string()))?;

        self.pactl.set_default_sink(&sink.sink_name).await
    }
}

impl RouteEventSource for PulseAudioSystem {
    fn subscribe_route_events(&self) -> Result<mpsc::UnboundedReceiver<RouteEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listener.spawn(tx);
        Ok(rx)
    }
}

/// Production implementation of FileSystemInterface using std::fs
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFileSystem;

impl FileSystemInterface for StandardFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))
    }

    fn modified_time(&self, path: &Path) -> Result<std::time::SystemTime> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for {}", path.display()))?;
        metadata
            .modified()
            .context("Failed to get modified time")
    }
}
