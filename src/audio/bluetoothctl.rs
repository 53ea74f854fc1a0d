use std::path::PathBuf;
use tracing::debug;

use super::command::run_tool;
use super::device::{DeviceIdentity, normalize_address};
use crate::error::ScanError;

/// Parse `bluetoothctl devices` output: `Device <address> <name>` per line.
pub fn parse_device_list(output: &str) -> Vec<DeviceIdentity> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = rest.split_once(' ').unwrap_or((rest, ""));
            if !address.contains(':') {
                return None;
            }
            let address = normalize_address(address);
            let name = if name.trim().is_empty() {
                address.clone()
            } else {
                name.trim().to_string()
            };
            Some(DeviceIdentity::new(name, address))
        })
        .collect()
}

/// Lists paired devices through BlueZ's `bluetoothctl`.
#[derive(Debug, Clone)]
pub struct BluetoothctlClient {
    program: PathBuf,
}

impl BluetoothctlClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn paired_devices(&self) -> Result<Vec<DeviceIdentity>, ScanError> {
        let out = run_tool(&self.program, &["devices", "Paired"]).await?;
        let devices = parse_device_list(&out);
        debug!("bluetoothctl reports {} paired devices", devices.len());
        Ok(devices)
    }
}
