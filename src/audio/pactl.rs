use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use super::command::run_tool;
use super::device::DeviceIdentity;
use crate::error::{ActivationError, ScanError};

/// A sound server sink backed by a Bluetooth device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothSink {
    pub sink_name: String,
    pub device: DeviceIdentity,
}

#[derive(Debug, Deserialize)]
struct RawSink {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    properties: HashMap<String, Value>,
}

impl RawSink {
    fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    fn is_bluetooth(&self) -> bool {
        self.property("device.api") == Some("bluez5")
            || self.property("device.bus") == Some("bluetooth")
            || self.name.starts_with("bluez_")
    }

    fn address(&self) -> Option<String> {
        self.property("api.bluez5.address")
            .or_else(|| self.property("device.string"))
            .filter(|a| a.contains(':'))
            .map(str::to_string)
    }

    fn display_name(&self) -> String {
        self.property("device.description")
            .map(str::to_string)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.description.clone())
    }
}

/// Parse `pactl --format=json list sinks` output, keeping Bluetooth sinks only.
pub fn parse_bluetooth_sinks(json: &str) -> Result<Vec<BluetoothSink>, ScanError> {
    let sinks: Vec<RawSink> = serde_json::from_str(json)
        .map_err(|e| ScanError::Failed(format!("unexpected pactl sink listing: {e}")))?;

    Ok(sinks
        .into_iter()
        .filter(RawSink::is_bluetooth)
        .filter_map(|sink| {
            let address = sink.address()?;
            Some(BluetoothSink {
                device: DeviceIdentity::new(sink.display_name(), address),
                sink_name: sink.name,
            })
        })
        .collect())
}

/// Thin async wrapper over the `pactl` command line tool.
#[derive(Debug, Clone)]
pub struct PactlClient {
    program: PathBuf,
}

impl PactlClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub async fn bluetooth_sinks(&self) -> Result<Vec<BluetoothSink>, ScanError> {
        let json = run_tool(&self.program, &["--format=json", "list", "sinks"]).await?;
        let sinks = parse_bluetooth_sinks(&json)?;
        debug!("pactl reports {} Bluetooth sinks", sinks.len());
        Ok(sinks)
    }

    pub async fn default_sink(&self) -> Result<Option<String>, ScanError> {
        let out = run_tool(&self.program, &["get-default-sink"]).await?;
        let name = out.trim();
        Ok((!name.is_empty()).then(|| name.to_string()))
    }

    pub async fn set_default_sink(&self, sink_name: &str) -> Result<(), ActivationError> {
        info!("Setting default sink to {}", sink_name);
        run_tool(&self.program, &["set-default-sink", sink_name])
            .await
            .map(|_| ())
            .map_err(|e| ActivationError::Failed {
                device: sink_name.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPEWIRE_SINKS: &str = r#"[
        {
            "index": 52,
            "name": "alsa_output.pci-0000_00_1f.3.analog-stereo",
            "description": "Built-in Audio Analog Stereo",
            "properties": { "device.api": "alsa", "device.description": "Built-in Audio" }
        },
        {
            "index": 81,
            "name": "bluez_output.AC_80_0A_12_34_56.1",
            "description": "WH-1000XM4",
            "properties": {
                "device.api": "bluez5",
                "api.bluez5.address": "ac:80:0a:12:34:56",
                "device.description": "WH-1000XM4"
            }
        }
    ]"#;

    const PULSE_SINKS: &str = r#"[
        {
            "name": "bluez_sink.00_11_22_33_44_55.a2dp_sink",
            "description": "Car Kit",
            "properties": { "device.bus": "bluetooth", "device.string": "00:11:22:33:44:55" }
        }
    ]"#;

    #[test]
    fn test_parse_pipewire_sinks_keeps_bluetooth_only() {
        let sinks = parse_bluetooth_sinks(PIPEWIRE_SINKS).unwrap();
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].sink_name, "bluez_output.AC_80_0A_12_34_56.1");
        assert_eq!(sinks[0].device.address(), "AC:80:0A:12:34:56");
        assert_eq!(sinks[0].device.name(), "WH-1000XM4");
    }

    #[test]
    fn test_parse_pulseaudio_sinks() {
        let sinks = parse_bluetooth_sinks(PULSE_SINKS).unwrap();
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].device.address(), "00:11:22:33:44:55");
        assert_eq!(sinks[0].device.name(), "Car Kit");
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_bluetooth_sinks("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_is_failure() {
        assert!(matches!(
            parse_bluetooth_sinks("Sink #1"),
            Err(ScanError::Failed(_))
        ));
    }
}
