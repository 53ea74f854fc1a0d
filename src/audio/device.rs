use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::IdentityError;

/// Separator between address and name in the persisted form.
pub const IDENTITY_DELIMITER: char = '|';

/// Canonical address form: trimmed and upper-cased.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_uppercase()
}

/// A Bluetooth audio endpoint, identified by its hardware address.
///
/// The address is normalized on construction, so two identities are equal
/// when their addresses match ignoring case, whatever their names. Lists shown to the user are ordered with [`DeviceIdentity::display_cmp`].
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    name: String,
    address: String,
}

impl DeviceIdentity {
    /// The address must not contain [`IDENTITY_DELIMITER`] for the
    /// serialized form to parse back.
    pub fn new(name: impl Into<String>, address: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            address: normalize_address(address.as_ref()),
        }
    }

    /// Parse the `address|name` form. Only the first delimiter splits, so
    /// names may contain `|`.
    pub fn parse(serialized: &str) -> Result<Self, IdentityError> {
        let (address, name) = serialized
            .split_once(IDENTITY_DELIMITER)
            .ok_or_else(|| IdentityError::Malformed(serialized.to_string()))?;

        Ok(Self::new(name, address))
    }

    pub fn serialize(&self) -> String {
        format!("{}{}{}", self.address, IDENTITY_DELIMITER, self.name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Display order: name first, address as tie breaker.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.address.cmp(&other.address))
    }
}

impl PartialEq for DeviceIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for DeviceIdentity {}

impl Hash for DeviceIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.address)
    }
}

impl FromStr for DeviceIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One connected audio device as seen by a scan, with whether audio is
/// currently routed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedDeviceInfo {
    pub device: DeviceIdentity,
    pub is_currently_routed: bool,
}

impl ConnectedDeviceInfo {
    pub fn new(device: DeviceIdentity, is_currently_routed: bool) -> Self {
        Self {
            device,
            is_currently_routed,
        }
    }
}

impl fmt::Display for ConnectedDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.device,
            if self.is_currently_routed {
                "Routed"
            } else {
                "Connected"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_delimiter() {
        let device = DeviceIdentity::parse("00:11:22:33:44:55|Pipe | Speaker").unwrap();
        assert_eq!(device.address(), "00:11:22:33:44:55");
        assert_eq!(device.name(), "Pipe | Speaker");
    }

    #[test]
    fn test_parse_without_delimiter_is_malformed() {
        let err = DeviceIdentity::parse("00:11:22:33:44:55").unwrap_err();
        assert_eq!(err, IdentityError::Malformed("00:11:22:33:44:55".to_string()));
    }

    #[test]
    fn test_parse_empty_name() {
        let device = DeviceIdentity::parse("AA:BB:CC:DD:EE:FF|").unwrap();
        assert_eq!(device.name(), "");
        assert_eq!(device.address(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_equality_ignores_name() {
        let a = DeviceIdentity::new("Headphones", "AA:BB:CC:DD:EE:FF");
        let b = DeviceIdentity::new("Renamed", "AA:BB:CC:DD:EE:FF");
        assert_eq!(a, b);
        assert_ne!(a, DeviceIdentity::new("Headphones", "00:11:22:33:44:55"));
    }

    #[test]
    fn test_address_case_is_normalized() {
        let stored = DeviceIdentity::parse("ac:80:0a:12:34:56|WH-1000XM4").unwrap();
        let scanned = DeviceIdentity::new("WH-1000XM4", "AC:80:0A:12:34:56");

        assert_eq!(stored.address(), "AC:80:0A:12:34:56");
        assert_eq!(stored, scanned);
        assert_eq!(stored.serialize(), "AC:80:0A:12:34:56|WH-1000XM4");
        assert_eq!(normalize_address(" aa:bb:cc:dd:ee:ff\n"), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_display_order_uses_name_then_address() {
        let a = DeviceIdentity::new("Alpha", "FF:FF:FF:FF:FF:FF");
        let b = DeviceIdentity::new("Beta", "00:00:00:00:00:00");
        let c = DeviceIdentity::new("Beta", "11:11:11:11:11:11");

        assert_eq!(a.display_cmp(&b), Ordering::Less);
        assert_eq!(b.display_cmp(&c), Ordering::Less);
        assert_eq!(c.display_cmp(&c), Ordering::Equal);
    }

    #[test]
    fn test_display_format() {
        let device = DeviceIdentity::new("Car Stereo", "12:34:56:78:9A:BC");
        assert_eq!(device.to_string(), "Car Stereo [12:34:56:78:9A:BC]");
    }
}
