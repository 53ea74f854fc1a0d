//! Domain errors shared across the router.
//!
//! Application seams (CLI, service loop, config loading) use `anyhow`; these
//! enums cover the cases callers are expected to match on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The serialized device string has no `address|name` delimiter.
    #[error("malformed device identity {0:?}: missing '|' delimiter")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("no device with address {0} in the catalog")]
    UnknownAddress(String),
}

/// Device enumeration failures. An empty device list is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Nothing to enumerate with: no sound server or Bluetooth tooling on the host.
    #[error("audio device enumeration unavailable: {0}")]
    Unavailable(String),

    #[error("audio device enumeration failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    #[error("device {0} is not connected as an audio output")]
    NotConnected(String),

    #[error("failed to activate {device}: {reason}")]
    Failed { device: String, reason: String },
}
