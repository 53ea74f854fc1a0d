pub mod bluetoothctl;
pub mod catalog;
pub mod command;
pub mod device;
pub mod listener;
pub mod pactl;

pub use catalog::{DeviceCatalog, ScanTicket};
pub use device::{ConnectedDeviceInfo, DeviceIdentity, IDENTITY_DELIMITER};
pub use listener::{RouteChangeListener, RouteEvent};
