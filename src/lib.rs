pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod priority;
pub mod service;
pub mod system;
pub mod ui;

pub use audio::{ConnectedDeviceInfo, DeviceCatalog, DeviceIdentity};
pub use config::{Config, PreferenceStore, Preferences};
pub use priority::{RoutingAction, RoutingPolicy};
pub use service::RouterService;
pub use ui::DevicePicker;
