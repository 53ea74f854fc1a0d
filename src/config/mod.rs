pub mod loader;
pub mod store;
pub mod types;

pub use loader::ConfigLoader;
pub use store::{PreferenceStore, Preferences};
pub use types::{Config, GeneralConfig, NotificationConfig, PlatformConfig, RoutingConfig};
