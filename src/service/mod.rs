pub mod installer;
pub mod router;
pub mod signals;

pub use installer::ServiceInstaller;
pub use router::RouterService;
pub use signals::{SignalHandler, SignalType};
