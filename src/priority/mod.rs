pub mod policy;

pub use policy::{RoutingAction, RoutingPolicy};
