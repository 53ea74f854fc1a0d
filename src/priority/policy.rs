use std::fmt;
use tracing::{debug, info};

use crate::audio::{ConnectedDeviceInfo, DeviceIdentity};
use crate::config::Preferences;

/// What the router should do after looking at the connected devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingAction {
    ActivateDevice(DeviceIdentity),
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingAction::ActivateDevice(device) => write!(f, "activate {device}"),
        }
    }
}

/// Decides whether audio has to be moved to the priority device.
///
/// Evaluation is a pure function of the preference snapshot and the
/// connected-device list, so it can run on every route change.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingPolicy;

impl RoutingPolicy {
    pub fn new() -> Self {
        Self
    }

    /// The device the policy would act on, if routing is enabled and configured.
    pub fn target<'a>(&self, preferences: &'a Preferences) -> Option<&'a DeviceIdentity> {
        if !preferences.enabled {
            return None;
        }
        preferences.priority_device.as_ref()
    }

    pub fn evaluate(
        &self,
        preferences: &Preferences,
        connected: &[ConnectedDeviceInfo],
    ) -> Option<RoutingAction> {
        let Some(priority) = self.target(preferences) else {
            debug!("Routing disabled or no priority device, nothing to do");
            return None;
        };

        let mut matches = connected
            .iter()
            .filter(|info| info.device.address() == priority.address())
            .peekable();

        let Some(first) = matches.peek().map(|info| info.device.clone()) else {
            debug!(
                "Priority device {} not among {} connected devices",
                priority,
                connected.len()
            );
            return None;
        };

        // A duplicated entry counts as routed if any copy is routed.
        if matches.any(|info| info.is_currently_routed) {
            debug!("Priority device {} already routed", priority);
            return None;
        }

        info!("Priority device {} connected but not routed", first);
        Some(RoutingAction::ActivateDevice(first))
    }
}
