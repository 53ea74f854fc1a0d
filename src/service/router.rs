use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::signals::SignalType;
use crate::audio::RouteEvent;
use crate::config::{PreferenceStore, Preferences};
use crate::notifications::{DesktopNotificationSender, NotificationManager, NotificationSender};
use crate::priority::{RoutingAction, RoutingPolicy};
use crate::system::{DeviceActivator, DeviceScanner, FileSystemInterface};

const MIN_CHECK_INTERVAL_MS: u64 = 100;

/// Background service keeping audio on the priority device.
///
/// Route changes and preference changes arrive on separate channels and both
/// lead to the same re-evaluation: scan, ask the policy, maybe activate.
pub struct RouterService<S, A, F, N = DesktopNotificationSender>
where
    S: DeviceScanner,
    A: DeviceActivator,
    F: FileSystemInterface,
    N: NotificationSender,
{
    scanner: S,
    activator: A,
    store: Arc<PreferenceStore<F>>,
    policy: RoutingPolicy,
    notifications: NotificationManager<N>,
    check_interval: Duration,
}

impl<S, A, F, N> RouterService<S, A, F, N>
where
    S: DeviceScanner,
    A: DeviceActivator,
    F: FileSystemInterface,
    N: NotificationSender,
{
    pub fn new(
        scanner: S,
        activator: A,
        store: Arc<PreferenceStore<F>>,
        notifications: NotificationManager<N>,
    ) -> Self {
        let interval_ms = store
            .config()
            .general
            .check_interval_ms
            .max(MIN_CHECK_INTERVAL_MS);

        Self {
            scanner,
            activator,
            store,
            policy: RoutingPolicy::new(),
            notifications,
            check_interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn store(&self) -> &Arc<PreferenceStore<F>> {
        &self.store
    }

    pub fn notifications(&self) -> &NotificationManager<N> {
        &self.notifications
    }

    /// Scan and apply the policy once. Returns the action taken, if any.
    ///
    /// Scan failures and activation failures are logged and end the cycle;
    /// the next route change triggers another attempt.
    pub async fn reevaluate(&self) -> Option<RoutingAction> {
        if self.policy.target(&self.store.snapshot()).is_none() {
            debug!("Routing disabled or unconfigured, skipping scan");
            return None;
        }

        let connected = match self.scanner.scan().await {
            Ok(connected) => connected,
            Err(e) => {
                warn!("Device scan failed, no routing this cycle: {}", e);
                return None;
            }
        };
        debug!("Scan found {} connected audio devices", connected.len());

        // Preferences may have changed while the scan was in flight.
        let action = self.policy.evaluate(&self.store.snapshot(), &connected)?;

        match &action {
            RoutingAction::ActivateDevice(device) => match self.activator.activate(device).await {
                Ok(()) => {
                    info!("Audio routed to {}", device);
                    if let Err(e) = self.notifications.device_activated(device) {
                        error!("Failed to send switch notification: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Failed to route audio to {}: {}", device, e);
                    if let Err(e) = self.notifications.activation_failed(device, &e.to_string()) {
                        error!("Failed to send switch failed notification: {}", e);
                    }
                }
            },
        }

        Some(action)
    }

    /// Run until a shutdown message arrives or the control channel closes.
    pub async fn run(
        &self,
        mut route_events: mpsc::UnboundedReceiver<RouteEvent>,
        mut control: mpsc::UnboundedReceiver<SignalType>,
    ) -> Result<()> {
        let mut preferences = self.store.subscribe();
        let mut last_seen = preferences.borrow_and_update().clone();

        let mut poll = tokio::time::interval(self.check_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        poll.tick().await;

        info!(
            "Router service started, watching {}",
            self.store.config_path().display()
        );
        self.reevaluate().await;

        let mut routes_open = true;
        loop {
            tokio::select! {
                biased;

                message = control.recv() => match message {
                    Some(SignalType::Reload) => {
                        info!("Reloading preferences on request");
                        if let Err(e) = self.store.reload() {
                            error!("Failed to reload preferences: {:#}", e);
                        }
                    }
                    Some(SignalType::Shutdown) | None => {
                        info!("Shutdown requested, stopping router service");
                        break;
                    }
                },

                changed = preferences.changed() => {
                    if changed.is_err() {
                        warn!("Preference store closed, stopping router service");
                        break;
                    }
                    let current = preferences.borrow_and_update().clone();
                    self.announce_preference_change(&last_seen, &current);
                    last_seen = current;
                    self.reevaluate().await;
                }

                event = route_events.recv(), if routes_open => match event {
                    Some(event) => {
                        // Route changes come in bursts; one evaluation covers them all.
                        let mut coalesced = 1;
                        while route_events.try_recv().is_ok() {
                            coalesced += 1;
                        }
                        debug!("Route event {:?} ({} coalesced)", event, coalesced);
                        self.reevaluate().await;
                    }
                    None => {
                        warn!("Route event source closed, only preference changes will trigger routing");
                        routes_open = false;
                    }
                },

                _ = poll.tick() => {
                    if let Err(e) = self.store.reload_if_modified() {
                        error!("Failed to reload preferences: {:#}", e);
                    }
                }
            }
        }

        info!("Router service stopped");
        Ok(())
    }

    fn announce_preference_change(&self, previous: &Preferences, current: &Preferences) {
        if previous.enabled != current.enabled {
            info!(
                "Routing {}",
                if current.enabled { "enabled" } else { "disabled" }
            );
            if let Err(e) = self.notifications.routing_toggled(current.enabled) {
                error!("Failed to send preference notification: {}", e);
            }
        }

        let device_changed = previous.priority_device != current.priority_device
            || previous.priority_device.as_ref().map(|d| d.name())
                != current.priority_device.as_ref().map(|d| d.name());
        if device_changed {
            info!(
                "Priority device changed to {}",
                crate::config::store::describe(&current.priority_device)
            );
            if let Err(e) = self
                .notifications
                .priority_device_changed(current.priority_device.as_ref())
            {
                error!("Failed to send preference notification: {}", e);
            }
        }
    }
}
