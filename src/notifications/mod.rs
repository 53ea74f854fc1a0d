use anyhow::Result;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::audio::DeviceIdentity;
use crate::config::NotificationConfig;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for sending notifications - allows for testing without system calls
pub trait NotificationSender: Send + Sync {
    fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// Desktop notifications through `notify-send` (libnotify)
///
/// Inside a tokio runtime the process is spawned and reaped on a separate
/// task; `send` only reports spawn failures and later failures are logged.
#[derive(Debug, Clone)]
pub struct DesktopNotificationSender {
    program: PathBuf,
}

impl DesktopNotificationSender {
    pub fn new() -> Self {
        Self::with_program("notify-send")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(title: &str, body: &str) -> [String; 3] {
        [
            "--app-name=forced-audio-router".to_string(),
            title.to_string(),
            body.to_string(),
        ]
    }
}

impl Default for DesktopNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSender for DesktopNotificationSender {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        let args = Self::args(title, body);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let mut child = tokio::process::Command::new(&self.program)
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            let program = self.program.clone();
            runtime.spawn(async move {
                let timed = tokio::time::timeout(NOTIFY_TIMEOUT, async {
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_string(&mut stderr).await;
                    }
                    child.wait().await.map(|status| (status, stderr))
                })
                .await;

                match timed {
                    Ok(Ok((status, _))) if status.success() => {}
                    Ok(Ok((status, stderr))) => {
                        warn!("{} exited with {}: {}", program.display(), status, stderr.trim())
                    }
                    Ok(Err(e)) => warn!("Failed to wait for {}: {}", program.display(), e),
                    Err(_) => warn!(
                        "{} did not finish within {}s, giving up",
                        program.display(),
                        NOTIFY_TIMEOUT.as_secs()
                    ),
                }
            });
            return Ok(());
        }

        let output = std::process::Command::new(&self.program).args(&args).output()?;
        if output.status.success() {
            Ok(())
        } else {
            let error = String::from_utf8_lossy(&output.stderr);
            Err(anyhow::anyhow!("notify-send failed: {}", error.trim()))
        }
    }
}

/// Test notification sender that records instead of sending
#[cfg(any(test, feature = "test-mocks"))]
#[derive(Clone, Default)]
pub struct TestNotificationSender {
    pub sent_notifications: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

#[cfg(any(test, feature = "test-mocks"))]
impl TestNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_sent_notifications(&self) -> Vec<(String, String)> {
        self.sent_notifications.lock().unwrap().clone()
    }
}

#[cfg(any(test, feature = "test-mocks"))]
impl NotificationSender for TestNotificationSender {
    fn send(&self, title: &str, body: &str) -> Result<()> {
        debug!("Test notification: {} - {}", title, body);
        self.sent_notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Turns router events into user-visible notifications, filtered by config
pub struct NotificationManager<T: NotificationSender = DesktopNotificationSender> {
    show_switching_actions: bool,
    show_preference_changes: bool,
    sender: T,
}

impl<T: NotificationSender> NotificationManager<T> {
    pub fn new(config: &NotificationConfig, sender: T) -> Self {
        Self {
            show_switching_actions: config.show_switching_actions,
            show_preference_changes: config.show_preference_changes,
            sender,
        }
    }

    pub fn device_activated(&self, device: &DeviceIdentity) -> Result<()> {
        if !self.show_switching_actions {
            return Ok(());
        }

        self.sender.send(
            "Audio Routed",
            &format!("🎧 Audio switched to {}", device.name()),
        )?;
        info!("Sent switch notification for: {}", device);
        Ok(())
    }

    pub fn activation_failed(&self, device: &DeviceIdentity, error: &str) -> Result<()> {
        if !self.show_switching_actions {
            return Ok(());
        }

        self.sender.send(
            "Audio Routing Failed",
            &format!("Failed to switch to {}: {error}", device.name()),
        )?;
        warn!("Sent switch failed notification for: {}", device);
        Ok(())
    }

    pub fn routing_toggled(&self, enabled: bool) -> Result<()> {
        if !self.show_preference_changes {
            return Ok(());
        }

        self.sender.send(
            "Forced Audio Router",
            if enabled {
                "Routing enabled"
            } else {
                "Routing disabled"
            },
        )
    }

    pub fn priority_device_changed(&self, device: Option<&DeviceIdentity>) -> Result<()> {
        if !self.show_preference_changes {
            return Ok(());
        }

        let body = match device {
            Some(device) => format!("Priority device: {device}"),
            None => "Priority device cleared".to_string(),
        };
        self.sender.send("Forced Audio Router", &body)
    }

    #[cfg(any(test, feature = "test-mocks"))]
    pub fn sender(&self) -> &T {
        &self.sender
    }
}
