use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, error, info, warn};

const RESTART_DELAY: Duration = Duration::from_secs(2);

/// A change in the set of available or active audio routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEvent {
    /// A route (sink or card) appeared.
    Added,
    /// A route disappeared.
    Removed,
    /// A route's properties changed.
    Changed,
    /// The active route changed (new default sink).
    Selected,
}

impl RouteEvent {
    /// Map one line of `pactl subscribe` output, e.g. `Event 'new' on sink #81`.
    ///
    /// Stream-level events (sink-input, source-output, client) do not change
    /// routing and yield `None`.
    pub fn from_subscribe_line(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix("Event '")?;
        let (kind, rest) = rest.split_once('\'')?;
        let facility = rest
            .trim()
            .strip_prefix("on ")?
            .split_whitespace()
            .next()?;

        match (facility, kind) {
            ("server", "change") => Some(RouteEvent::Selected),
            ("sink" | "card", "new") => Some(RouteEvent::Added),
            ("sink" | "card", "remove") => Some(RouteEvent::Removed),
            ("sink" | "card", "change") => Some(RouteEvent::Changed),
            _ => None,
        }
    }
}

/// Follows `pactl subscribe` and forwards route events to a channel.
#[derive(Debug, Clone)]
pub struct RouteChangeListener {
    program: PathBuf,
}

impl RouteChangeListener {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Start listening in a background task. The task ends when the receiver
    /// is dropped or `pactl` cannot be started at all.
    pub fn spawn(&self, events: mpsc::UnboundedSender<RouteEvent>) -> JoinHandle<()> {
        let program = self.program.clone();

        tokio::spawn(async move {
            info!("Listening for route changes via {} subscribe", program.display());

            while !events.is_closed() {
                let mut child = match Command::new(&program)
                    .arg("subscribe")
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                {
                    Ok(child) => child,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        error!("{} not found, route changes will not be observed", program.display());
                        return;
                    }
                    Err(e) => {
                        error!("Failed to start {} subscribe: {}", program.display(), e);
                        tokio::time::sleep(RESTART_DELAY).await;
                        continue;
                    }
                };

                let Some(stdout) = child.stdout.take() else {
                    error!("pactl subscribe has no stdout");
                    return;
                };

                let mut lines = LinesStream::new(BufReader::new(stdout).lines());
                while let Some(line) = lines.next().await {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!("Error reading pactl subscribe output: {}", e);
                            break;
                        }
                    };

                    if let Some(event) = RouteEvent::from_subscribe_line(&line) {
                        debug!("Route event {:?} from '{}'", event, line);
                        if events.send(event).is_err() {
                            debug!("Route event receiver dropped, stopping listener");
                            return;
                        }
                    }
                }

                let _ = child.kill().await;
                warn!(
                    "pactl subscribe exited, restarting in {}s",
                    RESTART_DELAY.as_secs()
                );
                tokio::time::sleep(RESTART_DELAY).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_events() {
        assert_eq!(
            RouteEvent::from_subscribe_line("Event 'new' on sink #81"),
            Some(RouteEvent::Added)
        );
        assert_eq!(
            RouteEvent::from_subscribe_line("Event 'remove' on sink #81"),
            Some(RouteEvent::Removed)
        );
        assert_eq!(
            RouteEvent::from_subscribe_line("Event 'change' on card #3"),
            Some(RouteEvent::Changed)
        );
    }

    #[test]
    fn test_server_change_is_selection() {
        assert_eq!(
            RouteEvent::from_subscribe_line("Event 'change' on server #-1"),
            Some(RouteEvent::Selected)
        );
    }

    #[test]
    fn test_stream_events_are_ignored() {
        assert_eq!(
            RouteEvent::from_subscribe_line("Event 'change' on sink-input #112"),
            None
        );
        assert_eq!(
            RouteEvent::from_subscribe_line("Event 'new' on client #40"),
            None
        );
        assert_eq!(RouteEvent::from_subscribe_line("garbage"), None);
    }
}
