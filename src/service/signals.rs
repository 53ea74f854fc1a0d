use anyhow::Result;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Control requests delivered to the router loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    /// SIGTERM / SIGINT
    Shutdown,
    /// SIGHUP: re-read preferences from disk
    Reload,
}

/// Translates process signals into [`SignalType`] messages
pub struct SignalHandler {
    sender: mpsc::UnboundedSender<SignalType>,
}

impl SignalHandler {
    pub fn new(sender: mpsc::UnboundedSender<SignalType>) -> Self {
        Self { sender }
    }

    /// Create a handler and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SignalType>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Register the signal hooks and forward signals from a background task.
    /// The task ends after the first shutdown signal.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP])?;
        let handle = signals.handle();
        info!("Listening for SIGTERM, SIGINT, SIGHUP");

        Ok(tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                let message = match signal {
                    SIGTERM | SIGINT => SignalType::Shutdown,
                    SIGHUP => SignalType::Reload,
                    other => {
                        warn!("Received unexpected signal: {}", other);
                        continue;
                    }
                };

                info!("Received signal {} ({:?})", signal, message);
                if self.sender.send(message).is_err() {
                    warn!("Router loop is gone, dropping {:?}", message);
                    break;
                }
                if message == SignalType::Shutdown {
                    break;
                }
            }
            handle.close();
        }))
    }
}
