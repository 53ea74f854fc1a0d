use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const UNIT_NAME: &str = "forced-audio-router.service";

/// Installs the router as a systemd user service
pub struct ServiceInstaller {
    unit_path: PathBuf,
}

impl ServiceInstaller {
    pub fn new(unit_path: PathBuf) -> Self {
        Self { unit_path }
    }

    /// Installer targeting `~/.config/systemd/user`
    pub fn new_production() -> Result<Self> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))?;
        Ok(Self::new(config_dir.join("systemd/user").join(UNIT_NAME)))
    }

    pub fn unit_path(&self) -> &Path {
        &self.unit_path
    }

    /// Write the unit file for `exe`, passing `config_path` through when given
    pub fn install(&self, exe: &Path, config_path: Option<&Path>) -> Result<()> {
        info!("Installing systemd user service");

        if let Some(parent) = self.unit_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        std::fs::write(&self.unit_path, Self::unit_contents(exe, config_path))
            .with_context(|| format!("Failed to write {}", self.unit_path.display()))?;

        info!("Service unit installed to: {}", self.unit_path.display());
        info!(
            "To start the service, run: systemctl --user daemon-reload && systemctl --user enable --now {}",
            UNIT_NAME
        );
        Ok(())
    }

    /// Remove the unit file. Returns false when nothing was installed.
    pub fn uninstall(&self) -> Result<bool> {
        info!("Uninstalling systemd user service");

        if !self.unit_path.exists() {
            warn!("Service unit not found at: {}", self.unit_path.display());
            return Ok(false);
        }

        std::fs::remove_file(&self.unit_path)
            .with_context(|| format!("Failed to remove {}", self.unit_path.display()))?;
        info!("Service unit removed from: {}", self.unit_path.display());
        info!(
            "To stop the running service, run: systemctl --user disable --now {}",
            UNIT_NAME
        );
        Ok(true)
    }

    pub fn unit_contents(exe: &Path, config_path: Option<&Path>) -> String {
        let mut exec_start = format!("{} daemon", exe.display());
        if let Some(config_path) = config_path {
            exec_start = format!("{} --config {} daemon", exe.display(), config_path.display());
        }

        format!(
            "[Unit]
Description=Forced audio router for Bluetooth audio devices
After=pipewire-pulse.service pulseaudio.service bluetooth.target

[Service]
Type=simple
ExecStart={exec_start}
Restart=on-failure
RestartSec=5
Environment=RUST_LOG=info

[Install]
WantedBy=default.target
"
        )
    }
}
