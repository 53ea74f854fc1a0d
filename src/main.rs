use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info, warn};

use forced_audio_router::config::{ConfigLoader, PreferenceStore, Preferences};
use forced_audio_router::logging::{self, LoggingConfig};
use forced_audio_router::notifications::{DesktopNotificationSender, NotificationManager};
use forced_audio_router::service::{RouterService, ServiceInstaller, SignalHandler};
use forced_audio_router::system::{
    DeviceScanner, PulseAudioSystem, RouteEventSource, StandardFileSystem,
};
use forced_audio_router::ui::{DevicePicker, RefreshOutcome};

const LOG_RETENTION_DAYS: u64 = 14;

#[derive(Parser)]
#[command(name = "forced-audio-router")]
#[command(about = "Keeps audio on your preferred Bluetooth device whenever it is connected")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the router in the foreground (default)
    Daemon,
    /// Show preferences and connected Bluetooth audio devices
    Status,
    /// Turn forced routing on
    Enable,
    /// Turn forced routing off
    Disable,
    /// List devices that can be chosen as the priority device
    Scan,
    /// Choose the priority device from the scan list
    Select {
        /// Position in the `scan` list
        #[arg(short, long, conflicts_with = "address", required_unless_present = "address")]
        index: Option<usize>,
        /// Hardware address of the device
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Forget the priority device
    Clear,
    /// Validate the configuration file
    CheckConfig,
    /// Install a systemd user service that starts the router at login
    InstallService,
    /// Remove the systemd user service
    UninstallService,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Daemon);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => ConfigLoader::default_config_path()?,
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        ConfigLoader::new_production(config_path.clone())
            .load_config()
            .map(|config| logging::parse_level(&config.general.log_level))
            .unwrap_or(Level::INFO)
    };

    let is_daemon = matches!(command, Commands::Daemon);
    let (_guard, log_dir) = logging::initialize_logging(LoggingConfig {
        level,
        file_output: is_daemon,
        ..LoggingConfig::default()
    })?;

    if let Some(log_dir) = log_dir {
        info!("Writing logs to {}", log_dir.display());
        if let Err(e) = logging::cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
            warn!("Failed to clean up old logs: {:#}", e);
        }
    }

    match command {
        Commands::Daemon => run_daemon(&config_path).await,
        Commands::Status => show_status(&config_path).await,
        Commands::Enable => set_enabled(&config_path, true),
        Commands::Disable => set_enabled(&config_path, false),
        Commands::Scan => scan_devices(&config_path).await,
        Commands::Select { index, address } => {
            select_device(&config_path, index, address.as_deref()).await
        }
        Commands::Clear => clear_priority_device(&config_path),
        Commands::CheckConfig => check_config(&config_path),
        Commands::InstallService => install_service(cli.config.as_deref()),
        Commands::UninstallService => uninstall_service(),
    }
}

fn open_store(config_path: &Path) -> Result<Arc<PreferenceStore<StandardFileSystem>>> {
    let loader = ConfigLoader::new_production(config_path.to_path_buf());
    Ok(Arc::new(PreferenceStore::open(loader)?))
}

fn open_picker(
    config_path: &Path,
) -> Result<DevicePicker<PulseAudioSystem, StandardFileSystem>> {
    let store = open_store(config_path)?;
    let audio = PulseAudioSystem::new(&store.config().platform);
    Ok(DevicePicker::new(audio, store))
}

async fn run_daemon(config_path: &Path) -> Result<()> {
    info!("Starting forced audio router");

    let store = open_store(config_path)?;
    let config = store.config();

    let audio = Arc::new(PulseAudioSystem::new(&config.platform));
    let route_events = audio
        .subscribe_route_events()
        .context("Failed to subscribe to route changes")?;

    let (signal_handler, control) = SignalHandler::channel();
    let signal_task = signal_handler.spawn()?;

    let notifications =
        NotificationManager::new(&config.notifications, DesktopNotificationSender::new());
    let service = RouterService::new(Arc::clone(&audio), audio, store, notifications);

    let result = service.run(route_events, control).await;
    signal_task.abort();
    result
}

async fn show_status(config_path: &Path) -> Result<()> {
    let store = open_store(config_path)?;
    let preferences = store.snapshot();

    println!("Configuration: {}", store.config_path().display());
    print_preferences(&preferences);

    let audio = PulseAudioSystem::new(&store.config().platform);
    match audio.scan().await {
        Ok(connected) if connected.is_empty() => println!("Connected devices: none"),
        Ok(connected) => {
            println!("Connected devices:");
            for info in connected {
                println!("  {}", info);
            }
        }
        Err(e) => println!("Connected devices: unknown ({e})"),
    }

    Ok(())
}

fn set_enabled(config_path: &Path, enabled: bool) -> Result<()> {
    let store = open_store(config_path)?;
    store.set_enabled(enabled)?;
    println!("Routing {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

async fn scan_devices(config_path: &Path) -> Result<()> {
    let picker = open_picker(config_path)?;

    match picker.refresh().await {
        RefreshOutcome::Placeholder(_) => {
            println!("Audio tooling unavailable, showing placeholder devices")
        }
        RefreshOutcome::Retained(e) => return Err(e).context("Device scan failed"),
        RefreshOutcome::Updated(_) | RefreshOutcome::Superseded => {}
    }

    let rows = picker.rows();
    if rows.is_empty() {
        println!("No Bluetooth audio devices found");
        return Ok(());
    }

    println!("Devices:");
    for (index, row) in rows.iter().enumerate() {
        let marker = if row.is_priority { "*" } else { " " };
        println!("  {marker} {index}. {}", row.device);
    }
    println!("(* = priority device)");
    Ok(())
}

async fn select_device(
    config_path: &Path,
    index: Option<usize>,
    address: Option<&str>,
) -> Result<()> {
    let picker = open_picker(config_path)?;
    if let RefreshOutcome::Retained(e) = picker.refresh().await {
        return Err(e).context("Device scan failed");
    }

    match (index, address) {
        (_, Some(address)) => picker.select_address(address)?,
        (Some(index), None) => picker.select(index)?,
        (None, None) => anyhow::bail!("either --index or --address is required"),
    };

    if let Some(device) = picker.save()? {
        println!("Priority device set to {device}");
    }
    Ok(())
}

fn clear_priority_device(config_path: &Path) -> Result<()> {
    let store = open_store(config_path)?;
    store.set_priority_device(None)?;
    println!("Priority device cleared");
    Ok(())
}

fn check_config(config_path: &Path) -> Result<()> {
    info!("Validating configuration");

    let loader = ConfigLoader::new_production(config_path.to_path_buf());
    let config = loader.load_config()?;
    let preferences = Preferences::from_config(&config)
        .with_context(|| format!("Invalid routing preferences in {}", config_path.display()))?;

    println!("Configuration validation:");
    println!("  ✓ {} parsed successfully", config_path.display());
    print_preferences(&preferences);
    println!("  Check interval: {} ms", config.general.check_interval_ms);
    println!("  pactl: {}", config.platform.pactl_path.display());
    println!("  bluetoothctl: {}", config.platform.bluetoothctl_path.display());
    Ok(())
}

fn print_preferences(preferences: &Preferences) {
    println!(
        "  Routing: {}",
        if preferences.enabled { "enabled" } else { "disabled" }
    );
    match &preferences.priority_device {
        Some(device) => println!("  Priority device: {device}"),
        None => println!("  Priority device: none"),
    }
}

fn install_service(config_path: Option<&Path>) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let installer = ServiceInstaller::new_production()?;
    installer.install(&exe, config_path)?;
    println!("Service unit written to {}", installer.unit_path().display());
    println!("Enable it with: systemctl --user enable --now forced-audio-router.service");
    Ok(())
}

fn uninstall_service() -> Result<()> {
    let installer = ServiceInstaller::new_production()?;
    if installer.uninstall()? {
        println!("Service unit removed from {}", installer.unit_path().display());
    } else {
        println!("No service unit installed");
    }
    Ok(())
}
