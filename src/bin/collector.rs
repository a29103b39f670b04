use clap::Parser;
use mimalloc::MiMalloc;
use solar_tracker::SolarError;
use solar_tracker::collector::{ApiClient, BackupStore, Collector, sensors_for};
use solar_tracker::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, SettingsStore};
use solar_tracker::shutdown;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "solar-collector",
    version,
    about = "Collect panel readings and upload them to the monitoring API"
)]
struct Cli {
    /// Directory holding the settings file
    #[arg(long, env = "SOLAR_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Settings file name, resolved inside the config directory
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Where readings that failed to upload are kept
    #[arg(long, env = "SOLAR_BACKUP_DIR", default_value = ".")]
    backup_dir: PathBuf,

    /// Run a single collection cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    solar_tracker::logging::init("info");

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "collector stopped with error");
        return Err(e.into());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), SolarError> {
    let (store, _) = SettingsStore::open_and_load(&cli.config_dir, &cli.config)?;
    let system = store.system();
    info!(
        api_url = %system.api_url,
        system_id = system.system_id,
        device_id = %system.device_id,
        interval_secs = system.collection_interval,
        simulation = system.simulation_mode,
        "collector configuration"
    );

    let api = ApiClient::new(&system.api_url)?;
    let backup = BackupStore::new(&cli.backup_dir);
    let mut collector = Collector::new(sensors_for(system), api, backup, system);

    if cli.once {
        let outcome = collector.run_once().await?;
        info!(?outcome, "single cycle finished");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown::forward_signals(shutdown_tx)?;
    collector.run(shutdown_rx).await?;
    Ok(())
}
