use crate::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, DeviceInfo, SettingsStore};
use crate::error::SolarError;
use crate::mode::ControllerMode;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Parser, Clone)]
#[command(name = "solar-controller", version, about = "Solar tracking main controller")]
pub struct ControllerArgs {
    /// Run mode: both (comparison), anfis (smart tracking only), traditional
    #[arg(long, value_enum, default_value_t = ControllerMode::Both)]
    pub mode: ControllerMode,

    /// Settings file name, resolved inside the config directory
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory holding the settings file
    #[arg(long, env = "SOLAR_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,
}

/// Which tracking strategies a mode brings up.
pub fn strategies(mode: ControllerMode) -> Vec<&'static str> {
    let mut enabled = Vec::new();
    if mode.runs_anfis() {
        enabled.push("anfis");
    }
    if mode.runs_traditional() {
        enabled.push("traditional");
    }
    enabled
}

pub fn render_banner(mode: ControllerMode, config: &str, device: &DeviceInfo) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    vec![
        rule.clone(),
        "Solar Tracking Main Controller".to_string(),
        rule.clone(),
        format!("Mode: {mode}"),
        format!("Config file: {config}"),
        format!(
            "Device: {} (system {}, {})",
            device.device_id, device.system_id, device.system_name
        ),
        format!("Strategies: {}", strategies(mode).join(", ")),
        "System initialized.".to_string(),
        rule,
    ]
}

pub fn run(args: &ControllerArgs, out: &mut impl Write) -> Result<(), SolarError> {
    let (store, outcome) = SettingsStore::open_and_load(&args.config_dir, &args.config)?;
    let device = store.device_info();
    info!(
        mode = %args.mode,
        device_id = %device.device_id,
        settings = ?outcome,
        simulation = store.is_simulation_mode(),
        "controller starting"
    );

    for line in render_banner(args.mode, &args.config.display().to_string(), &device) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
