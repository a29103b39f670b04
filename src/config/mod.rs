//! Configuration.
//!
//! Layout:
//! - `settings.rs`: the unified `system_config.json` shared by controller, launcher and collector
//! - `env.rs`: per-process configuration extracted once from the environment

pub mod env;
pub mod settings;

pub use env::{EntrypointConfig, LauncherConfig, split_command};
pub use settings::{
    AlgorithmSettings, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, DeviceInfo, HardwareSettings,
    LoadOutcome, LocationSettings, Section, Settings, SettingsStore, SystemSettings,
};
