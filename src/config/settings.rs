use crate::error::SolarError;
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_DIR: &str = "config";
pub const DEFAULT_CONFIG_FILE: &str = "system_config.json";

const SETTINGS_VERSION: &str = "1.0";
const SETTINGS_DESCRIPTION: &str = "Solar tracking system unified configuration";

/// GPIO wiring and mechanical limits of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareSettings {
    pub azimuth_servo_pin: u8,
    pub tilt_servo_pin: u8,
    pub light_sensor_east: u8,
    pub light_sensor_west: u8,
    pub light_sensor_south: u8,
    pub light_sensor_north: u8,
    pub azimuth_min: f64,
    pub azimuth_max: f64,
    pub tilt_min: f64,
    pub tilt_max: f64,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            azimuth_servo_pin: 18,
            tilt_servo_pin: 19,
            light_sensor_east: 2,
            light_sensor_west: 3,
            light_sensor_south: 4,
            light_sensor_north: 17,
            azimuth_min: 135.0,
            azimuth_max: 225.0,
            tilt_min: 0.0,
            tilt_max: 45.0,
        }
    }
}

/// Identity, upload target and run flags of this device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemSettings {
    pub system_name: String,
    pub system_id: u32,
    pub device_id: String,
    pub api_url: String,
    /// Seconds between two collection cycles.
    pub collection_interval: u64,
    pub simulation_mode: bool,
    pub debug_mode: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            system_name: "Solar Tracking System".to_string(),
            system_id: 1,
            device_id: "raspberry_pi_001".to_string(),
            api_url: "http://localhost:8000/api".to_string(),
            collection_interval: 60,
            simulation_mode: false,
            debug_mode: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlgorithmSettings {
    pub anfis_enabled: bool,
    pub learning_rate: f64,
    pub max_iterations: u32,
    pub light_threshold: f64,
    pub noise_level: f64,
    pub power_expectation_tolerance: f64,
    pub movement_worthiness_threshold: f64,
    pub fine_tune_improvement_threshold: f64,
}

impl Default for AlgorithmSettings {
    fn default() -> Self {
        Self {
            anfis_enabled: true,
            learning_rate: 0.01,
            max_iterations: 1000,
            light_threshold: 50.0,
            noise_level: 0.1,
            power_expectation_tolerance: 0.95,
            movement_worthiness_threshold: 2.0,
            fine_tune_improvement_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    /// Metres above sea level.
    pub elevation: f64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            latitude: 24.8138,
            longitude: 120.9675,
            timezone: "Asia/Taipei".to_string(),
            elevation: 50.0,
        }
    }
}

/// All four sections. A section missing from the file keeps its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hardware: HardwareSettings,
    pub system: SystemSettings,
    pub algorithm: AlgorithmSettings,
    pub location: LocationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsMetadata {
    created_at: String,
    version: String,
    description: String,
}

/// On-disk layout: an informational `metadata` block next to the sections.
#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<SettingsMetadata>,
    #[serde(flatten)]
    settings: Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hardware,
    System,
    Algorithm,
    Location,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Hardware => "hardware",
            Section::System => "system",
            Section::Algorithm => "algorithm",
            Section::Location => "location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The file was absent and has been written with defaults.
    CreatedDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub system_name: String,
    pub system_id: u32,
    pub device_id: String,
    pub location: DeviceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

/// Settings bound to the directory they are loaded from and saved to.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Bind to `dir`, creating it when needed. Starts out with defaults.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SolarError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            settings: Settings::default(),
        })
    }

    /// Open `dir` and load `file` from it in one step.
    pub fn open_and_load(
        dir: impl Into<PathBuf>,
        file: impl AsRef<Path>,
    ) -> Result<(Self, LoadOutcome), SolarError> {
        let mut store = Self::open(dir)?;
        let outcome = store.load(file)?;
        Ok((store, outcome))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, file: impl AsRef<Path>) -> PathBuf {
        self.dir.join(file)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hardware(&self) -> &HardwareSettings {
        &self.settings.hardware
    }

    pub fn system(&self) -> &SystemSettings {
        &self.settings.system
    }

    pub fn algorithm(&self) -> &AlgorithmSettings {
        &self.settings.algorithm
    }

    pub fn location(&self) -> &LocationSettings {
        &self.settings.location
    }

    pub fn load(&mut self, file: impl AsRef<Path>) -> Result<LoadOutcome, SolarError> {
        let path = self.path_of(file.as_ref());
        if !path.exists() {
            warn!(path = %path.display(), "settings file not found; writing defaults");
            self.settings = Settings::default();
            self.save(file)?;
            return Ok(LoadOutcome::CreatedDefault);
        }

        let contents = fs::read_to_string(&path)?;
        let parsed: SettingsFile = serde_json::from_str(&contents)?;
        self.settings = parsed.settings;
        info!(path = %path.display(), "settings loaded");
        Ok(LoadOutcome::Loaded)
    }

    pub fn save(&self, file: impl AsRef<Path>) -> Result<PathBuf, SolarError> {
        let path = self.path_of(file);
        let document = SettingsFile {
            metadata: Some(SettingsMetadata {
                created_at: Local::now().to_rfc3339(),
                version: SETTINGS_VERSION.to_string(),
                description: SETTINGS_DESCRIPTION.to_string(),
            }),
            settings: self.settings.clone(),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut ser)?;
        buf.push(b'\n');
        fs::write(&path, buf)?;

        info!(path = %path.display(), "settings saved");
        Ok(path)
    }

    /// Set one field by name. Returns `Ok(false)` when the section has no such field.
    pub fn update(&mut self, section: Section, key: &str, value: Value) -> Result<bool, SolarError> {
        match section {
            Section::Hardware => patch_section(&mut self.settings.hardware, section, key, value),
            Section::System => patch_section(&mut self.settings.system, section, key, value),
            Section::Algorithm => patch_section(&mut self.settings.algorithm, section, key, value),
            Section::Location => patch_section(&mut self.settings.location, section, key, value),
        }
    }

    pub fn is_simulation_mode(&self) -> bool {
        self.settings.system.simulation_mode
    }

    pub fn is_debug_mode(&self) -> bool {
        self.settings.system.debug_mode
    }

    pub fn api_url(&self) -> &str {
        &self.settings.system.api_url
    }

    pub fn device_info(&self) -> DeviceInfo {
        let system = &self.settings.system;
        let location = &self.settings.location;
        DeviceInfo {
            system_name: system.system_name.clone(),
            system_id: system.system_id,
            device_id: system.device_id.clone(),
            location: DeviceLocation {
                latitude: location.latitude,
                longitude: location.longitude,
                timezone: location.timezone.clone(),
            },
        }
    }
}

fn patch_section<T>(
    target: &mut T,
    section: Section,
    key: &str,
    value: Value,
) -> Result<bool, SolarError>
where
    T: Serialize + DeserializeOwned,
{
    let mut current = serde_json::to_value(&*target)?;
    let Some(slot) = current.as_object_mut().and_then(|fields| fields.get_mut(key)) else {
        debug!(section = section.name(), key, "ignoring unknown setting");
        return Ok(false);
    };

    let shown = value.to_string();
    *slot = value;
    *target = serde_json::from_value(current).map_err(|e| SolarError::InvalidSetting {
        section: section.name(),
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    info!(section = section.name(), key, value = %shown, "setting updated");
    Ok(true)
}
