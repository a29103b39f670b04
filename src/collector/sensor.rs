use crate::config::SystemSettings;
use crate::error::SolarError;
use chrono::{DateTime, Local, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

const PANEL_AZIMUTH: f64 = 180.0;
const PANEL_TILT: f64 = 20.0;

/// One sample of panel output and ambient conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub voltage: f64,
    pub current: f64,
    pub power_output: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
    pub panel_azimuth: f64,
    pub panel_tilt: f64,
    pub timestamp: String,
    pub device_id: String,
    pub sensor_status: String,
}

pub trait SensorSource: Send {
    fn read(&mut self, now: DateTime<Local>) -> Result<SensorReading, SolarError>;
}

/// Output scale for a local hour, `None` at night.
pub fn daylight_factor(hour: u32) -> Option<f64> {
    if !(6..=18).contains(&hour) {
        return None;
    }
    let factor = if !(8..=16).contains(&hour) {
        0.3
    } else if (10..=14).contains(&hour) {
        1.0
    } else {
        0.7
    };
    Some(factor)
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Plausible panel readings driven by the time of day.
pub struct SimulatedSensors<R = StdRng> {
    rng: R,
    device_id: String,
}

impl SimulatedSensors<StdRng> {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self::with_rng(device_id, StdRng::from_entropy())
    }

    pub fn seeded(device_id: impl Into<String>, seed: u64) -> Self {
        Self::with_rng(device_id, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SimulatedSensors<R> {
    pub fn with_rng(device_id: impl Into<String>, rng: R) -> Self {
        Self {
            rng,
            device_id: device_id.into(),
        }
    }
}

impl<R: Rng + Send> SensorSource for SimulatedSensors<R> {
    fn read(&mut self, now: DateTime<Local>) -> Result<SensorReading, SolarError> {
        let rng = &mut self.rng;
        let (voltage, current, temperature, humidity) = match daylight_factor(now.hour()) {
            Some(factor) => (
                20.0 * factor + rng.gen_range(-2.0..2.0),
                3.0 * factor + rng.gen_range(-0.5..0.5),
                rng.gen_range(25.0..35.0),
                rng.gen_range(50.0..80.0),
            ),
            None => (
                rng.gen_range(0.0..0.5),
                rng.gen_range(0.0..0.1),
                rng.gen_range(18.0..25.0),
                rng.gen_range(60.0..90.0),
            ),
        };

        let voltage: f64 = f64::max(voltage, 0.0);
        let current: f64 = f64::max(current, 0.0);
        let power = voltage * current;
        let light_intensity = if power > 0.0 { round_to(power * 50.0, 1) } else { 0.0 };

        Ok(SensorReading {
            voltage: round_to(voltage, 2),
            current: round_to(current, 3),
            power_output: round_to(power, 2),
            temperature: round_to(temperature, 1),
            humidity: round_to(humidity, 1),
            light_intensity,
            panel_azimuth: PANEL_AZIMUTH,
            panel_tilt: PANEL_TILT,
            timestamp: now.to_rfc3339(),
            device_id: self.device_id.clone(),
            sensor_status: "normal".to_string(),
        })
    }
}

/// Sensor backend for the configured mode.
///
/// There is no hardware backend; outside simulation mode this still simulates.
pub fn sensors_for(system: &SystemSettings) -> SimulatedSensors {
    if !system.simulation_mode {
        warn!(device_id = %system.device_id, "hardware sensors unavailable; using simulated readings");
    }
    SimulatedSensors::new(system.device_id.clone())
}
