//! Telemetry collection: read the panel, upload, keep a local copy on failure.
//!
//! Layout:
//! - `sensor.rs`: readings and the time-of-day simulator
//! - `api.rs`: HTTP client for the monitoring backend
//! - `backup.rs`: daily JSON backup files

pub mod api;
pub mod backup;
pub mod sensor;

use crate::config::SystemSettings;
use crate::error::SolarError;
use crate::shutdown::requested;
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

pub use api::{ApiClient, UploadPayload};
pub use backup::BackupStore;
pub use sensor::{SensorReading, SensorSource, SimulatedSensors, sensors_for};

const ERROR_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Uploaded { record_id: Option<i64> },
    BackedUp { path: PathBuf },
}

pub struct Collector<S> {
    sensors: S,
    api: ApiClient,
    backup: BackupStore,
    system_id: u32,
    interval: Duration,
    error_pause: Duration,
}

impl<S: SensorSource> Collector<S> {
    pub fn new(sensors: S, api: ApiClient, backup: BackupStore, system: &SystemSettings) -> Self {
        Self {
            sensors,
            api,
            backup,
            system_id: system.system_id,
            interval: Duration::from_secs(system.collection_interval.max(1)),
            error_pause: ERROR_PAUSE,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_error_pause(mut self, pause: Duration) -> Self {
        self.error_pause = pause;
        self
    }

    /// Read once, upload, and back the reading up locally if the upload fails.
    pub async fn run_once(&mut self) -> Result<CycleOutcome, SolarError> {
        let reading = self.sensors.read(Local::now())?;
        info!(
            voltage = reading.voltage,
            current = reading.current,
            power = reading.power_output,
            temperature = reading.temperature,
            "sensor reading"
        );

        let payload = UploadPayload::from_reading(&reading, self.system_id);
        match self.api.upload(&payload).await {
            Ok(record_id) => {
                info!(power = reading.power_output, record_id = ?record_id, "reading uploaded");
                Ok(CycleOutcome::Uploaded { record_id })
            }
            Err(e) => {
                error!(error = %e, "upload failed");
                let path = self.backup.append(&reading)?;
                Ok(CycleOutcome::BackedUp { path })
            }
        }
    }

    /// Collect until `shutdown` flips to `true`. Returns the number of completed cycles.
    /// Dropping the sender does not stop collection.
    ///
    /// The backend must answer its status check before the first cycle.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<u64, SolarError> {
        self.api
            .check_status()
            .await
            .inspect_err(|e| error!(error = %e, "API unreachable; check network and api_url"))?;

        info!(
            system_id = self.system_id,
            interval = ?self.interval,
            "collector started"
        );

        let mut cycles = 0u64;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match self.run_once().await {
                Ok(_) => {
                    cycles += 1;
                    self.interval
                }
                Err(e) => {
                    error!(error = %e, "collection cycle failed");
                    self.error_pause
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = requested(&mut shutdown) => break,
            }
        }

        info!(cycles, "collector stopped");
        Ok(cycles)
    }
}
