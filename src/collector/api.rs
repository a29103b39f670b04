use super::sensor::SensorReading;
use crate::error::{IsRetryable, SolarError};
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `POST /realtime-data/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadPayload {
    pub system_id: u32,
    pub voltage: f64,
    pub current: f64,
    pub power_output: f64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light_intensity: Option<f64>,
    pub panel_azimuth: Option<f64>,
    pub panel_tilt: Option<f64>,
    pub notes: String,
}

impl UploadPayload {
    pub fn from_reading(reading: &SensorReading, system_id: u32) -> Self {
        Self {
            system_id,
            voltage: reading.voltage,
            current: reading.current,
            power_output: reading.power_output,
            temperature: Some(reading.temperature),
            humidity: Some(reading.humidity),
            light_intensity: Some(reading.light_intensity),
            panel_azimuth: Some(reading.panel_azimuth),
            panel_tilt: Some(reading.panel_tilt),
            notes: format!(
                "device: {}, status: {}",
                reading.device_id, reading.sensor_status
            ),
        }
    }
}

/// Client for the monitoring backend's real-time data endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    status_url: Url,
    upload_url: Url,
    retry_min_delay: Duration,
    retry_max_times: usize,
}

impl ApiClient {
    pub fn new(api_url: &str) -> Result<Self, SolarError> {
        let base = api_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .user_agent(concat!("solar-collector/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            status_url: Url::parse(&format!("{base}/realtime-data/status/"))?,
            upload_url: Url::parse(&format!("{base}/realtime-data/"))?,
            retry_min_delay: Duration::from_secs(1),
            retry_max_times: 3,
        })
    }

    /// Override the upload retry schedule.
    pub fn with_retry(mut self, min_delay: Duration, max_times: usize) -> Self {
        self.retry_min_delay = min_delay;
        self.retry_max_times = max_times;
        self
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry_min_delay)
            .with_max_delay(self.retry_min_delay * 3)
            .with_max_times(self.retry_max_times)
            .with_jitter()
    }

    /// `GET /realtime-data/status/`; only a 200 counts as reachable.
    pub async fn check_status(&self) -> Result<(), SolarError> {
        let resp = self
            .client
            .get(self.status_url.clone())
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(SolarError::UnexpectedStatus { status, body });
        }
        debug!(url = %self.status_url, "API status check passed");
        Ok(())
    }

    /// Upload one reading. Returns the `record_id` the backend assigned, if any.
    pub async fn upload(&self, payload: &UploadPayload) -> Result<Option<i64>, SolarError> {
        (|| async { self.try_upload(payload).await })
            .retry(self.retry_policy())
            .when(|e: &SolarError| e.is_retryable())
            .notify(|err: &SolarError, dur: Duration| {
                warn!("upload retrying after error {}, sleeping {:?}", err, dur);
            })
            .await
    }

    async fn try_upload(&self, payload: &UploadPayload) -> Result<Option<i64>, SolarError> {
        let resp = self
            .client
            .post(self.upload_url.clone())
            .timeout(UPLOAD_TIMEOUT)
            .json(payload)
            .send()
            .await?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(SolarError::UnexpectedStatus { status, body });
        }
        let body: Value = resp.json().await?;
        Ok(body.get("record_id").and_then(Value::as_i64))
    }
}
