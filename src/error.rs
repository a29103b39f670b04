use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SolarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("Invalid setting {section}.{key}: {reason}")]
    InvalidSetting {
        section: &'static str,
        key: String,
        reason: String,
    },

    #[error("API responded with status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Timed out after {waited:?} waiting for {host}:{port}")]
    WaitTimeout {
        host: String,
        port: u16,
        waited: Duration,
    },

    #[error("Wait for {host}:{port} was cancelled")]
    WaitCancelled { host: String, port: u16 },

    #[error("Interrupted during {stage}")]
    Interrupted { stage: String },

    #[error("Migration step `{step}` failed: {status}")]
    MigrationFailed { step: String, status: String },

    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command line is empty")]
    EmptyCommand,

    #[error("Invalid command line: {0}")]
    CommandLine(#[from] shell_words::ParseError),
}

impl SolarError {
    /// True when a shutdown request, not a failure, ended the operation.
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            SolarError::WaitCancelled { .. } | SolarError::Interrupted { .. }
        )
    }
}

impl From<figment::Error> for SolarError {
    fn from(e: figment::Error) -> Self {
        SolarError::Config(Box::new(e))
    }
}

/// Errors worth another attempt under a backoff policy.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for SolarError {
    fn is_retryable(&self) -> bool {
        match self {
            SolarError::Io(_) => true,
            SolarError::Reqwest(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            SolarError::UnexpectedStatus { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
