//! Process configuration read once at startup.
//!
//! Each binary extracts one of these structs through `figment` (defaults first,
//! then environment) and hands it down by reference. Nothing below `main` reads
//! the environment on its own.

use crate::config::settings::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE};
use crate::error::SolarError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const CONTROLLER_BIN: &str = "solar-controller";

/// Split a command line into program and arguments.
///
/// Follows POSIX shell quoting, so `"/opt/solar tools/ctl" --verbose` names a
/// program whose path contains a space.
pub fn split_command(line: &str) -> Result<(String, Vec<String>), SolarError> {
    let mut parts = shell_words::split(line)?.into_iter();
    let program = parts.next().ok_or(SolarError::EmptyCommand)?;
    Ok((program, parts.collect()))
}

/// Merge the raw value of `var` under `key`.
///
/// Figment parses environment values and would strip a leading pair of quotes,
/// so command lines are taken verbatim and left to [`split_command`].
fn verbatim(figment: Figment, var: &str, key: &str) -> Figment {
    match std::env::var(var) {
        Ok(line) => figment.merge(Serialized::default(key, line)),
        Err(_) => figment,
    }
}

/// Settings for the interactive launcher (`SOLAR_*`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Controller command line. Defaults to the sibling `solar-controller` binary.
    pub controller: Option<String>,
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            controller: None,
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

impl LauncherConfig {
    pub fn figment() -> Figment {
        let figment =
            Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed("SOLAR_"));
        verbatim(figment, "SOLAR_CONTROLLER", "controller")
    }

    pub fn from_env() -> Result<Self, SolarError> {
        Ok(Self::figment().extract()?)
    }

    /// Program and leading arguments used to start the controller.
    pub fn controller_command(&self) -> Result<(String, Vec<String>), SolarError> {
        match self.controller.as_deref() {
            Some(line) => split_command(line),
            None => {
                let exe = std::env::current_exe()?;
                let sibling = exe.with_file_name(format!(
                    "{CONTROLLER_BIN}{}",
                    std::env::consts::EXE_SUFFIX
                ));
                Ok((sibling.display().to_string(), Vec::new()))
            }
        }
    }
}

/// Settings for the container entrypoint.
///
/// `DATABASE`, `SQL_HOST` and `SQL_PORT` are shared with the backend service;
/// the remaining knobs live under `ENTRYPOINT_*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrypointConfig {
    /// Database kind flag. Only the `wait_for` value triggers the port wait.
    pub database: Option<String>,
    pub sql_host: String,
    pub sql_port: u16,
    pub wait_for: String,
    /// Zero waits forever.
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub manage_command: String,
    pub strict_migrations: bool,
}

impl Default for EntrypointConfig {
    fn default() -> Self {
        Self {
            database: None,
            sql_host: "localhost".to_string(),
            sql_port: 3306,
            wait_for: "mysql".to_string(),
            wait_timeout_secs: 60,
            poll_interval_ms: 100,
            max_poll_interval_ms: 2000,
            manage_command: "python manage.py".to_string(),
            strict_migrations: false,
        }
    }
}

impl EntrypointConfig {
    pub fn figment() -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::raw().only(&["DATABASE", "SQL_HOST", "SQL_PORT"]))
            .merge(Env::prefixed("ENTRYPOINT_"));
        verbatim(figment, "ENTRYPOINT_MANAGE_COMMAND", "manage_command")
    }

    pub fn from_env() -> Result<Self, SolarError> {
        Ok(Self::figment().extract()?)
    }

    pub fn should_wait(&self) -> bool {
        self.database.as_deref() == Some(self.wait_for.as_str())
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        (self.wait_timeout_secs > 0).then(|| Duration::from_secs(self.wait_timeout_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms.max(self.poll_interval_ms.max(1)))
    }
}
