//! Container entrypoint: wait for the database, migrate, hand off.
//!
//! Layout:
//! - `wait.rs`: bounded, cancellable TCP readiness check
//! - `migrate.rs`: schema generation and application through the management tool
//! - `handoff.rs`: replace this process with the container command

pub mod handoff;
pub mod migrate;
pub mod wait;

use crate::config::EntrypointConfig;
use crate::error::SolarError;
use tokio::sync::watch;
use tracing::info;

pub use migrate::{MIGRATION_STEPS, MigrationPolicy, StepOutcome, StepReport, run_migrations};
pub use wait::{WaitPolicy, wait_for_port};

#[derive(Debug, Clone)]
pub struct PrepareReport {
    /// Connection attempts spent waiting, or `None` when the wait was skipped.
    pub wait_attempts: Option<u32>,
    pub migrations: Vec<StepReport>,
}

/// Everything the entrypoint does before the hand-off.
///
/// `shutdown` aborts the wait and any running migration step.
pub async fn prepare(
    cfg: &EntrypointConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<PrepareReport, SolarError> {
    let wait_attempts = if cfg.should_wait() {
        let policy = WaitPolicy::from_config(cfg);
        Some(wait_for_port(&cfg.sql_host, cfg.sql_port, &policy, shutdown.clone()).await?)
    } else {
        info!(
            database = cfg.database.as_deref().unwrap_or("<unset>"),
            wait_for = %cfg.wait_for,
            "database wait skipped"
        );
        None
    };

    let migrations = run_migrations(cfg, shutdown).await?;
    Ok(PrepareReport {
        wait_attempts,
        migrations,
    })
}
