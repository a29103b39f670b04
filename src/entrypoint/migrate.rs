use crate::config::{EntrypointConfig, split_command};
use crate::error::SolarError;
use crate::shutdown::requested;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{info, warn};

/// Schema generation, then schema application.
pub const MIGRATION_STEPS: [&str; 2] = ["makemigrations", "migrate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPolicy {
    /// Log failures and keep going.
    Lenient,
    /// Stop at the first failing step.
    Strict,
}

impl MigrationPolicy {
    pub fn from_config(cfg: &EntrypointConfig) -> Self {
        if cfg.strict_migrations {
            MigrationPolicy::Strict
        } else {
            MigrationPolicy::Lenient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: &'static str,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == StepOutcome::Succeeded
    }
}

/// Run one management subcommand.
///
/// Stdout and stderr are inherited. Stdin is closed so an interactive prompt
/// reads end-of-file instead of blocking the container start. A shutdown request
/// kills the subcommand and surfaces as `Interrupted`.
pub async fn run_step(
    program: &str,
    args: &[String],
    step: &'static str,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<StepOutcome, SolarError> {
    info!(program, step, "running migration step");
    let spawned = Command::new(program)
        .args(args)
        .arg(step)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => return Ok(StepOutcome::Failed(format!("could not start `{program}`: {e}"))),
    };

    tokio::select! {
        status = child.wait() => Ok(match status {
            Ok(status) if status.success() => StepOutcome::Succeeded,
            Ok(status) => StepOutcome::Failed(status.to_string()),
            Err(e) => StepOutcome::Failed(format!("could not wait for `{program}`: {e}")),
        }),
        _ = requested(shutdown) => {
            warn!(step, "shutdown requested; stopping migration step");
            if let Err(e) = child.kill().await {
                warn!(step, error = %e, "could not stop migration step");
            }
            Err(SolarError::Interrupted {
                stage: step.to_string(),
            })
        }
    }
}

pub async fn run_migrations(
    cfg: &EntrypointConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<Vec<StepReport>, SolarError> {
    let (program, args) = split_command(&cfg.manage_command)?;
    let policy = MigrationPolicy::from_config(cfg);
    let mut reports = Vec::with_capacity(MIGRATION_STEPS.len());

    for step in MIGRATION_STEPS {
        if *shutdown.borrow() {
            return Err(SolarError::Interrupted {
                stage: step.to_string(),
            });
        }
        let outcome = run_step(&program, &args, step, &mut shutdown).await?;
        if let StepOutcome::Failed(status) = &outcome {
            match policy {
                MigrationPolicy::Strict => {
                    return Err(SolarError::MigrationFailed {
                        step: step.to_string(),
                        status: status.clone(),
                    });
                }
                MigrationPolicy::Lenient => {
                    warn!(step, %status, "migration step failed; continuing");
                }
            }
        }
        reports.push(StepReport { step, outcome });
    }

    Ok(reports)
}
