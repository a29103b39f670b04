use mimalloc::MiMalloc;
use solar_tracker::SolarError;
use solar_tracker::config::EntrypointConfig;
use solar_tracker::entrypoint::{self, handoff};
use solar_tracker::shutdown;
use std::ffi::OsString;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Conventional status for a process stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    dotenvy::dotenv().ok();
    solar_tracker::logging::init("info");

    let argv: Vec<OsString> = std::env::args_os().skip(1).collect();
    let code = match run(&argv) {
        Ok(code) => code,
        Err(e) if e.is_interrupt() => {
            warn!(error = %e, "entrypoint interrupted; not handing off");
            INTERRUPTED_EXIT_CODE
        }
        Err(e) => {
            error!(error = %e, "entrypoint failed");
            1
        }
    };
    std::process::exit(code);
}

fn run(argv: &[OsString]) -> Result<i32, SolarError> {
    let cfg = EntrypointConfig::from_env()?;
    info!(
        database = cfg.database.as_deref().unwrap_or("<unset>"),
        host = %cfg.sql_host,
        port = cfg.sql_port,
        strict = cfg.strict_migrations,
        "entrypoint starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    {
        let _guard = runtime.enter();
        shutdown::forward_signals(shutdown_tx)?;
    }

    let report = runtime.block_on(entrypoint::prepare(&cfg, shutdown_rx.clone()))?;
    // The runtime must be gone before the process image is replaced.
    runtime.shutdown_background();
    if *shutdown_rx.borrow() {
        return Err(SolarError::Interrupted {
            stage: "hand-off".to_string(),
        });
    }

    info!(
        waited = ?report.wait_attempts,
        migrations_ok = report.migrations.iter().all(|r| r.succeeded()),
        "setup finished"
    );
    handoff::exec(argv)
}
