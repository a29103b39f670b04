use mimalloc::MiMalloc;
use solar_tracker::config::LauncherConfig;
use solar_tracker::launcher::{self, ProcessLauncher, SettingsSource};
use std::io;
use std::process::ExitCode;
use tracing::{debug, error};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    solar_tracker::logging::init("warn");

    match run() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!(error = %e, "launcher failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<i32, solar_tracker::SolarError> {
    let cfg = LauncherConfig::from_env()?;
    debug!(?cfg, "launcher configuration");

    let controller = ProcessLauncher::from_config(&cfg)?;
    let settings = SettingsSource::from(&cfg);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = launcher::run_menu(&mut stdin.lock(), &mut stdout.lock(), &controller, &settings)?;
    debug!(?outcome, "launcher finished");
    Ok(outcome.exit_code())
}
