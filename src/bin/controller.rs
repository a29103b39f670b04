use clap::Parser;
use mimalloc::MiMalloc;
use solar_tracker::controller::{self, ControllerArgs};
use std::process::ExitCode;
use tracing::error;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    solar_tracker::logging::init("info");

    let args = ControllerArgs::parse();
    let stdout = std::io::stdout();
    match controller::run(&args, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "controller failed to start");
            ExitCode::FAILURE
        }
    }
}
