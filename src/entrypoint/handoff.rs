use crate::error::SolarError;
use std::ffi::{OsStr, OsString};
use std::process::Command;
use tracing::info;

/// Hand control to `argv`.
///
/// On Unix the current process image is replaced and this only returns on
/// failure. Elsewhere the command runs as a child and its exit code is returned.
/// An empty `argv` has nothing to hand off to and yields `Ok(0)`.
pub fn exec(argv: &[OsString]) -> Result<i32, SolarError> {
    let Some((program, args)) = argv.split_first() else {
        info!("no command given; nothing to hand off");
        return Ok(0);
    };

    info!(program = %program.to_string_lossy(), args = args.len(), "handing off");
    let mut cmd = Command::new(program);
    cmd.args(args);
    replace_process(cmd, program)
}

#[cfg(unix)]
fn replace_process(mut cmd: Command, program: &OsStr) -> Result<i32, SolarError> {
    use std::os::unix::process::CommandExt;

    let source = cmd.exec();
    Err(SolarError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    })
}

#[cfg(not(unix))]
fn replace_process(mut cmd: Command, program: &OsStr) -> Result<i32, SolarError> {
    let status = cmd.status().map_err(|source| SolarError::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    })?;
    Ok(status.code().unwrap_or(1))
}
