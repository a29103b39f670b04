//! One-shot operator menu.
//!
//! Reads a single selection, acts on it once and returns. There is no retry loop.

use crate::config::{LauncherConfig, SettingsStore};
use crate::error::SolarError;
use crate::mode::ControllerMode;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::{info, warn};

const RULE: &str = "============================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Start(ControllerMode),
    ShowConfig,
    Exit,
}

impl MenuChoice {
    /// Accepts exactly `1`..`5` after trimming surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Start(ControllerMode::Both)),
            "2" => Some(MenuChoice::Start(ControllerMode::Anfis)),
            "3" => Some(MenuChoice::Start(ControllerMode::Traditional)),
            "4" => Some(MenuChoice::ShowConfig),
            "5" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    Launched(ExitStatus),
    ShowedConfig,
    Exited,
    Rejected(String),
}

impl MenuOutcome {
    /// Process exit code for the launcher itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            MenuOutcome::Launched(status) => status.code().unwrap_or(1),
            _ => 0,
        }
    }
}

/// Starts the controller process in a given mode.
pub trait ControllerLauncher {
    fn launch(&self, mode: ControllerMode) -> Result<ExitStatus, SolarError>;
}

/// Runs `<program> <args…> --mode <mode>` with inherited stdio and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: String,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(cfg: &LauncherConfig) -> Result<Self, SolarError> {
        let (program, args) = cfg.controller_command()?;
        Ok(Self::new(program, args))
    }
}

impl ControllerLauncher for ProcessLauncher {
    fn launch(&self, mode: ControllerMode) -> Result<ExitStatus, SolarError> {
        info!(program = %self.program, mode = %mode, "starting controller");
        Command::new(&self.program)
            .args(&self.args)
            .arg("--mode")
            .arg(mode.as_str())
            .status()
            .map_err(|source| SolarError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// Where the diagnostic choice reads settings from.
#[derive(Debug, Clone)]
pub struct SettingsSource {
    pub dir: PathBuf,
    pub file: PathBuf,
}

impl From<&LauncherConfig> for SettingsSource {
    fn from(cfg: &LauncherConfig) -> Self {
        Self {
            dir: cfg.config_dir.clone(),
            file: cfg.config_file.clone(),
        }
    }
}

pub fn write_menu(out: &mut impl Write) -> Result<(), SolarError> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "Solar Tracking System Launcher")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "1. Start dual mode (ANFIS + traditional comparison)")?;
    writeln!(out, "2. Start ANFIS smart tracking only")?;
    writeln!(out, "3. Start traditional tracking only")?;
    writeln!(out, "4. Show configuration")?;
    writeln!(out, "5. Exit")?;
    writeln!(out)?;
    write!(out, "Select (1-5): ")?;
    out.flush()?;
    Ok(())
}

/// Print the hardware and system sections of the settings file.
pub fn show_config(out: &mut impl Write, source: &SettingsSource) -> Result<(), SolarError> {
    let (store, _) = SettingsStore::open_and_load(&source.dir, &source.file)?;
    writeln!(out, "[hardware]")?;
    writeln!(out, "{}", serde_json::to_string_pretty(store.hardware())?)?;
    writeln!(out, "[system]")?;
    writeln!(out, "{}", serde_json::to_string_pretty(store.system())?)?;
    Ok(())
}

/// Show the menu, read one line and act on it.
pub fn run_menu<R, W, L>(
    input: &mut R,
    out: &mut W,
    launcher: &L,
    settings: &SettingsSource,
) -> Result<MenuOutcome, SolarError>
where
    R: BufRead,
    W: Write,
    L: ControllerLauncher + ?Sized,
{
    write_menu(out)?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    writeln!(out)?;

    let Some(choice) = MenuChoice::parse(&line) else {
        let shown = line.trim();
        writeln!(out, "Invalid selection: {shown}")?;
        return Ok(MenuOutcome::Rejected(shown.to_string()));
    };

    match choice {
        MenuChoice::Start(mode) => {
            let status = launcher.launch(mode)?;
            if !status.success() {
                warn!(mode = %mode, %status, "controller exited unsuccessfully");
            }
            Ok(MenuOutcome::Launched(status))
        }
        MenuChoice::ShowConfig => {
            show_config(out, settings)?;
            Ok(MenuOutcome::ShowedConfig)
        }
        MenuChoice::Exit => Ok(MenuOutcome::Exited),
    }
}
