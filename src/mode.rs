use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating mode handed to the controller through `--mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ControllerMode {
    /// ANFIS and traditional tracking side by side.
    #[default]
    Both,
    /// Smart tracking only.
    Anfis,
    /// Fixed, rule-based tracking only.
    Traditional,
}

impl ControllerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ControllerMode::Both => "both",
            ControllerMode::Anfis => "anfis",
            ControllerMode::Traditional => "traditional",
        }
    }

    pub fn runs_anfis(self) -> bool {
        matches!(self, ControllerMode::Both | ControllerMode::Anfis)
    }

    pub fn runs_traditional(self) -> bool {
        matches!(self, ControllerMode::Both | ControllerMode::Traditional)
    }
}

impl fmt::Display for ControllerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown controller mode `{}`", self.0)
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for ControllerMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(ControllerMode::Both),
            "anfis" => Ok(ControllerMode::Anfis),
            "traditional" => Ok(ControllerMode::Traditional),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
