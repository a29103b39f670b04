pub mod collector;
pub mod config;
pub mod controller;
pub mod entrypoint;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod mode;
pub mod shutdown;

pub use error::SolarError;
pub use mode::ControllerMode;
