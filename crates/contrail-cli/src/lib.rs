//! Command-line front end for the Contrail embedding worker.
//!
//! # Modules
//!
//! - [`cli`]: Flag parsing
//! - [`config`]: Layered TOML + environment configuration
//! - [`logging`]: Session and error log files
//! - [`app`]: Wiring configuration into a running scheduler

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;

pub use app::ContrailApp;
pub use cli::{CliArgs, Target};
pub use config::ContrailConfig;
pub use logging::LogFiles;
