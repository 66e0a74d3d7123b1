//! Common functionality for converting energy system models between OSeMOSYS and INES.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod config;
pub mod convert;
pub mod database;
pub mod id;
pub mod input;
pub mod log;
pub mod parameter;
pub mod settings;
pub mod time_slice;
pub mod units;
pub mod value;

#[cfg(test)]
mod fixture;

/// The URL for issues on GitHub
pub const ISSUES_URL: &str = "https://github.com/ines-tools/ines-osemosys/issues";

/// Get the path to the program's configuration directory.
///
/// Falls back to the current directory if the platform has no config directory.
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("ines-osemosys");
    path
}
