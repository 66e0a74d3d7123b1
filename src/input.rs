//! Common routines for reading input files.
use anyhow::{Context, Result, ensure};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Format an error message to include the file path.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a series of type `T`s from a CSV file.
///
/// Whitespace around fields is trimmed. An empty file (header only) is an error.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    let records: Vec<T> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .with_context(|| input_err_msg(file_path))?;
    ensure!(
        !records.is_empty(),
        "{}: CSV file cannot be empty",
        input_err_msg(file_path)
    );

    Ok(records)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Parse a JSON file at the specified path.
pub fn read_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let json_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let json_data = serde_json::from_str(&json_str).with_context(|| input_err_msg(file_path))?;
    Ok(json_data)
}
