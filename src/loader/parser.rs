use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// Used by the CLI entry point and by tests to load fixture requests
/// and `StaticDataSource` snapshots; the engine itself never touches
/// the filesystem directly.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let path = file_path.as_ref();
    let data = fs::read_to_string(path).map_err(Error::Io)?;
    let parsed: T = serde_json::from_str(&data).map_err(Error::Deserialization)?;
    Ok(parsed)
}

pub fn parse_json_str<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(Error::Deserialization)
}
