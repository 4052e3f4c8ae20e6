//! Loading and persisting YAML/TOML/JSON documents.
//!
//! Records live on disk as YAML, provider configurations as TOML. Every
//! failure is mapped onto [`Error`] with the offending path attached.

use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;
use crate::result::Result;

/// Read a file into a string, distinguishing a missing file from other I/O failures.
fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::file_not_found(path),
        _ => Error::file_read_failed(path, e.to_string()),
    })
}

/// Parse a YAML string.
///
/// # Errors
///
/// Returns [`Error::YamlParseFailed`] when the document is not valid YAML for `T`.
pub fn from_yaml_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_yaml::from_str(content).map_err(|e| Error::yaml_parse_failed(e.to_string()))
}

/// Load and parse a YAML document.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`], [`Error::FileReadFailed`] or [`Error::YamlParseFailed`].
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Loading YAML document");
    from_yaml_str(&read_to_string(path)?)
}

/// Load and parse a TOML document.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`], [`Error::FileReadFailed`] or [`Error::TomlParseFailed`].
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Loading TOML document");
    toml::from_str(&read_to_string(path)?).map_err(|e| Error::toml_parse_failed(e.to_string()))
}

/// Load and parse a JSON document.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`], [`Error::FileReadFailed`] or [`Error::JsonParseFailed`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Loading JSON document");
    serde_json::from_str(&read_to_string(path)?).map_err(|e| Error::json_parse_failed(e.to_string()))
}

/// Serialize a value as YAML and write it to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns [`Error::SerializeFailed`] or [`Error::FileWriteFailed`].
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value).map_err(|e| Error::serialize_failed(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| Error::file_write_failed(path, e.to_string()))?;
    debug!(path = %path.display(), "Wrote YAML document");
    Ok(())
}
