//! Document decoding shared by tables, run configurations and event files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use syst_core::errors::{ErrorInfo, SystError};

fn serde_error(code: &str, err: impl ToString) -> SystError {
    SystError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Encoding of a document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json` files.
    Json,
    /// Every other extension, including none.
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    /// Decodes `data` in this format.
    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T, SystError> {
        match self {
            DocumentFormat::Json => {
                serde_json::from_slice(data).map_err(|err| serde_error("json_deserialize", err))
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_slice(data).map_err(|err| serde_error("yaml_deserialize", err))
            }
        }
    }
}

/// Reads and decodes a document. A failed read is reported under `read_code`
/// with the path in the error context; decode failures keep the format's code.
pub fn read_document<T: DeserializeOwned>(path: &Path, read_code: &str) -> Result<T, SystError> {
    let bytes = fs::read(path).map_err(|err| {
        serde_error(read_code, err).with_context("path", path.display().to_string())
    })?;
    DocumentFormat::from_path(path)
        .decode(&bytes)
        .map_err(|err| err.with_context("path", path.display().to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect::<BTreeMap<_, _>>()
                .into_iter()
                .collect::<Map<_, _>>(),
        ),
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into JSON with object keys sorted at every depth, so
/// equal values always produce equal bytes and equal fingerprints.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SystError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json_serialize", err))?;
    serde_json::to_vec(&canonicalize(value)).map_err(|err| serde_error("json_write", err))
}
