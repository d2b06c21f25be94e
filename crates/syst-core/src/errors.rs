//! Structured error types shared across the correction crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SystError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (correction key, source, scale, object index).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the correction engine.
///
/// Every variant is fatal for the event being processed. Recoverable numeric
/// conditions are reported through [`crate::sanity::DomainWarning`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SystError {
    /// Catalog, key or period mismatches between configuration and tables.
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// Failures reported by a correction table during evaluation.
    #[error("lookup error: {0}")]
    Lookup(ErrorInfo),
    /// Malformed per-event inputs (misaligned arrays, dangling indices).
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Document parsing and serialization errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl SystError {
    /// Shorthand for a configuration error.
    pub fn configuration(code: &str, message: impl Into<String>) -> Self {
        SystError::Configuration(ErrorInfo::new(code, message))
    }

    /// Shorthand for a lookup error.
    pub fn lookup(code: &str, message: impl Into<String>) -> Self {
        SystError::Lookup(ErrorInfo::new(code, message))
    }

    /// Shorthand for an input error.
    pub fn input(code: &str, message: impl Into<String>) -> Self {
        SystError::Input(ErrorInfo::new(code, message))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SystError::Configuration(info)
            | SystError::Lookup(info)
            | SystError::Input(info)
            | SystError::Serde(info) => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            SystError::Configuration(info)
            | SystError::Lookup(info)
            | SystError::Input(info)
            | SystError::Serde(info) => info,
        }
    }

    /// Attaches a context entry, keeping the error family unchanged.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info_mut().context.insert(key.into(), value.into());
        self
    }

    /// Promotes a table lookup failure into a configuration error.
    ///
    /// Lookup failures inside the engine always mean the configured catalog
    /// does not match the loaded tables, so the event is aborted with the
    /// failing key attached.
    pub fn into_configuration(self, key: &str) -> Self {
        match self {
            SystError::Lookup(info) => SystError::Configuration(
                info.with_context("key", key)
                    .with_hint("check that the correction table matches the configured tags"),
            ),
            other => other.with_context("key", key),
        }
    }

    /// Returns true when the error is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SystError::Configuration(_))
    }
}

/// Builds a [`SystError::Input`] when two parallel arrays disagree in length.
pub fn ensure_aligned(field: &str, expected: usize, actual: usize) -> Result<(), SystError> {
    if expected == actual {
        return Ok(());
    }
    Err(SystError::Input(
        ErrorInfo::new("misaligned_arrays", "parallel per-object arrays differ in length")
            .with_context("field", field)
            .with_context("expected", expected.to_string())
            .with_context("actual", actual.to_string()),
    ))
}
