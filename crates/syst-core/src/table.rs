//! Contract for keyed correction lookups.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SystError;

/// One positional argument passed to a correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectionArg {
    /// Integer input (run number, decay mode, category index).
    Int(i64),
    /// Real valued input.
    Real(f64),
    /// String category (variation name, working point).
    Text(String),
}

impl CorrectionArg {
    /// Numeric view of the argument; integers widen to `f64`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            CorrectionArg::Real(v) => Some(*v),
            CorrectionArg::Int(v) => Some(*v as f64),
            CorrectionArg::Text(_) => None,
        }
    }

    /// Integer view; reals are accepted only when integral.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CorrectionArg::Int(v) => Some(*v),
            CorrectionArg::Real(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// String view.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CorrectionArg::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CorrectionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionArg::Int(v) => write!(f, "{v}"),
            CorrectionArg::Real(v) => write!(f, "{v}"),
            CorrectionArg::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for CorrectionArg {
    fn from(value: f64) -> Self {
        CorrectionArg::Real(value)
    }
}

impl From<f32> for CorrectionArg {
    fn from(value: f32) -> Self {
        CorrectionArg::Real(f64::from(value))
    }
}

impl From<i64> for CorrectionArg {
    fn from(value: i64) -> Self {
        CorrectionArg::Int(value)
    }
}

impl From<i32> for CorrectionArg {
    fn from(value: i32) -> Self {
        CorrectionArg::Int(i64::from(value))
    }
}

impl From<u32> for CorrectionArg {
    fn from(value: u32) -> Self {
        CorrectionArg::Int(i64::from(value))
    }
}

impl From<&str> for CorrectionArg {
    fn from(value: &str) -> Self {
        CorrectionArg::Text(value.to_string())
    }
}

impl From<String> for CorrectionArg {
    fn from(value: String) -> Self {
        CorrectionArg::Text(value)
    }
}

/// Builds a `Vec<CorrectionArg>` from heterogeneous values.
#[macro_export]
macro_rules! args {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::table::CorrectionArg::from($value)),*]
    };
}

/// Opaque store of named correction functions.
///
/// Implementations are shared read-only between threads once loaded.
pub trait CorrectionTable: Send + Sync {
    /// Evaluates the single correction `key` at `args`.
    ///
    /// Fails with [`SystError::Lookup`] when `key` is unknown or `args` fall
    /// outside the correction's domain.
    fn evaluate(&self, key: &str, args: &[CorrectionArg]) -> Result<f64, SystError>;

    /// Evaluates the chained correction `key`, the product of its steps.
    fn compound_evaluate(&self, key: &str, args: &[CorrectionArg]) -> Result<f64, SystError>;

    /// Returns true if a single or chained correction named `key` exists.
    fn contains(&self, key: &str) -> bool;
}

impl<T: CorrectionTable + ?Sized> CorrectionTable for std::sync::Arc<T> {
    fn evaluate(&self, key: &str, args: &[CorrectionArg]) -> Result<f64, SystError> {
        (**self).evaluate(key, args)
    }

    fn compound_evaluate(&self, key: &str, args: &[CorrectionArg]) -> Result<f64, SystError> {
        (**self).compound_evaluate(key, args)
    }

    fn contains(&self, key: &str) -> bool {
        (**self).contains(key)
    }
}
