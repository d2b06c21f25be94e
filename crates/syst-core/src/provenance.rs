//! Provenance written next to batches of corrected events.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Layout version of the corrected-event output.
///
/// The major number changes when a reader of the previous layout would
/// misinterpret the new one (renamed variation keys, reordered four-vector
/// fields); the minor number changes for added fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Breaking layout revision.
    pub major: u32,
    /// Additive layout revision.
    pub minor: u32,
}

impl SchemaVersion {
    /// Layout written by this release.
    pub const CURRENT: SchemaVersion = SchemaVersion { major: 1, minor: 0 };
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Inputs that fully determine a batch of corrected events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Output layout.
    pub schema: SchemaVersion,
    /// SHA-256 of the canonical run configuration.
    pub config_hash: String,
    /// SHA-256 of the correction table document as read from disk.
    pub table_hash: String,
    /// Data-taking period label, or `default` when none was configured.
    pub period: String,
    /// Crate name to version.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Provenance for the current layout, recording this crate's version.
    pub fn new(
        config_hash: impl Into<String>,
        table_hash: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert("syst-core".to_string(), env!("CARGO_PKG_VERSION").to_string());
        Self {
            schema: SchemaVersion::CURRENT,
            config_hash: config_hash.into(),
            table_hash: table_hash.into(),
            period: period.into(),
            tool_versions,
        }
    }

    /// Records the version of another crate involved in the run.
    pub fn with_tool(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.tool_versions.insert(name.into(), version.into());
        self
    }
}
