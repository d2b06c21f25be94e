//! Uncertainty sources a jet collection emits and the table entries behind them.

use std::collections::BTreeMap;

use syst_core::errors::{ErrorInfo, SystError};
use syst_core::table::CorrectionTable;
use syst_core::{SampleKind, UncSource};
use tracing::info;

use crate::config::{JetCorrectionConfig, UncertaintyMode};

/// How the shift of one source is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    /// Shift by the per-object relative resolution.
    Resolution,
    /// Shift by the value of a named correction at `(eta, pt)`.
    Table(String),
}

const REGROUPED: [(UncSource, &str); 12] = [
    (UncSource::Jer, "JER"),
    (UncSource::JesRelativeBal, "Regrouped_RelativeBal"),
    (UncSource::JesHf, "Regrouped_HF"),
    (UncSource::JesBbec1, "Regrouped_BBEC1"),
    (UncSource::JesEc2, "Regrouped_EC2"),
    (UncSource::JesAbsolute, "Regrouped_Absolute"),
    (UncSource::JesFlavorQcd, "Regrouped_FlavorQCD"),
    (UncSource::JesBbec1Year, "Regrouped_BBEC1"),
    (UncSource::JesAbsoluteYear, "Regrouped_Absolute"),
    (UncSource::JesEc2Year, "Regrouped_EC2"),
    (UncSource::JesHfYear, "Regrouped_RelativeStatHF"),
    (UncSource::JesRelativeSampleYear, "Regrouped_RelativeSample"),
];

const TOTAL: [(UncSource, &str); 2] = [(UncSource::Jer, "JER"), (UncSource::JesTotal, "Total")];

/// Uncertainty sources of one jet collection, built once per configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncertaintyCatalog {
    entries: BTreeMap<UncSource, CatalogEntry>,
}

impl UncertaintyCatalog {
    /// Builds the catalog; data samples get an empty one.
    pub fn from_config(config: &JetCorrectionConfig, sample: SampleKind) -> Self {
        let mut entries = BTreeMap::new();
        if sample.is_data() {
            return Self { entries };
        }
        let base: &[(UncSource, &str)] = match config.mode {
            UncertaintyMode::Total => &TOTAL,
            UncertaintyMode::Regrouped => &REGROUPED,
        };
        for (source, unc_name) in base {
            let entry = if *source == UncSource::Jer {
                CatalogEntry::Resolution
            } else if source.is_year_dependent() {
                CatalogEntry::Table(format!(
                    "{}_{}_{}_{}",
                    config.jec_tag, unc_name, config.year, config.algo
                ))
            } else {
                CatalogEntry::Table(format!("{}_{}_{}", config.jec_tag, unc_name, config.algo))
            };
            entries.insert(*source, entry);
        }
        for (source, name) in &config.extra_sources {
            entries.insert(*source, CatalogEntry::Table(name.clone()));
        }
        info!(
            algo = %config.algo,
            sources = entries.len(),
            "jet uncertainty catalog built"
        );
        Self { entries }
    }

    /// Checks that every named correction exists in `table`.
    pub fn validate(&self, table: &dyn CorrectionTable) -> Result<(), SystError> {
        for (source, entry) in &self.entries {
            if let CatalogEntry::Table(name) = entry {
                if !table.contains(name) {
                    return Err(SystError::Configuration(
                        ErrorInfo::new("missing_catalog_entry", "uncertainty correction not found")
                            .with_context("source", source.name())
                            .with_context("key", name.as_str())
                            .with_hint("check jec_tag, year and algo against the correction table"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Entry for `source`.
    pub fn get(&self, source: UncSource) -> Option<&CatalogEntry> {
        self.entries.get(&source)
    }

    /// Sources in catalog order.
    pub fn sources(&self) -> impl Iterator<Item = UncSource> + '_ {
        self.entries.keys().copied()
    }

    /// Iterates `(source, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (UncSource, &CatalogEntry)> {
        self.entries.iter().map(|(source, entry)| (*source, entry))
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog has no sources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
