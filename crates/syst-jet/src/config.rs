//! Configuration of one jet collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use syst_core::errors::SystError;
use syst_core::sampler::CrystalBallShape;
use syst_core::{SampleKind, UncSource};

use crate::horn::RegionExclusionPolicy;
use crate::period::{CompoundLayout, DataPeriod, DataTagRule};

fn default_algo() -> String {
    "AK4PFPuppi".to_string()
}

fn default_true() -> bool {
    true
}

/// Which set of JES sources the catalog is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyMode {
    /// Total JES plus JER.
    #[default]
    Total,
    /// Regrouped JES components plus JER.
    Regrouped,
}

/// Tags, switches and policies for one jet collection (AK4 jets or AK8 fat jets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetCorrectionConfig {
    /// JEC tag used to build uncertainty correction names.
    pub jec_tag: String,
    /// JEC tag of the compound correction when it differs from `jec_tag`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound_jec_tag: Option<String>,
    /// Derives the compound JEC tag for data from the sample name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_tag: Option<DataTagRule>,
    /// JER tag for scale factors and resolutions.
    pub jer_tag: String,
    /// Jet algorithm suffix, e.g. `AK4PFPuppi` or `AK8PFPuppi`.
    #[serde(default = "default_algo")]
    pub algo: String,
    /// Year inserted into year-dependent uncertainty names.
    pub year: String,
    /// Data-taking period; selects the compound layout.
    #[serde(default)]
    pub period: DataPeriod,
    /// Overrides the period's compound layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound_layout: Option<CompoundLayout>,
    /// JES source set.
    #[serde(default)]
    pub mode: UncertaintyMode,
    /// Additional sources with explicit correction names.
    #[serde(default)]
    pub extra_sources: BTreeMap<UncSource, String>,
    /// Apply resolution smearing and produce JER variations.
    #[serde(default = "default_true")]
    pub apply_jer: bool,
    /// Remove the raw factor and apply the compound correction.
    #[serde(default = "default_true")]
    pub apply_compound: bool,
    /// Forward horn exclusion.
    #[serde(default)]
    pub horn: RegionExclusionPolicy,
    /// Shape of the stochastic smearing draw.
    #[serde(default)]
    pub smear_shape: CrystalBallShape,
}

impl JetCorrectionConfig {
    /// Minimal configuration with every optional field defaulted.
    pub fn new(
        jec_tag: impl Into<String>,
        jer_tag: impl Into<String>,
        algo: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            jec_tag: jec_tag.into(),
            compound_jec_tag: None,
            data_tag: None,
            jer_tag: jer_tag.into(),
            algo: algo.into(),
            year: year.into(),
            period: DataPeriod::default(),
            compound_layout: None,
            mode: UncertaintyMode::default(),
            extra_sources: BTreeMap::new(),
            apply_jer: true,
            apply_compound: true,
            horn: RegionExclusionPolicy::default(),
            smear_shape: CrystalBallShape::default(),
        }
    }

    /// Key of the JER scale-factor correction.
    pub fn jer_sf_key(&self) -> String {
        format!("{}_ScaleFactor_{}", self.jer_tag, self.algo)
    }

    /// Key of the relative pt-resolution correction.
    pub fn jer_resolution_key(&self) -> String {
        format!("{}_PtResolution_{}", self.jer_tag, self.algo)
    }

    /// Key of the compound residual correction.
    ///
    /// For data with a [`DataTagRule`], the tag is resolved from `sample_name`.
    pub fn compound_key(&self, sample: SampleKind, sample_name: &str) -> Result<String, SystError> {
        let tag = match (&self.data_tag, sample) {
            (Some(rule), SampleKind::Data) => rule.resolve(sample_name)?,
            _ => self
                .compound_jec_tag
                .clone()
                .unwrap_or_else(|| self.jec_tag.clone()),
        };
        Ok(format!("{tag}_L1L2L3Res_{}", self.algo))
    }

    /// Compound layout after applying the override.
    pub fn layout(&self, sample: SampleKind) -> CompoundLayout {
        self.compound_layout
            .unwrap_or_else(|| self.period.compound_layout(sample))
    }
}
