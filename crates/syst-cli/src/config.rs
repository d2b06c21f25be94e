use std::path::Path;

use serde::{Deserialize, Serialize};
use syst_core::errors::SystError;
use syst_core::SampleKind;
use syst_jet::{DataPeriod, JetCorrectionConfig};
use syst_lepton::{ElectronScaleConfig, TauScaleConfig};
use syst_muon::MuonScaReConfig;
use syst_table::serde::read_document;

/// Which kind of sample the events come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Data or simulation.
    pub kind: SampleKind,
    /// Dataset name; used to resolve era-dependent data tags.
    #[serde(default)]
    pub name: String,
}

fn default_met_collections() -> Vec<String> {
    ["electrons", "jets", "muons", "taus"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Propagation of object corrections into the missing transverse momentum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetConfig {
    /// Collections whose momentum changes are subtracted from the missing
    /// momentum. Fat jets overlap the AK4 jets and are left out by default.
    #[serde(default = "default_met_collections")]
    pub collections: Vec<String>,
}

impl Default for MetConfig {
    fn default() -> Self {
        Self {
            collections: default_met_collections(),
        }
    }
}

/// Run configuration: one optional block per object collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Sample description.
    pub sample: SampleConfig,
    /// Analysis period label such as `2023_Summer23BPix`; sets the period of
    /// every jet collection when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// AK4 jets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jets: Option<JetCorrectionConfig>,
    /// AK8 fat jets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_jets: Option<JetCorrectionConfig>,
    /// Muon ScaRe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muons: Option<MuonScaReConfig>,
    /// Electron energy scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrons: Option<ElectronScaleConfig>,
    /// Hadronic tau energy scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taus: Option<TauScaleConfig>,
    /// Missing transverse momentum; requires `met` in every event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub met: Option<MetConfig>,
}

impl RunConfig {
    /// Loads a YAML or JSON configuration and applies the period label.
    pub fn load(path: &Path) -> Result<Self, SystError> {
        let mut config: RunConfig = read_document(path, "config_read")?;
        config.apply_period()?;
        Ok(config)
    }

    /// Propagates `period` into the jet collections.
    pub fn apply_period(&mut self) -> Result<(), SystError> {
        let Some(label) = &self.period else {
            return Ok(());
        };
        let period = DataPeriod::from_label(label)?;
        for jets in [&mut self.jets, &mut self.fat_jets].into_iter().flatten() {
            jets.period = period;
        }
        Ok(())
    }

    /// Period string recorded in provenance.
    pub fn period_label(&self) -> String {
        match (&self.period, &self.jets) {
            (Some(label), _) => label.clone(),
            (None, Some(jets)) => jets.period.to_string(),
            (None, None) => String::new(),
        }
    }
}
