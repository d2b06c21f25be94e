use std::path::Path;

use serde::{Deserialize, Serialize};
use syst_core::errors::SystError;
use syst_jet::JetInputs;
use syst_lepton::{ElectronInputs, TauInputs};
use syst_muon::MuonInputs;
use syst_table::serde::read_document;

/// Stored missing transverse momentum of one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetRecord {
    /// Magnitude.
    pub pt: f64,
    /// Azimuth.
    pub phi: f64,
}

/// One event of the input file. Collections absent from the record are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event number.
    pub event: u64,
    /// Luminosity block.
    pub lumi: u64,
    /// Run number.
    pub run: u32,
    /// Median energy density.
    #[serde(default)]
    pub rho: f64,
    /// AK4 jets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jets: Option<JetInputs>,
    /// AK8 fat jets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_jets: Option<JetInputs>,
    /// Muons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muons: Option<MuonInputs>,
    /// Electrons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrons: Option<ElectronInputs>,
    /// Hadronic taus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taus: Option<TauInputs>,
    /// Missing transverse momentum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub met: Option<MetRecord>,
}

/// Input file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    /// Events in file order.
    pub events: Vec<EventRecord>,
}

impl EventBatch {
    /// Loads a JSON or YAML event file.
    pub fn load(path: &Path) -> Result<Self, SystError> {
        read_document(path, "events_read")
    }
}
