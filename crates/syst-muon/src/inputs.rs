use serde::{Deserialize, Serialize};
use syst_core::errors::{ensure_aligned, ErrorInfo, SystError};
use syst_core::{zip_p4, Collection};

/// Muon arrays of one event, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MuonInputs {
    /// Transverse momentum.
    pub pt: Vec<f64>,
    /// Pseudorapidity.
    pub eta: Vec<f64>,
    /// Azimuth.
    pub phi: Vec<f64>,
    /// Mass.
    pub mass: Vec<f64>,
    /// Electric charge, +1 or -1.
    pub charge: Vec<i32>,
    /// Number of tracker layers with hits.
    pub n_tracker_layers: Vec<u8>,
}

impl MuonInputs {
    /// Number of muons.
    pub fn len(&self) -> usize {
        self.pt.len()
    }

    /// True for an event without muons.
    pub fn is_empty(&self) -> bool {
        self.pt.is_empty()
    }

    /// Checks array alignment and charges.
    pub fn validate(&self) -> Result<(), SystError> {
        let n = self.len();
        ensure_aligned("eta", n, self.eta.len())?;
        ensure_aligned("phi", n, self.phi.len())?;
        ensure_aligned("mass", n, self.mass.len())?;
        ensure_aligned("charge", n, self.charge.len())?;
        ensure_aligned("n_tracker_layers", n, self.n_tracker_layers.len())?;
        if let Some(i) = self.charge.iter().position(|q| q.abs() != 1) {
            return Err(SystError::Input(
                ErrorInfo::new("invalid_charge", "muon charge must be +1 or -1")
                    .with_context("object", i.to_string())
                    .with_context("charge", self.charge[i].to_string()),
            ));
        }
        Ok(())
    }

    /// Four-vectors as stored.
    pub fn stored_p4(&self) -> Collection {
        zip_p4(&self.pt, &self.eta, &self.phi, &self.mass)
    }
}
