//! Per-event jet and event-level inputs as read from the event record.

use serde::{Deserialize, Serialize};
use syst_core::errors::{ensure_aligned, ErrorInfo, SystError};
use syst_core::{zip_p4, Collection, ObjectTraits};

/// Event-level quantities shared by every object of the event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventContext {
    /// Event number.
    pub event: u64,
    /// Luminosity block.
    pub lumi: u64,
    /// Run number.
    #[serde(default)]
    pub run: u32,
    /// Pileup energy density.
    pub rho: f64,
}

/// Parallel per-object arrays of one jet collection.
///
/// Generator and flavour arrays may be empty (data); when present they must
/// have one entry per jet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JetInputs {
    /// Transverse momentum as stored.
    pub pt: Vec<f64>,
    /// Pseudorapidity.
    pub eta: Vec<f64>,
    /// Azimuth.
    pub phi: Vec<f64>,
    /// Mass as stored.
    pub mass: Vec<f64>,
    /// Fraction removed to recover the uncorrected momentum.
    pub raw_factor: Vec<f64>,
    /// Jet catchment area.
    pub area: Vec<f64>,
    /// Index into `gen_jet_pt`, `-1` when unmatched.
    #[serde(default)]
    pub gen_jet_idx: Vec<i32>,
    /// Generator-level jet momenta.
    #[serde(default)]
    pub gen_jet_pt: Vec<f64>,
    /// Hadron flavour per jet.
    #[serde(default)]
    pub hadron_flavour: Vec<i32>,
    /// Parton flavour per jet.
    #[serde(default)]
    pub parton_flavour: Vec<i32>,
}

impl JetInputs {
    /// Number of jets.
    pub fn len(&self) -> usize {
        self.pt.len()
    }

    /// True for an event without jets.
    pub fn is_empty(&self) -> bool {
        self.pt.is_empty()
    }

    /// Checks array alignment and generator indices.
    pub fn validate(&self) -> Result<(), SystError> {
        let n = self.len();
        ensure_aligned("eta", n, self.eta.len())?;
        ensure_aligned("phi", n, self.phi.len())?;
        ensure_aligned("mass", n, self.mass.len())?;
        ensure_aligned("raw_factor", n, self.raw_factor.len())?;
        ensure_aligned("area", n, self.area.len())?;
        for (field, len) in [
            ("gen_jet_idx", self.gen_jet_idx.len()),
            ("hadron_flavour", self.hadron_flavour.len()),
            ("parton_flavour", self.parton_flavour.len()),
        ] {
            if len != 0 {
                ensure_aligned(field, n, len)?;
            }
        }
        for (i, idx) in self.gen_jet_idx.iter().enumerate() {
            let dangling = *idx < -1 || (*idx >= 0 && *idx as usize >= self.gen_jet_pt.len());
            if dangling {
                return Err(SystError::Input(
                    ErrorInfo::new("dangling_gen_index", "generator index out of range")
                        .with_context("object", i.to_string())
                        .with_context("index", idx.to_string())
                        .with_context("gen_jets", self.gen_jet_pt.len().to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Matched generator pt of jet `i`.
    pub fn gen_pt(&self, i: usize) -> Option<f64> {
        let idx = *self.gen_jet_idx.get(i)?;
        usize::try_from(idx)
            .ok()
            .and_then(|idx| self.gen_jet_pt.get(idx).copied())
    }

    /// True if jet `i` has a generator match.
    pub fn is_gen_matched(&self, i: usize) -> bool {
        self.gen_jet_idx.get(i).is_some_and(|idx| *idx >= 0)
    }

    /// Flavour traits of jet `i`.
    pub fn traits(&self, i: usize) -> ObjectTraits {
        ObjectTraits::jet(
            self.hadron_flavour.get(i).copied().unwrap_or(0),
            self.parton_flavour.get(i).copied().unwrap_or(0),
        )
    }

    /// Four-vectors as stored, before any correction.
    pub fn stored_p4(&self) -> Collection {
        zip_p4(&self.pt, &self.eta, &self.phi, &self.mass)
    }
}
