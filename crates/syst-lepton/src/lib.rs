#![deny(missing_docs)]
#![doc = "Energy-scale variations for electrons and hadronic taus."]

/// Electron energy-scale uncertainty.
pub mod electron;
/// Hadronic tau energy scale and its decay-mode split variations.
pub mod tau;

use syst_core::{DomainTally, ResultMatrix};

pub use electron::{ElectronInputs, ElectronScaleConfig, ElectronScaleProvider};
pub use tau::{TauInputs, TauScaleConfig, TauScaleProvider, TAU_ES_SOURCES};

/// Corrected leptons of one event with all variants.
#[derive(Debug, Clone, PartialEq)]
pub struct LeptonVariations {
    /// Central and shifted collections.
    pub matrix: ResultMatrix,
    /// Domain warnings raised in the event.
    pub tally: DomainTally,
}

pub(crate) fn default_true() -> bool {
    true
}
