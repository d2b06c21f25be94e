#![deny(missing_docs)]
#![doc = "Muon momentum scale and resolution (ScaRe) corrections with their systematic variations."]

/// Table keys, thresholds and switches.
pub mod config;
/// Nominal ScaRe correction and the scale/resolution variations.
pub mod corrector;
/// Per-event muon arrays.
pub mod inputs;

pub use config::{MuonScaReConfig, ScaReKeys};
pub use corrector::{MomentumScaleResolutionCorrector, MuonAux, MuonVariations};
pub use inputs::MuonInputs;
