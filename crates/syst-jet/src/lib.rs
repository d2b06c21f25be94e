#![deny(missing_docs)]
#![doc = "Staged jet energy corrections and the JES/JER uncertainty matrix for jets and fat jets."]

/// Uncertainty catalog construction.
pub mod catalog;
/// Collection configuration.
pub mod config;
/// Forward horn exclusion.
pub mod horn;
/// Per-event inputs.
pub mod inputs;
/// Systematic variant construction.
pub mod matrix;
/// Data periods and compound layouts.
pub mod period;
/// Staged nominal correction.
pub mod pipeline;
/// Provider entry point.
pub mod provider;
/// Hybrid resolution smearing.
pub mod smear;

pub use catalog::{CatalogEntry, UncertaintyCatalog};
pub use config::{JetCorrectionConfig, UncertaintyMode};
pub use horn::RegionExclusionPolicy;
pub use inputs::{EventContext, JetInputs};
pub use matrix::UncertaintyMatrixBuilder;
pub use period::{CompoundLayout, DataPeriod, DataTagRule};
pub use pipeline::{AuxiliaryState, NominalJets, StagedCorrectionPipeline};
pub use provider::{JetCorrectionProvider, JetVariations};
