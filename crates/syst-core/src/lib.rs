#![deny(missing_docs)]
#![doc = "Core types for systematic momentum variations: error taxonomy, correction-table contract, deterministic sampling and the result matrix."]

pub mod applicability;
pub mod errors;
pub mod kinematics;
pub mod matrix;
pub mod provenance;
pub mod rng;
pub mod sampler;
pub mod sanity;
pub mod table;
pub mod uncertainty;
pub mod variations;

pub use applicability::{ApplicabilityTable, GenLeptonMatch, ObjectTraits};
pub use errors::{ensure_aligned, ErrorInfo, SystError};
pub use kinematics::{shift_met, zip_p4, Collection, PtEtaPhiM};
pub use matrix::ResultMatrix;
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{object_seed, EventRng};
pub use sampler::{
    deterministic_draw, CrystalBall, CrystalBallShape, DeterministicSampler, SeedKey,
};
pub use sanity::{DomainTally, DomainWarning};
pub use table::{CorrectionArg, CorrectionTable};
pub use uncertainty::{split_syst_name, syst_label, syst_name, SampleKind, UncScale, UncSource};
pub use variations::VariationSet;
