use std::sync::Arc;

use serde::{Deserialize, Serialize};
use syst_core::errors::{ensure_aligned, SystError};
use syst_core::sanity::sanitize_factor;
use syst_core::table::CorrectionTable;
use syst_core::{
    args, zip_p4, ApplicabilityTable, Collection, DomainTally, ObjectTraits, PtEtaPhiM,
    ResultMatrix, SampleKind, UncScale, UncSource,
};
use tracing::{debug, info};

use crate::{default_true, LeptonVariations};

/// Sources split by decay mode and generator match, in emission order.
pub const TAU_ES_SOURCES: [UncSource; 6] = [
    UncSource::TauEsDm0,
    UncSource::TauEsDm1,
    UncSource::TauEs3prong,
    UncSource::EleFakingTauEsDm0,
    UncSource::EleFakingTauEsDm1,
    UncSource::MuFakingTauEs,
];

fn default_decay_modes() -> Vec<i32> {
    vec![0, 1, 10, 11]
}

/// Tau energy-scale configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TauScaleConfig {
    /// Correction evaluated as `(pt, eta, dm, genmatch, id, "nom"|"up"|"down")`.
    pub es_key: String,
    /// Identification algorithm name passed to the correction.
    pub id: String,
    /// Decay modes the correction is defined for.
    #[serde(default = "default_decay_modes")]
    pub decay_modes: Vec<i32>,
    /// Produce the split variations for simulation.
    #[serde(default = "default_true")]
    pub return_variations: bool,
}

impl TauScaleConfig {
    /// Configuration with the standard decay modes and variations enabled.
    pub fn new(es_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            es_key: es_key.into(),
            id: id.into(),
            decay_modes: default_decay_modes(),
            return_variations: true,
        }
    }
}

/// Hadronic tau arrays of one event, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TauInputs {
    /// Transverse momentum.
    pub pt: Vec<f64>,
    /// Pseudorapidity.
    pub eta: Vec<f64>,
    /// Azimuth.
    pub phi: Vec<f64>,
    /// Mass.
    pub mass: Vec<f64>,
    /// Reconstructed decay mode.
    pub decay_mode: Vec<i32>,
    /// Generator lepton match code (0 to 6).
    pub gen_match: Vec<i32>,
}

impl TauInputs {
    /// Number of taus.
    pub fn len(&self) -> usize {
        self.pt.len()
    }

    /// True for an event without taus.
    pub fn is_empty(&self) -> bool {
        self.pt.is_empty()
    }

    /// Checks array alignment.
    pub fn validate(&self) -> Result<(), SystError> {
        let n = self.len();
        ensure_aligned("eta", n, self.eta.len())?;
        ensure_aligned("phi", n, self.phi.len())?;
        ensure_aligned("mass", n, self.mass.len())?;
        ensure_aligned("decay_mode", n, self.decay_mode.len())?;
        ensure_aligned("gen_match", n, self.gen_match.len())
    }

    /// Four-vectors as stored.
    pub fn stored_p4(&self) -> Collection {
        zip_p4(&self.pt, &self.eta, &self.phi, &self.mass)
    }
}

/// Tau energy-scale provider.
///
/// In simulation the nominal is the stored four-vector scaled by the `"nom"`
/// value for genuine taus and light-lepton fakes in a supported decay mode.
/// Each split source scales only the taus its rule selects and leaves the
/// rest at their central value.
#[derive(Clone)]
pub struct TauScaleProvider {
    table: Arc<dyn CorrectionTable>,
    config: TauScaleConfig,
    sample: SampleKind,
    applicability: ApplicabilityTable,
}

impl std::fmt::Debug for TauScaleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TauScaleProvider")
            .field("config", &self.config)
            .field("sample", &self.sample)
            .finish_non_exhaustive()
    }
}

impl TauScaleProvider {
    /// Builds the provider with the standard applicability rules.
    pub fn new(
        config: TauScaleConfig,
        sample: SampleKind,
        table: Arc<dyn CorrectionTable>,
    ) -> Result<Self, SystError> {
        if !sample.is_data() && !table.contains(&config.es_key) {
            return Err(SystError::configuration(
                "missing_correction",
                "tau energy-scale correction not found",
            )
            .with_context("key", config.es_key.as_str()));
        }
        info!(
            sample = ?sample,
            id = %config.id,
            decay_modes = ?config.decay_modes,
            "tau ES provider ready"
        );
        Ok(Self {
            table,
            config,
            sample,
            applicability: ApplicabilityTable::standard(),
        })
    }

    /// Non-central sources this provider emits.
    pub fn sources(&self) -> Vec<UncSource> {
        if self.sample.is_data() || !self.config.return_variations {
            Vec::new()
        } else {
            TAU_ES_SOURCES.to_vec()
        }
    }

    fn corrected(&self, inputs: &TauInputs, i: usize) -> bool {
        (1..=5).contains(&inputs.gen_match[i])
            && self.config.decay_modes.contains(&inputs.decay_mode[i])
    }

    fn factor(
        &self,
        tau: &PtEtaPhiM,
        inputs: &TauInputs,
        i: usize,
        variation: &str,
    ) -> Result<f64, SystError> {
        let values = args![
            tau.pt,
            tau.eta,
            inputs.decay_mode[i],
            inputs.gen_match[i],
            self.config.id.as_str(),
            variation
        ];
        self.table
            .evaluate(&self.config.es_key, &values)
            .map_err(|err| {
                err.into_configuration(&self.config.es_key)
                    .with_context("variation", variation)
                    .with_context("object", i.to_string())
            })
    }

    /// Central and split variants for one event.
    pub fn correct(&self, inputs: &TauInputs) -> Result<LeptonVariations, SystError> {
        inputs.validate()?;
        let stored = inputs.stored_p4();
        let mut tally = DomainTally::new();

        let central: Collection = if self.sample.is_data() {
            stored.clone()
        } else {
            stored
                .iter()
                .enumerate()
                .map(|(i, tau)| {
                    if !self.corrected(inputs, i) {
                        return Ok(*tau);
                    }
                    let factor = self.factor(tau, inputs, i, "nom")?;
                    Ok(tau.scaled(sanitize_factor(tau.pt, factor, &mut tally)))
                })
                .collect::<Result<_, SystError>>()?
        };

        let mut matrix = ResultMatrix::new(central.clone());
        for source in self.sources() {
            for scale in UncScale::VARIATIONS {
                let variation = match scale {
                    UncScale::Up => "up",
                    _ => "down",
                };
                let mut shifted = Vec::with_capacity(stored.len());
                for (i, tau) in stored.iter().enumerate() {
                    let traits = ObjectTraits::tau(inputs.gen_match[i], inputs.decay_mode[i]);
                    if !self.corrected(inputs, i) || !self.applicability.applies(source, &traits) {
                        shifted.push(central[i]);
                        continue;
                    }
                    let factor = self.factor(tau, inputs, i, variation)?;
                    shifted.push(tau.scaled(sanitize_factor(tau.pt, factor, &mut tally)));
                }
                matrix.insert(source, scale, shifted)?;
            }
        }

        if !tally.is_empty() {
            debug!(warnings = tally.total(), "tau ES factors rejected");
        }
        Ok(LeptonVariations { matrix, tally })
    }
}
