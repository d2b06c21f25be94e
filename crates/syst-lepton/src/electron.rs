use std::sync::Arc;

use serde::{Deserialize, Serialize};
use syst_core::errors::{ensure_aligned, SystError};
use syst_core::sanity::sanitize_factor;
use syst_core::table::CorrectionTable;
use syst_core::{
    args, zip_p4, ApplicabilityTable, Collection, DomainTally, ObjectTraits, ResultMatrix,
    SampleKind, UncScale, UncSource,
};
use tracing::{debug, info};

use crate::{default_true, LeptonVariations};

/// Electron energy-scale configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronScaleConfig {
    /// Correction evaluated as `("total_uncertainty", seedGain, run, eta, r9, pt)`.
    pub es_key: String,
    /// Produce the `EleES` variations for simulation.
    #[serde(default = "default_true")]
    pub return_variations: bool,
}

impl ElectronScaleConfig {
    /// Configuration with variations enabled.
    pub fn new(es_key: impl Into<String>) -> Self {
        Self {
            es_key: es_key.into(),
            return_variations: true,
        }
    }
}

/// Electron arrays of one event, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectronInputs {
    /// Transverse momentum.
    pub pt: Vec<f64>,
    /// Pseudorapidity.
    pub eta: Vec<f64>,
    /// Azimuth.
    pub phi: Vec<f64>,
    /// Mass.
    pub mass: Vec<f64>,
    /// Generator lepton match code (0 to 6).
    pub gen_match: Vec<i32>,
    /// ECAL seed crystal gain.
    pub seed_gain: Vec<u8>,
    /// Shower shape variable R9.
    pub r9: Vec<f64>,
}

impl ElectronInputs {
    /// Number of electrons.
    pub fn len(&self) -> usize {
        self.pt.len()
    }

    /// True for an event without electrons.
    pub fn is_empty(&self) -> bool {
        self.pt.is_empty()
    }

    /// Checks array alignment.
    pub fn validate(&self) -> Result<(), SystError> {
        let n = self.len();
        ensure_aligned("eta", n, self.eta.len())?;
        ensure_aligned("phi", n, self.phi.len())?;
        ensure_aligned("mass", n, self.mass.len())?;
        ensure_aligned("gen_match", n, self.gen_match.len())?;
        ensure_aligned("seed_gain", n, self.seed_gain.len())?;
        ensure_aligned("r9", n, self.r9.len())
    }

    /// Four-vectors as stored.
    pub fn stored_p4(&self) -> Collection {
        zip_p4(&self.pt, &self.eta, &self.phi, &self.mass)
    }
}

/// Electron energy-scale provider. The nominal is left unchanged.
#[derive(Clone)]
pub struct ElectronScaleProvider {
    table: Arc<dyn CorrectionTable>,
    config: ElectronScaleConfig,
    sample: SampleKind,
    applicability: ApplicabilityTable,
}

impl std::fmt::Debug for ElectronScaleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElectronScaleProvider")
            .field("config", &self.config)
            .field("sample", &self.sample)
            .finish_non_exhaustive()
    }
}

impl ElectronScaleProvider {
    /// Builds the provider; simulation requires `es_key` in `table`.
    pub fn new(
        config: ElectronScaleConfig,
        sample: SampleKind,
        table: Arc<dyn CorrectionTable>,
    ) -> Result<Self, SystError> {
        let provider = Self {
            table,
            config,
            sample,
            applicability: ApplicabilityTable::standard(),
        };
        if !provider.sources().is_empty() && !provider.table.contains(&provider.config.es_key) {
            return Err(SystError::configuration(
                "missing_correction",
                "electron energy-scale correction not found",
            )
            .with_context("key", provider.config.es_key.as_str()));
        }
        info!(
            sample = ?sample,
            sources = provider.sources().len(),
            "electron ES provider ready"
        );
        Ok(provider)
    }

    /// Non-central sources this provider emits.
    pub fn sources(&self) -> Vec<UncSource> {
        if self.sample.is_data() || !self.config.return_variations {
            Vec::new()
        } else {
            vec![UncSource::EleEs]
        }
    }

    /// Central and `EleES` variants for one event.
    pub fn correct(
        &self,
        inputs: &ElectronInputs,
        run: u32,
    ) -> Result<LeptonVariations, SystError> {
        inputs.validate()?;
        let central = inputs.stored_p4();
        let mut matrix = ResultMatrix::new(central.clone());
        let mut tally = DomainTally::new();

        for source in self.sources() {
            let mut uncertainties = Vec::with_capacity(central.len());
            for (i, electron) in central.iter().enumerate() {
                let traits = ObjectTraits::lepton(inputs.gen_match[i]);
                if !self.applicability.applies(source, &traits) {
                    uncertainties.push(None);
                    continue;
                }
                let values = args![
                    "total_uncertainty",
                    i64::from(inputs.seed_gain[i]),
                    f64::from(run),
                    electron.eta,
                    inputs.r9[i],
                    electron.pt
                ];
                let unc = self.table.evaluate(&self.config.es_key, &values).map_err(|err| {
                    err.into_configuration(&self.config.es_key)
                        .with_context("source", source.name())
                        .with_context("object", i.to_string())
                })?;
                uncertainties.push(Some(unc));
            }
            for scale in UncScale::VARIATIONS {
                let shifted = central
                    .iter()
                    .zip(&uncertainties)
                    .map(|(electron, unc)| match unc {
                        Some(unc) => {
                            let factor = 1.0 + scale.signf() * unc;
                            electron.scaled(sanitize_factor(electron.pt, factor, &mut tally))
                        }
                        None => *electron,
                    })
                    .collect();
                matrix.insert(source, scale, shifted)?;
            }
        }

        if !tally.is_empty() {
            debug!(run, warnings = tally.total(), "electron ES shifts rejected");
        }
        Ok(LeptonVariations { matrix, tally })
    }
}
