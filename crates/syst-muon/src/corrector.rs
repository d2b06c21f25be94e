use std::sync::Arc;

use serde::{Deserialize, Serialize};
use syst_core::errors::SystError;
use syst_core::sampler::{CrystalBallShape, DeterministicSampler, SeedKey};
use syst_core::sanity::{check_corrected, sanitize_pt, DomainTally, DomainWarning};
use syst_core::table::{CorrectionArg, CorrectionTable};
use syst_core::{args, PtEtaPhiM, ResultMatrix, SampleKind, UncScale, UncSource};
use tracing::{debug, info};

use crate::config::MuonScaReConfig;
use crate::inputs::MuonInputs;

/// Per-muon quantities of the nominal pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuonAux {
    /// Pt after the scale correction, before smearing.
    pub scaled_pt: f64,
    /// Residual resolution scale `k`; zero when smearing was not run.
    pub k: f64,
    /// `std * draw` of the accepted smear; zero when smearing was skipped or rejected.
    pub smear_width: f64,
}

impl MuonAux {
    /// Ratio of the nominal pt to the scaled pt.
    pub fn smear_ratio(&self) -> f64 {
        1.0 + self.k * self.smear_width
    }
}

/// Corrected muons of one event with all variants.
#[derive(Debug, Clone, PartialEq)]
pub struct MuonVariations {
    /// Central and shifted collections.
    pub matrix: ResultMatrix,
    /// Per-object state of the nominal pass.
    pub aux: Vec<MuonAux>,
    /// Domain warnings raised in the event.
    pub tally: DomainTally,
}

/// Muon momentum scale and resolution corrector.
///
/// Data is scale-corrected only. Simulation is scale-corrected, then smeared
/// with a Crystal Ball draw seeded by `(event, lumi, phi)`, and gets the
/// `ScaRe_Scale` and `ScaRe_Resolution` variations.
#[derive(Clone)]
pub struct MomentumScaleResolutionCorrector {
    table: Arc<dyn CorrectionTable>,
    config: MuonScaReConfig,
    sample: SampleKind,
}

impl std::fmt::Debug for MomentumScaleResolutionCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MomentumScaleResolutionCorrector")
            .field("config", &self.config)
            .field("sample", &self.sample)
            .finish_non_exhaustive()
    }
}

impl MomentumScaleResolutionCorrector {
    /// Builds the corrector and checks that every table it reads exists.
    pub fn new(
        config: MuonScaReConfig,
        sample: SampleKind,
        table: Arc<dyn CorrectionTable>,
    ) -> Result<Self, SystError> {
        for key in config.keys.required(sample) {
            if !table.contains(key) {
                return Err(SystError::configuration(
                    "missing_correction",
                    "correction required by the muon ScaRe corrector not found",
                )
                .with_context("key", key));
            }
        }
        info!(
            sample = ?sample,
            low_pt_threshold = config.low_pt_threshold,
            variations = config.return_variations && !sample.is_data(),
            "muon ScaRe corrector ready"
        );
        Ok(Self {
            table,
            config,
            sample,
        })
    }

    /// Non-central sources this corrector emits.
    pub fn sources(&self) -> Vec<UncSource> {
        if self.sample.is_data() || !self.config.return_variations {
            Vec::new()
        } else {
            vec![UncSource::MuonScale, UncSource::MuonResolution]
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &MuonScaReConfig {
        &self.config
    }

    fn eval(&self, key: &str, values: &[CorrectionArg], object: usize) -> Result<f64, SystError> {
        self.table.evaluate(key, values).map_err(|err| {
            err.into_configuration(key)
                .with_context("object", object.to_string())
        })
    }

    /// Scale-corrected pt; muons below the threshold are returned unchanged.
    fn scaled_pt(
        &self,
        pt: f64,
        eta: f64,
        phi: f64,
        charge: i32,
        object: usize,
    ) -> Result<f64, SystError> {
        if pt < self.config.low_pt_threshold {
            return Ok(pt);
        }
        let (a_key, m_key) = self.config.keys.scale_keys(self.sample);
        let a = self.eval(a_key, &args![eta, phi, "nom"], object)?;
        let m = self.eval(m_key, &args![eta, phi, "nom"], object)?;
        Ok(1.0 / (m / pt + f64::from(charge) * a))
    }

    fn resolution_k(&self, abs_eta: f64, object: usize) -> Result<f64, SystError> {
        let keys = &self.config.keys;
        let k_data = self.eval(&keys.k_data, &args![abs_eta, "nom"], object)?;
        let k_mc = self.eval(&keys.k_mc, &args![abs_eta, "nom"], object)?;
        Ok(if k_mc < k_data {
            (k_data * k_data - k_mc * k_mc).sqrt()
        } else {
            0.0
        })
    }

    fn layer_params<const N: usize>(
        &self,
        key: &str,
        abs_eta: f64,
        layers: f64,
        object: usize,
    ) -> Result<[f64; N], SystError> {
        let mut params = [0.0; N];
        for (index, param) in params.iter_mut().enumerate() {
            *param = self.eval(key, &args![abs_eta, layers, index as i64], object)?;
        }
        Ok(params)
    }

    /// Nominal smearing of one muon; returns the smeared pt and its aux state.
    fn smear(
        &self,
        scaled_pt: f64,
        muon: &PtEtaPhiM,
        layers: u8,
        key: SeedKey,
        object: usize,
        tally: &mut DomainTally,
    ) -> Result<(f64, MuonAux), SystError> {
        let mut aux = MuonAux {
            scaled_pt,
            k: 0.0,
            smear_width: 0.0,
        };
        if scaled_pt < self.config.low_pt_threshold {
            tally.record(DomainWarning::BelowThreshold);
            return Ok((scaled_pt, aux));
        }
        if scaled_pt > self.config.max_pt {
            tally.record(DomainWarning::AboveThreshold);
            return Ok((scaled_pt, aux));
        }

        let abs_eta = muon.eta.abs();
        let layers = f64::from(layers);
        let keys = &self.config.keys;
        let [mean, sigma, n, alpha] =
            self.layer_params::<4>(&keys.cb_params, abs_eta, layers, object)?;
        let shape = CrystalBallShape::new(mean, sigma, alpha, n);
        let sampler = match DeterministicSampler::new(shape) {
            Ok(sampler) => sampler,
            Err(err) => {
                debug!(object, error = %err, "unusable smearing shape, keeping scaled pt");
                tally.record(DomainWarning::InvalidShape);
                return Ok((scaled_pt, aux));
            }
        };
        let draw = sampler.draw(key);
        let [p0, p1, p2] = self.layer_params::<3>(&keys.poly_params, abs_eta, layers, object)?;
        let std = (p0 + p1 * scaled_pt + p2 * scaled_pt * scaled_pt).max(0.0);
        let k = self.resolution_k(abs_eta, object)?;

        let width = std * draw;
        let smeared = scaled_pt * (1.0 + k * width);
        if check_corrected(scaled_pt, smeared).is_none() {
            aux.k = k;
            aux.smear_width = width;
            return Ok((smeared, aux));
        }
        Ok((sanitize_pt(scaled_pt, smeared, scaled_pt, tally), aux))
    }

    fn scale_variant(
        &self,
        inputs: &MuonInputs,
        i: usize,
        central_pt: f64,
        aux: &MuonAux,
        scale: UncScale,
        tally: &mut DomainTally,
    ) -> Result<f64, SystError> {
        let pt = aux.scaled_pt;
        if inputs.pt[i] < self.config.low_pt_threshold {
            return Ok(central_pt);
        }
        let (eta, phi, q) = (inputs.eta[i], inputs.phi[i], f64::from(inputs.charge[i]));
        let keys = &self.config.keys;
        let a_s = self.eval(&keys.a_mc, &args![eta, phi, "stat"], i)?;
        let m_s = self.eval(&keys.m_mc, &args![eta, phi, "stat"], i)?;
        let rho = self.eval(&keys.m_mc, &args![eta, phi, "rho_stat"], i)?;
        let unc = pt
            * pt
            * (m_s * m_s / (pt * pt) + a_s * a_s + 2.0 * q * rho * m_s * a_s / pt).sqrt();
        let shifted = (pt + scale.signf() * unc) * aux.smear_ratio();
        Ok(sanitize_pt(central_pt, shifted, central_pt, tally))
    }

    fn resolution_variant(
        &self,
        inputs: &MuonInputs,
        i: usize,
        central_pt: f64,
        aux: &MuonAux,
        scale: UncScale,
        tally: &mut DomainTally,
    ) -> Result<f64, SystError> {
        if aux.k == 0.0 || aux.smear_width == 0.0 {
            return Ok(central_pt);
        }
        let k_unc = self.eval(&self.config.keys.k_mc, &args![inputs.eta[i].abs(), "stat"], i)?;
        let pt = aux.scaled_pt;
        let shifted = pt * (1.0 + (aux.k + scale.signf() * k_unc) * aux.smear_width);
        Ok(sanitize_pt(pt, shifted, pt, tally))
    }

    /// Nominal correction and all variants for one event.
    pub fn correct(
        &self,
        inputs: &MuonInputs,
        event: u64,
        lumi: u64,
    ) -> Result<MuonVariations, SystError> {
        inputs.validate()?;
        let mut tally = DomainTally::new();
        let stored = inputs.stored_p4();
        let mut central = Vec::with_capacity(stored.len());
        let mut aux = Vec::with_capacity(stored.len());

        for (i, muon) in stored.iter().enumerate() {
            let scaled = self.scaled_pt(muon.pt, muon.eta, muon.phi, inputs.charge[i], i)?;
            let (pt, state) = match self.sample {
                SampleKind::Data => (
                    scaled,
                    MuonAux {
                        scaled_pt: scaled,
                        k: 0.0,
                        smear_width: 0.0,
                    },
                ),
                SampleKind::Simulation => self.smear(
                    scaled,
                    muon,
                    inputs.n_tracker_layers[i],
                    SeedKey::new(event, lumi, muon.phi),
                    i,
                    &mut tally,
                )?,
            };
            central.push(muon.with_pt(pt));
            aux.push(state);
        }

        let mut matrix = ResultMatrix::new(central.clone());
        for source in self.sources() {
            for scale in UncScale::VARIATIONS {
                let mut shifted = Vec::with_capacity(central.len());
                for (i, nominal) in central.iter().enumerate() {
                    let pt = match source {
                        UncSource::MuonScale => {
                            self.scale_variant(inputs, i, nominal.pt, &aux[i], scale, &mut tally)?
                        }
                        _ => self.resolution_variant(
                            inputs,
                            i,
                            nominal.pt,
                            &aux[i],
                            scale,
                            &mut tally,
                        )?,
                    };
                    shifted.push(nominal.with_pt(pt));
                }
                matrix.insert(source, scale, shifted)?;
            }
        }

        if !tally.is_empty() {
            debug!(event, warnings = tally.total(), "muon ScaRe corrections rejected");
        }
        Ok(MuonVariations { matrix, aux, tally })
    }
}
