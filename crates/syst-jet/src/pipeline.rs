//! Staged nominal correction: raw-factor removal, resolution smearing and
//! compound residual correction.

use serde::{Deserialize, Serialize};
use syst_core::errors::SystError;
use syst_core::sampler::{DeterministicSampler, SeedKey};
use syst_core::table::{CorrectionArg, CorrectionTable};
use syst_core::{args, Collection, DomainTally, PtEtaPhiM, SampleKind};
use tracing::debug;

use crate::config::JetCorrectionConfig;
use crate::horn::RegionExclusionPolicy;
use crate::inputs::{EventContext, JetInputs};
use crate::period::CompoundLayout;
use crate::smear::smear_factor;

/// Per-object quantities retained for the variation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryState {
    /// Relative pt resolution; zero when smearing was not run.
    pub resolution: f64,
    /// Applied smear factor; one when smearing was not run or was suppressed.
    pub smear_factor: f64,
    /// Inside the horn exclusion region.
    pub in_horn: bool,
}

impl Default for AuxiliaryState {
    fn default() -> Self {
        Self {
            resolution: 0.0,
            smear_factor: 1.0,
            in_horn: false,
        }
    }
}

/// Output of the staged correction for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalJets {
    /// Corrected four-vectors, index-aligned with the inputs.
    pub p4: Collection,
    /// Per-object auxiliary state.
    pub aux: Vec<AuxiliaryState>,
    /// Domain warnings raised while smearing.
    pub tally: DomainTally,
}

fn stage_error(err: SystError, key: &str, stage: &str, object: usize) -> SystError {
    err.into_configuration(key)
        .with_context("stage", stage)
        .with_context("object", object.to_string())
}

/// Nominal jet correction chain for one collection.
#[derive(Debug, Clone)]
pub struct StagedCorrectionPipeline {
    sample: SampleKind,
    apply_jer: bool,
    apply_compound: bool,
    jer_sf_key: String,
    jer_resolution_key: String,
    compound_key: String,
    layout: CompoundLayout,
    horn: RegionExclusionPolicy,
    sampler: DeterministicSampler,
}

impl StagedCorrectionPipeline {
    /// Builds the pipeline; fails on an invalid smearing shape or data tag.
    pub fn new(
        config: &JetCorrectionConfig,
        sample: SampleKind,
        sample_name: &str,
    ) -> Result<Self, SystError> {
        config.horn.announce();
        Ok(Self {
            sample,
            apply_jer: config.apply_jer && !sample.is_data(),
            apply_compound: config.apply_compound,
            jer_sf_key: config.jer_sf_key(),
            jer_resolution_key: config.jer_resolution_key(),
            compound_key: config.compound_key(sample, sample_name)?,
            layout: config.layout(sample),
            horn: config.horn,
            sampler: DeterministicSampler::new(config.smear_shape)?,
        })
    }

    /// True if smearing runs for this sample.
    pub fn applies_jer(&self) -> bool {
        self.apply_jer
    }

    /// True if the compound correction runs.
    pub fn applies_compound(&self) -> bool {
        self.apply_compound
    }

    /// Keys this pipeline evaluates.
    pub fn required_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        if self.apply_jer {
            keys.push(self.jer_sf_key.as_str());
            keys.push(self.jer_resolution_key.as_str());
        }
        if self.apply_compound {
            keys.push(self.compound_key.as_str());
        }
        keys
    }

    /// Exclusion policy used by this pipeline.
    pub fn horn(&self) -> &RegionExclusionPolicy {
        &self.horn
    }

    /// Sample kind the pipeline was built for.
    pub fn sample(&self) -> SampleKind {
        self.sample
    }

    fn scale_factor_and_resolution(
        &self,
        table: &dyn CorrectionTable,
        eta: f64,
        pt: f64,
        rho: f64,
        object: usize,
    ) -> Result<(f64, f64), SystError> {
        let sf = table
            .evaluate(&self.jer_sf_key, &args![eta, pt, "nom"])
            .map_err(|err| stage_error(err, &self.jer_sf_key, "jer_scale_factor", object))?;
        let res = table
            .evaluate(&self.jer_resolution_key, &args![eta, pt, rho])
            .map_err(|err| stage_error(err, &self.jer_resolution_key, "jer_resolution", object))?;
        Ok((sf, res))
    }

    fn compound_args(&self, p4: &PtEtaPhiM, area: f64, ctx: &EventContext) -> Vec<CorrectionArg> {
        let mut values = args![area, p4.eta, p4.pt, ctx.rho];
        if self.layout.with_phi {
            values.push(CorrectionArg::from(p4.phi));
        }
        if self.layout.with_run {
            values.push(CorrectionArg::from(f64::from(ctx.run)));
        }
        values
    }

    /// Runs the staged correction for every object of the event.
    pub fn run(
        &self,
        table: &dyn CorrectionTable,
        inputs: &JetInputs,
        ctx: &EventContext,
    ) -> Result<NominalJets, SystError> {
        inputs.validate()?;
        let mut tally = DomainTally::new();
        let mut p4 = Vec::with_capacity(inputs.len());
        let mut aux = Vec::with_capacity(inputs.len());

        for (i, mut jet) in inputs.stored_p4().into_iter().enumerate() {
            let mut state = AuxiliaryState {
                in_horn: self.horn.suppresses(jet.eta, inputs.is_gen_matched(i)),
                ..AuxiliaryState::default()
            };

            if self.apply_compound {
                jet = jet.scaled(1.0 - inputs.raw_factor[i]);
            }

            if self.apply_jer {
                let (sf, res) =
                    self.scale_factor_and_resolution(table, jet.eta, jet.pt, ctx.rho, i)?;
                state.resolution = res;
                if !state.in_horn {
                    let key = SeedKey::new(ctx.event, ctx.lumi, jet.phi);
                    state.smear_factor = smear_factor(
                        jet.pt,
                        inputs.gen_pt(i),
                        res,
                        sf,
                        || self.sampler.draw(key),
                        &mut tally,
                    );
                    jet = jet.scaled(state.smear_factor);
                }
            }

            if self.apply_compound {
                let values = self.compound_args(&jet, inputs.area[i], ctx);
                let factor = table
                    .compound_evaluate(&self.compound_key, &values)
                    .map_err(|err| stage_error(err, &self.compound_key, "compound", i))?;
                jet = jet.scaled(factor);
            }

            p4.push(jet);
            aux.push(state);
        }

        if !tally.is_empty() {
            debug!(
                event = ctx.event,
                warnings = tally.total(),
                "jet smearing factors rejected"
            );
        }
        Ok(NominalJets { p4, aux, tally })
    }

    /// Relative pt resolution per object after raw-factor removal; no smearing.
    pub fn resolutions(
        &self,
        table: &dyn CorrectionTable,
        inputs: &JetInputs,
        ctx: &EventContext,
    ) -> Result<Vec<f64>, SystError> {
        inputs.validate()?;
        inputs
            .stored_p4()
            .into_iter()
            .enumerate()
            .map(|(i, jet)| {
                let jet = jet.scaled(1.0 - inputs.raw_factor[i]);
                table
                    .evaluate(&self.jer_resolution_key, &args![jet.eta, jet.pt, ctx.rho])
                    .map_err(|err| {
                        stage_error(err, &self.jer_resolution_key, "jer_resolution", i)
                    })
            })
            .collect()
    }
}
