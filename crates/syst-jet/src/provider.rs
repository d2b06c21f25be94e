//! Entry point tying the nominal pipeline and the variant builder to one
//! correction table.

use std::sync::Arc;

use syst_core::errors::SystError;
use syst_core::table::CorrectionTable;
use syst_core::{ApplicabilityTable, DomainTally, ResultMatrix, SampleKind, UncSource};
use tracing::info;

use crate::catalog::UncertaintyCatalog;
use crate::config::JetCorrectionConfig;
use crate::inputs::{EventContext, JetInputs};
use crate::matrix::UncertaintyMatrixBuilder;
use crate::pipeline::{AuxiliaryState, StagedCorrectionPipeline};

/// Corrected jets of one event with all variants.
#[derive(Debug, Clone, PartialEq)]
pub struct JetVariations {
    /// Central and shifted collections.
    pub matrix: ResultMatrix,
    /// Per-object auxiliary state of the nominal pass.
    pub aux: Vec<AuxiliaryState>,
    /// Domain warnings raised in the event.
    pub tally: DomainTally,
}

/// Jet correction provider for one collection, shared read-only across events.
#[derive(Clone)]
pub struct JetCorrectionProvider {
    table: Arc<dyn CorrectionTable>,
    pipeline: StagedCorrectionPipeline,
    builder: UncertaintyMatrixBuilder,
    year: String,
}

impl std::fmt::Debug for JetCorrectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JetCorrectionProvider")
            .field("pipeline", &self.pipeline)
            .field("builder", &self.builder)
            .field("year", &self.year)
            .finish_non_exhaustive()
    }
}

impl JetCorrectionProvider {
    /// Builds the provider with the standard applicability rules and checks
    /// that every correction it needs exists in `table`.
    pub fn new(
        config: &JetCorrectionConfig,
        sample: SampleKind,
        sample_name: &str,
        table: Arc<dyn CorrectionTable>,
    ) -> Result<Self, SystError> {
        Self::with_applicability(
            config,
            sample,
            sample_name,
            table,
            ApplicabilityTable::standard(),
        )
    }

    /// Builds the provider with custom applicability rules.
    pub fn with_applicability(
        config: &JetCorrectionConfig,
        sample: SampleKind,
        sample_name: &str,
        table: Arc<dyn CorrectionTable>,
        applicability: ApplicabilityTable,
    ) -> Result<Self, SystError> {
        let pipeline = StagedCorrectionPipeline::new(config, sample, sample_name)?;
        for key in pipeline.required_keys() {
            if !table.contains(key) {
                return Err(SystError::configuration(
                    "missing_correction",
                    "correction required by the jet pipeline not found",
                )
                .with_context("key", key)
                .with_context("algo", config.algo.as_str()));
            }
        }
        let catalog = UncertaintyCatalog::from_config(config, sample);
        catalog.validate(table.as_ref())?;
        let builder = UncertaintyMatrixBuilder::new(catalog, applicability, pipeline.applies_jer());
        info!(
            algo = %config.algo,
            period = %config.period,
            sample = ?sample,
            sources = builder.active_sources().len(),
            "jet correction provider ready"
        );
        Ok(Self {
            table,
            pipeline,
            builder,
            year: config.year.clone(),
        })
    }

    /// Year substituted into the names of year-dependent sources.
    pub fn year(&self) -> &str {
        &self.year
    }

    /// Non-central sources this provider emits.
    pub fn sources(&self) -> Vec<UncSource> {
        self.builder.active_sources()
    }

    /// Underlying pipeline.
    pub fn pipeline(&self) -> &StagedCorrectionPipeline {
        &self.pipeline
    }

    /// Nominal correction and all variants for one event.
    pub fn shifted_p4(
        &self,
        inputs: &JetInputs,
        ctx: &EventContext,
    ) -> Result<JetVariations, SystError> {
        let table = self.table.as_ref();
        let nominal = self.pipeline.run(table, inputs, ctx)?;
        let matrix = self.builder.build(table, &nominal, inputs)?;
        Ok(JetVariations {
            matrix,
            aux: nominal.aux,
            tally: nominal.tally,
        })
    }

    /// Relative pt resolution per object.
    pub fn resolutions(
        &self,
        inputs: &JetInputs,
        ctx: &EventContext,
    ) -> Result<Vec<f64>, SystError> {
        self.pipeline.resolutions(self.table.as_ref(), inputs, ctx)
    }
}
