//! JES and JER variants built on top of the nominal jets.

use rayon::prelude::*;
use syst_core::errors::SystError;
use syst_core::table::CorrectionTable;
use syst_core::{args, ApplicabilityTable, Collection, ResultMatrix, UncScale, UncSource};
use tracing::debug;

use crate::catalog::{CatalogEntry, UncertaintyCatalog};
use crate::inputs::JetInputs;
use crate::pipeline::NominalJets;

/// Produces the systematic variants of a nominal jet collection.
#[derive(Debug, Clone)]
pub struct UncertaintyMatrixBuilder {
    catalog: UncertaintyCatalog,
    applicability: ApplicabilityTable,
    apply_jer: bool,
}

impl UncertaintyMatrixBuilder {
    /// Creates a builder. `apply_jer` gates the resolution source.
    pub fn new(
        catalog: UncertaintyCatalog,
        applicability: ApplicabilityTable,
        apply_jer: bool,
    ) -> Self {
        Self {
            catalog,
            applicability,
            apply_jer,
        }
    }

    /// Catalog in use.
    pub fn catalog(&self) -> &UncertaintyCatalog {
        &self.catalog
    }

    /// Sources that produce entries.
    pub fn active_sources(&self) -> Vec<UncSource> {
        self.catalog
            .iter()
            .filter(|(_, entry)| self.apply_jer || **entry != CatalogEntry::Resolution)
            .map(|(source, _)| source)
            .collect()
    }

    fn shifted(
        &self,
        table: &dyn CorrectionTable,
        nominal: &NominalJets,
        inputs: &JetInputs,
        source: UncSource,
        entry: &CatalogEntry,
        scale: UncScale,
    ) -> Result<Collection, SystError> {
        let sign = scale.signf();
        nominal
            .p4
            .iter()
            .enumerate()
            .map(|(i, jet)| {
                if !self.applicability.applies(source, &inputs.traits(i)) {
                    return Ok(*jet);
                }
                let factor = match entry {
                    CatalogEntry::Resolution if nominal.aux[i].in_horn => 1.0,
                    CatalogEntry::Resolution => 1.0 + sign * nominal.aux[i].resolution,
                    CatalogEntry::Table(key) => {
                        let unc = table.evaluate(key, &args![jet.eta, jet.pt]).map_err(|err| {
                            err.into_configuration(key)
                                .with_context("source", source.name())
                                .with_context("scale", scale.as_str())
                                .with_context("object", i.to_string())
                        })?;
                        1.0 + sign * unc
                    }
                };
                Ok(jet.scaled(factor))
            })
            .collect()
    }

    /// Builds the full matrix. Entries are computed in parallel.
    pub fn build(
        &self,
        table: &dyn CorrectionTable,
        nominal: &NominalJets,
        inputs: &JetInputs,
    ) -> Result<ResultMatrix, SystError> {
        let mut matrix = ResultMatrix::new(nominal.p4.clone());
        let work: Vec<(UncSource, &CatalogEntry, UncScale)> = self
            .catalog
            .iter()
            .filter(|(_, entry)| self.apply_jer || **entry != CatalogEntry::Resolution)
            .flat_map(|(source, entry)| {
                UncScale::VARIATIONS
                    .into_iter()
                    .map(move |scale| (source, entry, scale))
            })
            .collect();

        let shifted: Result<Vec<_>, SystError> = work
            .par_iter()
            .map(|(source, entry, scale)| {
                let collection = self.shifted(table, nominal, inputs, *source, entry, *scale)?;
                Ok((*source, *scale, collection))
            })
            .collect();

        for (source, scale, collection) in shifted? {
            matrix.insert(source, scale, collection)?;
        }
        debug!(entries = matrix.len(), "jet uncertainty matrix built");
        Ok(matrix)
    }
}
