//! Container for the nominal result and its systematic variants.

use std::collections::BTreeMap;

use crate::errors::SystError;
use crate::kinematics::Collection;
use crate::uncertainty::{inconsistent_pair, syst_label, UncScale, UncSource};

/// Ordered map from `(source, scale)` to one corrected collection.
///
/// Always holds exactly one `(Central, Central)` entry, set at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMatrix {
    entries: BTreeMap<(UncSource, UncScale), Collection>,
}

impl ResultMatrix {
    /// Creates a matrix holding only the nominal collection.
    pub fn new(central: Collection) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert((UncSource::Central, UncScale::Central), central);
        Self { entries }
    }

    /// Inserts a shifted collection.
    ///
    /// Rejects inconsistent keys, a second central entry and collections
    /// whose length differs from the nominal one.
    pub fn insert(
        &mut self,
        source: UncSource,
        scale: UncScale,
        collection: Collection,
    ) -> Result<(), SystError> {
        if (source == UncSource::Central) != (scale == UncScale::Central) {
            return Err(inconsistent_pair(source, scale));
        }
        if source == UncSource::Central {
            return Err(SystError::configuration(
                "duplicate_central",
                "the nominal entry is fixed at construction",
            ));
        }
        let expected = self.central().len();
        if collection.len() != expected {
            return Err(SystError::input(
                "variant_length_mismatch",
                "shifted collection differs in length from nominal",
            )
            .with_context("source", source.name())
            .with_context("scale", scale.as_str())
            .with_context("expected", expected.to_string())
            .with_context("actual", collection.len().to_string()));
        }
        self.entries.insert((source, scale), collection);
        Ok(())
    }

    /// The nominal collection.
    pub fn central(&self) -> &Collection {
        // Present by construction; `insert` never removes it.
        &self.entries[&(UncSource::Central, UncScale::Central)]
    }

    /// Looks up one entry.
    pub fn get(&self, source: UncSource, scale: UncScale) -> Option<&Collection> {
        self.entries.get(&(source, scale))
    }

    /// Number of entries including the nominal one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&(UncSource, UncScale), &Collection)> {
        self.entries.iter()
    }

    /// Distinct non-central sources present in the matrix.
    pub fn sources(&self) -> Vec<UncSource> {
        let mut sources: Vec<UncSource> = self
            .entries
            .keys()
            .map(|(source, _)| *source)
            .filter(|source| *source != UncSource::Central)
            .collect();
        sources.dedup();
        sources
    }

    /// View keyed by systematic name (`"Central"`, `"JES_TotalUp"`, ...).
    ///
    /// Fails when a year-dependent source is present; those are named with
    /// [`ResultMatrix::named_with_year`].
    pub fn named(&self) -> Result<BTreeMap<String, &Collection>, SystError> {
        if let Some(source) = self.sources().into_iter().find(|s| s.is_year_dependent()) {
            return Err(SystError::configuration(
                "missing_year",
                "year-dependent source cannot be named without a year",
            )
            .with_context("source", source.name()));
        }
        self.named_with_year("year")
    }

    /// View keyed by systematic name with `year` inserted into year-dependent
    /// sources (`"JES_BBEC1_2018Up"`).
    pub fn named_with_year(&self, year: &str) -> Result<BTreeMap<String, &Collection>, SystError> {
        self.entries
            .iter()
            .map(|((source, scale), collection)| {
                Ok((syst_label(*source, *scale, year)?, collection))
            })
            .collect()
    }
}
