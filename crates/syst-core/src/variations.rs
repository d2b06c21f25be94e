//! Event-level merge of the variations of every corrected collection.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::SystError;
use crate::kinematics::Collection;
use crate::uncertainty::UncSource;

/// Systematic names of one event across all corrected collections.
///
/// Each collection registers the names it defines. When the set is finished,
/// every collection carries an entry for every registered name; names a
/// collection does not define are filled with its central objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariationSet {
    owners: BTreeMap<String, BTreeSet<String>>,
    collections: BTreeMap<String, BTreeMap<String, Collection>>,
}

impl VariationSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the named variants of one collection.
    ///
    /// `variants` must hold a `Central` entry. A name the collection already
    /// defines is rejected, so one source can never be produced twice for the
    /// same objects.
    pub fn insert(
        &mut self,
        collection: &str,
        variants: BTreeMap<String, Collection>,
    ) -> Result<(), SystError> {
        let central = variants.get(UncSource::Central.name()).ok_or_else(|| {
            SystError::configuration("missing_central", "collection has no central entry")
                .with_context("collection", collection)
        })?;
        if let Some((name, _)) = variants
            .iter()
            .find(|(_, objects)| objects.len() != central.len())
        {
            return Err(SystError::input(
                "variant_length_mismatch",
                "shifted collection differs in length from nominal",
            )
            .with_context("collection", collection)
            .with_context("source", name.as_str()));
        }
        if let Some(name) = variants.keys().find(|name| self.defines(collection, name)) {
            return Err(SystError::configuration(
                "duplicate_source",
                "source defined twice for one collection",
            )
            .with_context("source", name.as_str())
            .with_context("collection", collection));
        }
        for name in variants.keys() {
            self.owners
                .entry(name.clone())
                .or_default()
                .insert(collection.to_string());
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(variants);
        Ok(())
    }

    /// True if `collection` registered `name` itself.
    pub fn defines(&self, collection: &str, name: &str) -> bool {
        self.owners
            .get(name)
            .is_some_and(|owners| owners.contains(collection))
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    /// Collections that define `name`.
    pub fn owners(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.owners.get(name)
    }

    /// Objects of `collection` under `name`, falling back to its central
    /// entry when the collection does not define that name.
    pub fn get(&self, collection: &str, name: &str) -> Option<&Collection> {
        let variants = self.collections.get(collection)?;
        variants
            .get(name)
            .or_else(|| variants.get(UncSource::Central.name()))
    }

    /// Collection name to systematic name to objects, with every collection
    /// filled for every registered name.
    pub fn into_filled(self) -> BTreeMap<String, BTreeMap<String, Collection>> {
        let names: Vec<String> = self.owners.into_keys().collect();
        self.collections
            .into_iter()
            .map(|(collection, mut variants)| {
                let central = variants
                    .get(UncSource::Central.name())
                    .cloned()
                    .unwrap_or_default();
                for name in &names {
                    variants
                        .entry(name.clone())
                        .or_insert_with(|| central.clone());
                }
                (collection, variants)
            })
            .collect()
    }
}
