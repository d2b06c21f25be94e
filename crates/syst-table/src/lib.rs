#![deny(missing_docs)]
#![doc = "In-memory correction tables: named lookup trees and chained compound corrections loaded from JSON or YAML."]

use std::collections::BTreeMap;
use std::path::Path;

use syst_core::errors::{ErrorInfo, SystError};
use syst_core::table::{CorrectionArg, CorrectionTable};
use tracing::info;

pub mod document;
mod eval;
pub mod serde;

pub use document::{
    CategoryItem, CategoryKey, CompoundSpec, CorrectionSpec, Flow, InputKind, InputSpec, Node,
    TableDocument,
};

use eval::Correction;
use crate::serde::DocumentFormat;

fn unknown_key(key: &str) -> SystError {
    SystError::Lookup(
        ErrorInfo::new("unknown_key", "no correction registered under this key")
            .with_context("key", key),
    )
}

#[derive(Debug, Clone)]
struct Compound {
    inputs: Vec<InputSpec>,
    /// Per step: correction key and the compound input position for each of its inputs.
    steps: Vec<(String, Vec<usize>)>,
    updates: Vec<usize>,
}

/// Loaded set of corrections implementing [`CorrectionTable`].
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    description: String,
    corrections: BTreeMap<String, Correction>,
    compound: BTreeMap<String, Compound>,
}

impl TableSet {
    /// Validates a document and builds the table set.
    pub fn from_document(document: &TableDocument) -> Result<Self, SystError> {
        let mut corrections = BTreeMap::new();
        for spec in &document.corrections {
            if corrections
                .insert(spec.name.clone(), Correction::compile(spec)?)
                .is_some()
            {
                return Err(SystError::configuration(
                    "duplicate_correction",
                    "correction name declared twice",
                )
                .with_context("correction", spec.name.as_str()));
            }
        }

        let mut compound = BTreeMap::new();
        for spec in &document.compound {
            let built = build_compound(spec, &corrections)?;
            if corrections.contains_key(&spec.name)
                || compound.insert(spec.name.clone(), built).is_some()
            {
                return Err(SystError::configuration(
                    "duplicate_correction",
                    "compound name collides with another correction",
                )
                .with_context("correction", spec.name.as_str()));
            }
        }

        info!(
            corrections = corrections.len(),
            compound = compound.len(),
            "correction table loaded"
        );
        Ok(Self {
            description: document.description.clone(),
            corrections,
            compound,
        })
    }

    /// Parses a JSON document.
    pub fn from_json_slice(data: &[u8]) -> Result<Self, SystError> {
        Self::from_document(&DocumentFormat::Json.decode(data)?)
    }

    /// Parses a YAML document.
    pub fn from_yaml_slice(data: &[u8]) -> Result<Self, SystError> {
        Self::from_document(&DocumentFormat::Yaml.decode(data)?)
    }

    /// Loads a document from disk; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SystError> {
        let document: TableDocument = serde::read_document(path.as_ref(), "table_read")?;
        Self::from_document(&document)
    }

    /// Document description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Names of every single and compound correction, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .corrections
            .keys()
            .chain(self.compound.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Declared inputs of a single or compound correction.
    pub fn inputs(&self, key: &str) -> Option<&[InputSpec]> {
        self.corrections
            .get(key)
            .map(|c| c.inputs.as_slice())
            .or_else(|| self.compound.get(key).map(|c| c.inputs.as_slice()))
    }
}

fn build_compound(
    spec: &CompoundSpec,
    corrections: &BTreeMap<String, Correction>,
) -> Result<Compound, SystError> {
    let position = |name: &str| spec.inputs.iter().position(|input| input.name == name);
    let mut steps = Vec::with_capacity(spec.stack.len());
    for step in &spec.stack {
        let correction = corrections.get(step).ok_or_else(|| {
            SystError::configuration("unknown_stack_entry", "compound step is not a correction")
                .with_context("correction", spec.name.as_str())
                .with_context("step", step.as_str())
        })?;
        let mapping = correction
            .inputs
            .iter()
            .map(|input| {
                position(&input.name).ok_or_else(|| {
                    SystError::configuration(
                        "unknown_input",
                        "compound step needs an input the compound does not declare",
                    )
                    .with_context("correction", spec.name.as_str())
                    .with_context("input", input.name.as_str())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        steps.push((step.clone(), mapping));
    }
    let updates = spec
        .inputs_update
        .iter()
        .map(|name| match position(name) {
            Some(idx) if spec.inputs[idx].kind == InputKind::Real => Ok(idx),
            _ => Err(SystError::configuration(
                "invalid_update",
                "updated inputs must be declared real inputs",
            )
            .with_context("correction", spec.name.as_str())
            .with_context("input", name.as_str())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Compound {
        inputs: spec.inputs.clone(),
        steps,
        updates,
    })
}

impl CorrectionTable for TableSet {
    fn evaluate(&self, key: &str, args: &[CorrectionArg]) -> Result<f64, SystError> {
        let correction = self.corrections.get(key).ok_or_else(|| unknown_key(key))?;
        correction
            .evaluate(args)
            .map_err(|err| err.with_context("key", key))
    }

    fn compound_evaluate(&self, key: &str, args: &[CorrectionArg]) -> Result<f64, SystError> {
        let compound = self.compound.get(key).ok_or_else(|| unknown_key(key))?;
        if args.len() != compound.inputs.len() {
            return Err(SystError::Lookup(
                ErrorInfo::new("arity_mismatch", "wrong number of arguments")
                    .with_context("key", key)
                    .with_context("expected", compound.inputs.len().to_string())
                    .with_context("actual", args.len().to_string()),
            ));
        }
        let mut values = args.to_vec();
        let mut product = 1.0;
        for (step, mapping) in &compound.steps {
            let step_args: Vec<CorrectionArg> =
                mapping.iter().map(|idx| values[*idx].clone()).collect();
            let correction = self.corrections.get(step).ok_or_else(|| unknown_key(step))?;
            let factor = correction
                .evaluate(&step_args)
                .map_err(|err| err.with_context("key", key).with_context("step", step.as_str()))?;
            product *= factor;
            for idx in &compound.updates {
                if let Some(value) = values[*idx].as_real() {
                    values[*idx] = CorrectionArg::Real(value * factor);
                }
            }
        }
        Ok(product)
    }

    fn contains(&self, key: &str) -> bool {
        self.corrections.contains_key(key) || self.compound.contains_key(key)
    }
}
