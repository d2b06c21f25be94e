//! Serialized form of a correction table document.

use serde::{Deserialize, Serialize};

fn default_schema_version() -> u32 {
    1
}

/// Top-level document: named corrections plus chained compound corrections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    /// Format version of the document.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Single corrections.
    #[serde(default)]
    pub corrections: Vec<CorrectionSpec>,
    /// Chained corrections evaluated as the product of their steps.
    #[serde(default)]
    pub compound: Vec<CompoundSpec>,
}

/// Type of one declared input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Real number.
    Real,
    /// Integer.
    Int,
    /// String category.
    String,
}

/// Declared positional input of a correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Input name, referenced by nodes.
    pub name: String,
    /// Expected argument type.
    #[serde(rename = "type")]
    pub kind: InputKind,
}

/// One named correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSpec {
    /// Lookup key.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Ordered inputs; arity is enforced on evaluation.
    pub inputs: Vec<InputSpec>,
    /// Root node of the lookup tree.
    pub data: Node,
}

/// A chained correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundSpec {
    /// Lookup key.
    pub name: String,
    /// Ordered inputs shared by every step.
    pub inputs: Vec<InputSpec>,
    /// Names of the single corrections applied in order.
    pub stack: Vec<String>,
    /// Real inputs multiplied by each step's output before the next step.
    #[serde(default)]
    pub inputs_update: Vec<String>,
}

/// Behaviour of a binning node outside its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Use the first or last bin.
    #[default]
    Clamp,
    /// Fail the lookup.
    Error,
}

/// Key of one category entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryKey {
    /// Integer key.
    Int(i64),
    /// String key.
    Text(String),
}

/// One entry of a category node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryItem {
    /// Matched key.
    pub key: CategoryKey,
    /// Node evaluated on match.
    pub value: Node,
}

/// Node of a correction lookup tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodetype", rename_all = "snake_case")]
pub enum Node {
    /// Fixed value.
    Constant {
        /// Returned value.
        value: f64,
    },
    /// Piecewise lookup over a real input.
    Binning {
        /// Input name.
        input: String,
        /// Ascending bin edges, one more than `content`.
        edges: Vec<f64>,
        /// One node per bin.
        content: Vec<Node>,
        /// Out-of-range behaviour.
        #[serde(default)]
        flow: Flow,
    },
    /// Exact match on a string or integer input.
    Category {
        /// Input name.
        input: String,
        /// Entries tried in order.
        content: Vec<CategoryItem>,
        /// Node used when no entry matches.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<Node>>,
    },
    /// Polynomial `c0 + c1 x + c2 x^2 + ...` in a real input.
    Polynomial {
        /// Input name.
        input: String,
        /// Coefficients in increasing power.
        coefficients: Vec<f64>,
    },
}
