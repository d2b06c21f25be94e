//! Validated lookup trees with input names resolved to positions.

use syst_core::errors::{ErrorInfo, SystError};
use syst_core::table::CorrectionArg;

use crate::document::{CategoryKey, CorrectionSpec, Flow, InputKind, InputSpec, Node};

fn invalid_document(code: &str, message: &str, correction: &str) -> SystError {
    SystError::Configuration(
        ErrorInfo::new(code, message)
            .with_context("correction", correction)
            .with_hint("fix the correction table document"),
    )
}

fn out_of_domain(input: &str, value: &CorrectionArg) -> SystError {
    SystError::Lookup(
        ErrorInfo::new("out_of_domain", "argument outside the correction domain")
            .with_context("input", input)
            .with_context("value", value.to_string()),
    )
}

#[derive(Debug, Clone)]
enum Compiled {
    Constant(f64),
    Binning {
        input: usize,
        edges: Vec<f64>,
        content: Vec<Compiled>,
        flow: Flow,
    },
    Category {
        input: usize,
        content: Vec<(CategoryKey, Compiled)>,
        default: Option<Box<Compiled>>,
    },
    Polynomial {
        input: usize,
        coefficients: Vec<f64>,
    },
}

fn resolve(
    inputs: &[InputSpec],
    name: &str,
    allowed: &[InputKind],
    correction: &str,
) -> Result<usize, SystError> {
    let idx = inputs
        .iter()
        .position(|spec| spec.name == name)
        .ok_or_else(|| {
            invalid_document("unknown_input", "node references an undeclared input", correction)
                .with_context("input", name)
        })?;
    if !allowed.contains(&inputs[idx].kind) {
        return Err(invalid_document(
            "input_type_mismatch",
            "node cannot consume an input of this type",
            correction,
        )
        .with_context("input", name));
    }
    Ok(idx)
}

fn compile(node: &Node, inputs: &[InputSpec], correction: &str) -> Result<Compiled, SystError> {
    const NUMERIC: &[InputKind] = &[InputKind::Real, InputKind::Int];
    match node {
        Node::Constant { value } => Ok(Compiled::Constant(*value)),
        Node::Binning {
            input,
            edges,
            content,
            flow,
        } => {
            let idx = resolve(inputs, input, NUMERIC, correction)?;
            if edges.len() < 2 || content.len() + 1 != edges.len() {
                return Err(invalid_document(
                    "binning_shape",
                    "binning needs one more edge than content nodes",
                    correction,
                ));
            }
            if edges.windows(2).any(|pair| !(pair[0] < pair[1])) {
                return Err(invalid_document(
                    "binning_order",
                    "binning edges must be strictly ascending",
                    correction,
                ));
            }
            let content = content
                .iter()
                .map(|child| compile(child, inputs, correction))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Compiled::Binning {
                input: idx,
                edges: edges.clone(),
                content,
                flow: *flow,
            })
        }
        Node::Category {
            input,
            content,
            default,
        } => {
            let idx = resolve(
                inputs,
                input,
                &[InputKind::Int, InputKind::String],
                correction,
            )?;
            let content = content
                .iter()
                .map(|item| Ok((item.key.clone(), compile(&item.value, inputs, correction)?)))
                .collect::<Result<Vec<_>, SystError>>()?;
            let default = match default {
                Some(node) => Some(Box::new(compile(node, inputs, correction)?)),
                None => None,
            };
            Ok(Compiled::Category {
                input: idx,
                content,
                default,
            })
        }
        Node::Polynomial {
            input,
            coefficients,
        } => Ok(Compiled::Polynomial {
            input: resolve(inputs, input, NUMERIC, correction)?,
            coefficients: coefficients.clone(),
        }),
    }
}

fn matches_key(key: &CategoryKey, arg: &CorrectionArg) -> bool {
    match key {
        CategoryKey::Int(expected) => arg.as_int() == Some(*expected),
        CategoryKey::Text(expected) => arg.as_text() == Some(expected.as_str()),
    }
}

/// A single correction ready for evaluation.
#[derive(Debug, Clone)]
pub(crate) struct Correction {
    pub(crate) inputs: Vec<InputSpec>,
    root: Compiled,
}

impl Correction {
    pub(crate) fn compile(spec: &CorrectionSpec) -> Result<Self, SystError> {
        Ok(Self {
            inputs: spec.inputs.clone(),
            root: compile(&spec.data, &spec.inputs, &spec.name)?,
        })
    }

    /// Checks arity and argument types against the declared inputs.
    pub(crate) fn check_args(&self, args: &[CorrectionArg]) -> Result<(), SystError> {
        if args.len() != self.inputs.len() {
            return Err(SystError::Lookup(
                ErrorInfo::new("arity_mismatch", "wrong number of arguments")
                    .with_context("expected", self.inputs.len().to_string())
                    .with_context("actual", args.len().to_string()),
            ));
        }
        for (spec, arg) in self.inputs.iter().zip(args) {
            let ok = match spec.kind {
                InputKind::Real => arg.as_real().is_some(),
                InputKind::Int => arg.as_int().is_some(),
                InputKind::String => arg.as_text().is_some(),
            };
            if !ok {
                return Err(SystError::Lookup(
                    ErrorInfo::new("argument_type", "argument does not match input type")
                        .with_context("input", spec.name.as_str())
                        .with_context("value", arg.to_string()),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn evaluate(&self, args: &[CorrectionArg]) -> Result<f64, SystError> {
        self.check_args(args)?;
        self.eval_node(&self.root, args)
    }

    fn eval_node(&self, node: &Compiled, args: &[CorrectionArg]) -> Result<f64, SystError> {
        match node {
            Compiled::Constant(value) => Ok(*value),
            Compiled::Binning {
                input,
                edges,
                content,
                flow,
            } => {
                let arg = &args[*input];
                let x = arg
                    .as_real()
                    .filter(|x| !x.is_nan())
                    .ok_or_else(|| out_of_domain(&self.inputs[*input].name, arg))?;
                let last = content.len() - 1;
                let bin = if x < edges[0] {
                    (*flow == Flow::Clamp).then_some(0)
                } else if x >= edges[edges.len() - 1] {
                    (*flow == Flow::Clamp).then_some(last)
                } else {
                    Some(edges.partition_point(|edge| *edge <= x) - 1)
                };
                match bin {
                    Some(bin) => self.eval_node(&content[bin], args),
                    None => Err(out_of_domain(&self.inputs[*input].name, arg)),
                }
            }
            Compiled::Category {
                input,
                content,
                default,
            } => {
                let arg = &args[*input];
                if let Some((_, child)) = content.iter().find(|(key, _)| matches_key(key, arg)) {
                    return self.eval_node(child, args);
                }
                match default {
                    Some(child) => self.eval_node(child, args),
                    None => Err(out_of_domain(&self.inputs[*input].name, arg)),
                }
            }
            Compiled::Polynomial {
                input,
                coefficients,
            } => {
                let arg = &args[*input];
                let x = arg
                    .as_real()
                    .ok_or_else(|| out_of_domain(&self.inputs[*input].name, arg))?;
                Ok(coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c))
            }
        }
    }
}
