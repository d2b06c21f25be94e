use std::io::Write;

use approx::assert_relative_eq;
use syst_core::args;
use syst_core::table::CorrectionTable;
use syst_core::SystError;
use syst_table::TableSet;

const DOCUMENT: &str = r#"
description: lookup fixture
corrections:
  - name: jer_sf
    inputs:
      - { name: eta, type: real }
      - { name: pt, type: real }
      - { name: systematic, type: string }
    data:
      nodetype: binning
      input: eta
      edges: [-5.0, 0.0, 5.0]
      flow: clamp
      content:
        - nodetype: category
          input: systematic
          content:
            - { key: nom, value: { nodetype: constant, value: 1.1 } }
            - { key: up, value: { nodetype: constant, value: 1.2 } }
        - nodetype: category
          input: systematic
          content:
            - { key: nom, value: { nodetype: constant, value: 1.3 } }
          default: { nodetype: constant, value: 1.0 }
  - name: strict
    inputs:
      - { name: eta, type: real }
    data:
      nodetype: binning
      input: eta
      edges: [0.0, 1.0, 2.0]
      flow: error
      content:
        - { nodetype: constant, value: 10.0 }
        - { nodetype: constant, value: 20.0 }
  - name: by_mode
    inputs:
      - { name: dm, type: int }
    data:
      nodetype: category
      input: dm
      content:
        - { key: 0, value: { nodetype: constant, value: 0.98 } }
        - { key: 1, value: { nodetype: constant, value: 1.01 } }
  - name: poly
    inputs:
      - { name: pt, type: real }
    data: { nodetype: polynomial, input: pt, coefficients: [1.0, 0.5, 0.25] }
  - name: step_one
    inputs:
      - { name: pt, type: real }
    data: { nodetype: constant, value: 2.0 }
  - name: step_two
    inputs:
      - { name: pt, type: real }
    data:
      nodetype: binning
      input: pt
      edges: [0.0, 150.0, 1000.0]
      content:
        - { nodetype: constant, value: 1.5 }
        - { nodetype: constant, value: 0.5 }
compound:
  - name: chain
    inputs:
      - { name: area, type: real }
      - { name: pt, type: real }
    stack: [step_one, step_two]
    inputs_update: [pt]
"#;

fn table() -> TableSet {
    TableSet::from_yaml_slice(DOCUMENT.as_bytes()).expect("fixture parses")
}

#[test]
fn binning_and_category_select_values() {
    let t = table();
    assert_relative_eq!(t.evaluate("jer_sf", &args![-1.0, 50.0, "nom"]).expect("eval"), 1.1);
    assert_relative_eq!(t.evaluate("jer_sf", &args![-1.0, 50.0, "up"]).expect("eval"), 1.2);
    assert_relative_eq!(t.evaluate("jer_sf", &args![2.0, 50.0, "down"]).expect("eval"), 1.0);
    assert_relative_eq!(t.evaluate("by_mode", &args![1]).expect("eval"), 1.01);
}

#[test]
fn clamp_flow_uses_edge_bins() {
    let t = table();
    assert_relative_eq!(t.evaluate("jer_sf", &args![-9.0, 50.0, "nom"]).expect("eval"), 1.1);
    assert_relative_eq!(t.evaluate("jer_sf", &args![5.0, 50.0, "nom"]).expect("eval"), 1.3);
}

#[test]
fn error_flow_rejects_out_of_range() {
    let t = table();
    assert_relative_eq!(t.evaluate("strict", &args![1.5]).expect("eval"), 20.0);
    let err = t.evaluate("strict", &args![2.0]).expect_err("upper edge is overflow");
    assert!(matches!(err, SystError::Lookup(_)));
    assert_eq!(err.info().code, "out_of_domain");
    assert!(t.evaluate("strict", &args![f64::NAN]).is_err());
}

#[test]
fn missing_category_without_default_fails() {
    let err = table().evaluate("by_mode", &args![7]).expect_err("no entry for 7");
    assert_eq!(err.info().code, "out_of_domain");
}

#[test]
fn polynomial_uses_increasing_powers() {
    assert_relative_eq!(table().evaluate("poly", &args![2.0]).expect("eval"), 3.0);
}

#[test]
fn arity_and_type_are_enforced() {
    let t = table();
    let err = t.evaluate("jer_sf", &args![0.5, 50.0]).expect_err("missing argument");
    assert_eq!(err.info().code, "arity_mismatch");
    let err = t.evaluate("jer_sf", &args![0.5, 50.0, 3]).expect_err("int for string");
    assert_eq!(err.info().code, "argument_type");
}

#[test]
fn unknown_keys_are_lookup_errors() {
    let t = table();
    let err = t.evaluate("missing", &args![1.0]).expect_err("unknown");
    assert!(matches!(err, SystError::Lookup(_)));
    assert_eq!(err.info().context.get("key").map(String::as_str), Some("missing"));
    assert!(t.compound_evaluate("jer_sf", &args![1.0, 2.0, "nom"]).is_err());
    assert!(t.contains("chain"));
    assert!(t.contains("poly"));
    assert!(!t.contains("missing"));
}

#[test]
fn compound_multiplies_steps_and_updates_inputs() {
    let t = table();
    // 100 -> step_one 2.0 -> pt 200 falls in the second step_two bin.
    assert_relative_eq!(t.compound_evaluate("chain", &args![0.5, 100.0]).expect("eval"), 1.0);
    // 50 -> pt 100 stays in the first bin.
    assert_relative_eq!(t.compound_evaluate("chain", &args![0.5, 50.0]).expect("eval"), 3.0);
    let err = t
        .compound_evaluate("chain", &args![0.5, 50.0, 1.0])
        .expect_err("extra argument");
    assert_eq!(err.info().code, "arity_mismatch");
}

#[test]
fn invalid_documents_are_configuration_errors() {
    let doc = r#"
corrections:
  - name: broken
    inputs: [ { name: eta, type: real } ]
    data: { nodetype: binning, input: eta, edges: [1.0, 0.0], content: [ { nodetype: constant, value: 1.0 } ] }
"#;
    let err = TableSet::from_yaml_slice(doc.as_bytes()).expect_err("descending edges");
    assert!(err.is_configuration());

    let doc = r#"
compound:
  - name: chain
    inputs: [ { name: pt, type: real } ]
    stack: [absent]
"#;
    let err = TableSet::from_yaml_slice(doc.as_bytes()).expect_err("dangling stack entry");
    assert_eq!(err.info().code, "unknown_stack_entry");

    let err = TableSet::from_yaml_slice(b"corrections: 3").expect_err("not a list");
    assert!(matches!(err, SystError::Serde(_)));
}

#[test]
fn loads_json_and_yaml_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yaml_path = dir.path().join("tables.yaml");
    std::fs::write(&yaml_path, DOCUMENT).expect("write yaml");
    let from_yaml = TableSet::from_path(&yaml_path).expect("yaml loads");

    let document: serde_yaml::Value = serde_yaml::from_str(DOCUMENT).expect("value");
    let json_path = dir.path().join("tables.json");
    let mut file = std::fs::File::create(&json_path).expect("create json");
    file.write_all(serde_json::to_string(&document).expect("json").as_bytes())
        .expect("write json");
    let from_json = TableSet::from_path(&json_path).expect("json loads");

    assert_eq!(from_yaml.keys(), from_json.keys());
    assert_eq!(from_json.description(), "lookup fixture");
    assert!(TableSet::from_path(dir.path().join("absent.yaml")).is_err());
}
