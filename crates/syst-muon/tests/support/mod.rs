#![allow(dead_code)]

use std::sync::Arc;

use syst_core::table::CorrectionTable;
use syst_muon::MuonInputs;
use syst_table::TableSet;

/// Values returned by the fixture ScaRe tables.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub a_data: f64,
    pub m_data: f64,
    pub a_mc: f64,
    pub m_mc: f64,
    pub a_stat: f64,
    pub m_stat: f64,
    pub rho_stat: f64,
    pub std: f64,
    pub cb_sigma: f64,
    pub k_data: f64,
    pub k_mc: f64,
    pub k_mc_stat: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            a_data: 0.0001,
            m_data: 1.01,
            a_mc: -0.0002,
            m_mc: 0.99,
            a_stat: 0.00002,
            m_stat: 0.001,
            rho_stat: 0.1,
            std: 0.01,
            cb_sigma: 1.0,
            k_data: 1.2,
            k_mc: 1.0,
            k_mc_stat: 0.05,
        }
    }
}

fn curvature(name: &str, nom: f64, stat: f64, rho: f64) -> String {
    format!(
        r#"
  - name: {name}
    inputs:
      - {{ name: eta, type: real }}
      - {{ name: phi, type: real }}
      - {{ name: var, type: string }}
    data:
      nodetype: category
      input: var
      content:
        - {{ key: nom, value: {{ nodetype: constant, value: {nom} }} }}
        - {{ key: stat, value: {{ nodetype: constant, value: {stat} }} }}
        - {{ key: rho_stat, value: {{ nodetype: constant, value: {rho} }} }}"#
    )
}

fn indexed(name: &str, values: &[f64]) -> String {
    let mut node = format!(
        r#"
  - name: {name}
    inputs:
      - {{ name: abs_eta, type: real }}
      - {{ name: nL, type: real }}
      - {{ name: index, type: int }}
    data:
      nodetype: category
      input: index
      content:"#
    );
    for (i, v) in values.iter().enumerate() {
        node.push_str(&format!(
            "\n        - {{ key: {i}, value: {{ nodetype: constant, value: {v} }} }}"
        ));
    }
    node
}

fn resolution_scale(name: &str, nom: f64, stat: f64) -> String {
    format!(
        r#"
  - name: {name}
    inputs:
      - {{ name: abs_eta, type: real }}
      - {{ name: var, type: string }}
    data:
      nodetype: category
      input: var
      content:
        - {{ key: nom, value: {{ nodetype: constant, value: {nom} }} }}
        - {{ key: stat, value: {{ nodetype: constant, value: {stat} }} }}"#
    )
}

pub fn document(p: Params) -> String {
    let mut doc = String::from("corrections:");
    doc.push_str(&curvature("a_data", p.a_data, 0.0, 0.0));
    doc.push_str(&curvature("m_data", p.m_data, 0.0, 0.0));
    doc.push_str(&curvature("a_mc", p.a_mc, p.a_stat, 0.0));
    doc.push_str(&curvature("m_mc", p.m_mc, p.m_stat, p.rho_stat));
    doc.push_str(&indexed("cb_params", &[0.0, p.cb_sigma, 10.0, 10.0]));
    doc.push_str(&indexed("poly_params", &[p.std, 0.0, 0.0]));
    doc.push_str(&resolution_scale("k_data", p.k_data, 0.0));
    doc.push_str(&resolution_scale("k_mc", p.k_mc, p.k_mc_stat));
    doc.push('\n');
    doc
}

pub fn table_with(p: Params) -> Arc<dyn CorrectionTable> {
    Arc::new(TableSet::from_yaml_slice(document(p).as_bytes()).expect("fixture table"))
}

pub fn table() -> Arc<dyn CorrectionTable> {
    table_with(Params::default())
}

/// Positive muons with `n_tracker_layers = 12`.
pub fn muons(pt: &[f64], eta: &[f64], phi: &[f64]) -> MuonInputs {
    let n = pt.len();
    MuonInputs {
        pt: pt.to_vec(),
        eta: eta.to_vec(),
        phi: phi.to_vec(),
        mass: vec![0.1057; n],
        charge: vec![1; n],
        n_tracker_layers: vec![12; n],
    }
}
