#![allow(dead_code)]

use std::sync::Arc;

use syst_core::table::CorrectionTable;
use syst_jet::{JetCorrectionConfig, JetInputs};
use syst_table::TableSet;

pub const JEC_TAG: &str = "Test22_V1_MC";
pub const JER_TAG: &str = "Test22_JRV1_MC";

/// Values returned by the fixture table.
#[derive(Debug, Clone, Copy)]
pub struct Values {
    pub scale_factor: f64,
    pub resolution: f64,
    pub total_unc: f64,
    pub compound: f64,
}

impl Default for Values {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            resolution: 0.1,
            total_unc: 0.03,
            compound: 1.02,
        }
    }
}

pub fn document(algo: &str, values: Values) -> String {
    format!(
        r#"
corrections:
  - name: {JER_TAG}_ScaleFactor_{algo}
    inputs:
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
      - {{ name: systematic, type: string }}
    data:
      nodetype: category
      input: systematic
      content:
        - {{ key: nom, value: {{ nodetype: constant, value: {sf} }} }}
  - name: {JER_TAG}_PtResolution_{algo}
    inputs:
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
      - {{ name: rho, type: real }}
    data: {{ nodetype: constant, value: {res} }}
  - name: {JEC_TAG}_Total_{algo}
    inputs:
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
    data:
      nodetype: binning
      input: eta
      edges: [-5.2, 0.0, 5.2]
      content:
        - {{ nodetype: constant, value: {unc} }}
        - {{ nodetype: constant, value: {unc} }}
  - name: FlavorPureBottom_{algo}
    inputs:
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
    data: {{ nodetype: constant, value: 0.05 }}
  - name: {JEC_TAG}_L2L3_{algo}
    inputs:
      - {{ name: area, type: real }}
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
      - {{ name: rho, type: real }}
    data: {{ nodetype: constant, value: {cmpd} }}
  - name: {JEC_TAG}_Residual_{algo}
    inputs:
      - {{ name: phi, type: real }}
      - {{ name: run, type: real }}
    data:
      nodetype: binning
      input: run
      edges: [0.0, 370000.0, 400000.0]
      flow: error
      content:
        - {{ nodetype: constant, value: 1.0 }}
        - {{ nodetype: constant, value: 1.1 }}
compound:
  - name: {JEC_TAG}_L1L2L3Res_{algo}
    inputs:
      - {{ name: area, type: real }}
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
      - {{ name: rho, type: real }}
    stack: [{JEC_TAG}_L2L3_{algo}]
    inputs_update: [pt]
  - name: Phi{JEC_TAG}_L1L2L3Res_{algo}
    inputs:
      - {{ name: area, type: real }}
      - {{ name: eta, type: real }}
      - {{ name: pt, type: real }}
      - {{ name: rho, type: real }}
      - {{ name: phi, type: real }}
      - {{ name: run, type: real }}
    stack: [{JEC_TAG}_L2L3_{algo}, {JEC_TAG}_Residual_{algo}]
    inputs_update: [pt]
"#,
        sf = values.scale_factor,
        res = values.resolution,
        unc = values.total_unc,
        cmpd = values.compound,
    )
}

pub fn table_with(algo: &str, values: Values) -> Arc<dyn CorrectionTable> {
    Arc::new(TableSet::from_yaml_slice(document(algo, values).as_bytes()).expect("fixture table"))
}

pub fn table() -> Arc<dyn CorrectionTable> {
    table_with("AK4PFPuppi", Values::default())
}

pub fn config() -> JetCorrectionConfig {
    JetCorrectionConfig::new(JEC_TAG, JER_TAG, "AK4PFPuppi", "2022")
}

/// One jet per entry of `pt`, with uniform defaults for the other arrays.
pub fn jets(pt: &[f64], eta: &[f64], phi: &[f64]) -> JetInputs {
    let n = pt.len();
    JetInputs {
        pt: pt.to_vec(),
        eta: eta.to_vec(),
        phi: phi.to_vec(),
        mass: vec![10.0; n],
        raw_factor: vec![0.05; n],
        area: vec![0.5; n],
        gen_jet_idx: vec![-1; n],
        gen_jet_pt: Vec::new(),
        hadron_flavour: vec![0; n],
        parton_flavour: vec![21; n],
    }
}
