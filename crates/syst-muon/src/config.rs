use serde::{Deserialize, Serialize};
use syst_core::SampleKind;

fn default_low_pt_threshold() -> f64 {
    26.0
}

fn default_max_pt() -> f64 {
    200.0
}

fn default_true() -> bool {
    true
}

fn key(name: &str) -> String {
    name.to_string()
}

/// Names of the corrections the ScaRe tables provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaReKeys {
    /// Additive curvature term for data, `(eta, phi, var)`.
    pub a_data: String,
    /// Multiplicative curvature term for data, `(eta, phi, var)`.
    pub m_data: String,
    /// Additive curvature term for simulation, `(eta, phi, var)`.
    pub a_mc: String,
    /// Multiplicative curvature term for simulation, `(eta, phi, var)`.
    pub m_mc: String,
    /// Crystal Ball parameters, `(|eta|, nL, index)` with index 0..=3 giving
    /// mean, sigma, n and alpha.
    pub cb_params: String,
    /// Resolution polynomial coefficients, `(|eta|, nL, index)`.
    pub poly_params: String,
    /// Resolution scale in data, `(|eta|, var)`.
    pub k_data: String,
    /// Resolution scale in simulation, `(|eta|, var)`.
    pub k_mc: String,
}

impl Default for ScaReKeys {
    fn default() -> Self {
        Self {
            a_data: key("a_data"),
            m_data: key("m_data"),
            a_mc: key("a_mc"),
            m_mc: key("m_mc"),
            cb_params: key("cb_params"),
            poly_params: key("poly_params"),
            k_data: key("k_data"),
            k_mc: key("k_mc"),
        }
    }
}

impl ScaReKeys {
    /// Scale-correction keys `(a, m)` for `sample`.
    pub fn scale_keys(&self, sample: SampleKind) -> (&str, &str) {
        match sample {
            SampleKind::Data => (&self.a_data, &self.m_data),
            SampleKind::Simulation => (&self.a_mc, &self.m_mc),
        }
    }

    /// Every key evaluated for `sample`.
    pub fn required(&self, sample: SampleKind) -> Vec<&str> {
        let (a, m) = self.scale_keys(sample);
        let mut keys = vec![a, m];
        if !sample.is_data() {
            keys.extend([
                self.cb_params.as_str(),
                self.poly_params.as_str(),
                self.k_data.as_str(),
                self.k_mc.as_str(),
            ]);
        }
        keys
    }
}

/// Muon ScaRe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuonScaReConfig {
    /// Correction names.
    #[serde(default)]
    pub keys: ScaReKeys,
    /// Muons below this pt are neither scaled nor smeared.
    #[serde(default = "default_low_pt_threshold")]
    pub low_pt_threshold: f64,
    /// Muons above this scaled pt are not smeared.
    #[serde(default = "default_max_pt")]
    pub max_pt: f64,
    /// Produce the scale and resolution variations for simulation.
    #[serde(default = "default_true")]
    pub return_variations: bool,
}

impl Default for MuonScaReConfig {
    fn default() -> Self {
        Self {
            keys: ScaReKeys::default(),
            low_pt_threshold: default_low_pt_threshold(),
            max_pt: default_max_pt(),
            return_variations: true,
        }
    }
}
