//! Forward "horn" exclusion for resolution-driven shifts.

use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_enabled() -> bool {
    true
}

fn default_eta_min() -> f64 {
    2.5
}

fn default_eta_max() -> f64 {
    3.0
}

/// Suppresses resolution smearing and its variations for generator-matched
/// jets inside an `|eta|` band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionExclusionPolicy {
    /// Master toggle.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Inclusive lower edge of the band in `|eta|`.
    #[serde(default = "default_eta_min")]
    pub eta_min: f64,
    /// Inclusive upper edge of the band in `|eta|`.
    #[serde(default = "default_eta_max")]
    pub eta_max: f64,
}

impl Default for RegionExclusionPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            eta_min: default_eta_min(),
            eta_max: default_eta_max(),
        }
    }
}

impl RegionExclusionPolicy {
    /// Policy that never suppresses anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Logs once when the fix is switched off.
    pub(crate) fn announce(&self) {
        if !self.enabled {
            warn!("forward horn exclusion disabled; resolution smearing applies at all |eta|");
        }
    }

    /// True if `|eta|` lies inside the band, regardless of the toggle.
    pub fn in_band(&self, eta: f64) -> bool {
        let abs_eta = eta.abs();
        abs_eta >= self.eta_min && abs_eta <= self.eta_max
    }

    /// True if resolution-driven corrections must be suppressed for this object.
    pub fn suppresses(&self, eta: f64, gen_matched: bool) -> bool {
        self.enabled && gen_matched && self.in_band(eta)
    }
}
