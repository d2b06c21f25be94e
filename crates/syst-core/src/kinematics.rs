//! Four-momentum representation shared by every collection.

use serde::{Deserialize, Serialize};

/// Four-momentum in (pt, eta, phi, mass) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PtEtaPhiM {
    /// Transverse momentum.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth.
    pub phi: f64,
    /// Invariant mass.
    pub mass: f64,
}

impl PtEtaPhiM {
    /// Creates a new four-momentum.
    pub const fn new(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        Self { pt, eta, phi, mass }
    }

    /// Returns a copy with pt and mass multiplied by `factor`.
    ///
    /// Direction is unchanged, which is how every momentum correction in the
    /// engine acts on an object.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            pt: self.pt * factor,
            mass: self.mass * factor,
            ..self
        }
    }

    /// Returns a copy with a replaced transverse momentum and the mass untouched.
    pub fn with_pt(self, pt: f64) -> Self {
        Self { pt, ..self }
    }

    /// Momentum component along x.
    pub fn px(&self) -> f64 {
        self.pt * self.phi.cos()
    }

    /// Momentum component along y.
    pub fn py(&self) -> f64 {
        self.pt * self.phi.sin()
    }

    /// Transverse vector with zero eta and mass, as used for missing momentum.
    pub fn from_transverse(px: f64, py: f64) -> Self {
        Self::new(px.hypot(py), 0.0, py.atan2(px), 0.0)
    }
}

/// Corrected objects of one collection in one event, index-aligned with the inputs.
pub type Collection = Vec<PtEtaPhiM>;

/// Builds four-vectors from parallel component slices of equal length.
pub fn zip_p4(pt: &[f64], eta: &[f64], phi: &[f64], mass: &[f64]) -> Collection {
    pt.iter()
        .zip(eta)
        .zip(phi)
        .zip(mass)
        .map(|(((&pt, &eta), &phi), &mass)| PtEtaPhiM::new(pt, eta, phi, mass))
        .collect()
}

/// Propagates object momentum changes into the missing transverse momentum.
///
/// Each item pairs a collection as stored with the same collection after a
/// correction; the vector sum of the changes is subtracted from `met`.
pub fn shift_met<'a, I>(met: PtEtaPhiM, changes: I) -> PtEtaPhiM
where
    I: IntoIterator<Item = (&'a [PtEtaPhiM], &'a [PtEtaPhiM])>,
{
    let (mut px, mut py) = (met.px(), met.py());
    for (before, after) in changes {
        for (stored, shifted) in before.iter().zip(after) {
            px -= shifted.px() - stored.px();
            py -= shifted.py() - stored.py();
        }
    }
    PtEtaPhiM::from_transverse(px, py)
}
