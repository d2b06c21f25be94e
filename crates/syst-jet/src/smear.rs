//! Hybrid resolution smearing: scaling for matched jets, a seeded
//! stochastic draw otherwise.

use syst_core::sanity::{sanitize_factor, DomainTally};

/// Matched jets farther than this many resolutions from their generator jet
/// are smeared stochastically.
pub const MATCH_RESOLUTION_WINDOW: f64 = 3.0;

/// Raw hybrid smear factor.
///
/// Well-matched jets are scaled towards or away from their generator jet;
/// all others receive `1 + draw * res * sqrt(max(0, sf^2 - 1))`. `draw` is only
/// invoked for the stochastic branch.
pub fn hybrid_factor(
    pt: f64,
    gen_pt: Option<f64>,
    resolution: f64,
    scale_factor: f64,
    draw: impl FnOnce() -> f64,
) -> f64 {
    match gen_pt {
        Some(gen_pt) if (pt - gen_pt).abs() < MATCH_RESOLUTION_WINDOW * resolution * pt => {
            1.0 + (scale_factor - 1.0) * (pt - gen_pt) / pt
        }
        _ => {
            let width = (scale_factor * scale_factor - 1.0).max(0.0).sqrt();
            1.0 + draw() * resolution * width
        }
    }
}

/// Hybrid smear factor with the ratio sanity check applied; rejected factors become 1.
pub fn smear_factor(
    pt: f64,
    gen_pt: Option<f64>,
    resolution: f64,
    scale_factor: f64,
    draw: impl FnOnce() -> f64,
    tally: &mut DomainTally,
) -> f64 {
    let raw = hybrid_factor(pt, gen_pt, resolution, scale_factor, draw);
    sanitize_factor(pt, raw, tally)
}
