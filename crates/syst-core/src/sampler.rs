//! Crystal Ball shape and the deterministic sampler built on top of it.

use serde::{Deserialize, Serialize};
use statrs::function::erf::{erf, erf_inv};

use crate::errors::{ErrorInfo, SystError};
use crate::rng::EventRng;

// Truncated value; the published parameter tables were fitted with it.
const PI_TRUNCATED: f64 = 3.14159;
const SQRT2: f64 = std::f64::consts::SQRT_2;

/// Shape parameters of a symmetric double-sided Crystal Ball distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrystalBallShape {
    /// Location of the Gaussian core.
    pub mean: f64,
    /// Width of the Gaussian core.
    pub sigma: f64,
    /// Tail onset in units of sigma.
    pub alpha: f64,
    /// Tail power.
    pub n: f64,
}

impl CrystalBallShape {
    /// Creates a shape descriptor without validating it.
    pub const fn new(mean: f64, sigma: f64, alpha: f64, n: f64) -> Self {
        Self {
            mean,
            sigma,
            alpha,
            n,
        }
    }

    /// Near-Gaussian unit shape used when no dedicated parameters are configured.
    pub const fn unit() -> Self {
        Self::new(0.0, 1.0, 10.0, 10.0)
    }
}

impl Default for CrystalBallShape {
    fn default() -> Self {
        Self::unit()
    }
}

/// Crystal Ball distribution with precomputed normalisation constants.
///
/// The core is Gaussian within `alpha` standard deviations of the mean and
/// both tails follow the same power law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrystalBall {
    shape: CrystalBallShape,
    b: f64,
    c: f64,
    d: f64,
    norm: f64,
    norm_a: f64,
    norm_s: f64,
    norm_c: f64,
    f: f64,
    g: f64,
    k: f64,
    cdf_lower: f64,
    cdf_upper: f64,
}

impl CrystalBall {
    /// Builds the distribution, rejecting non-finite or degenerate parameters.
    pub fn new(shape: CrystalBallShape) -> Result<Self, SystError> {
        let CrystalBallShape {
            mean,
            sigma,
            alpha,
            n,
        } = shape;
        let finite = [mean, sigma, alpha, n].iter().all(|v| v.is_finite());
        if !finite || sigma <= 0.0 || alpha <= 0.0 || n <= 1.0 {
            return Err(SystError::Configuration(
                ErrorInfo::new("invalid_crystal_ball", "crystal ball parameters out of range")
                    .with_context("mean", mean.to_string())
                    .with_context("sigma", sigma.to_string())
                    .with_context("alpha", alpha.to_string())
                    .with_context("n", n.to_string())
                    .with_hint("sigma > 0, alpha > 0 and n > 1 are required"),
            ));
        }

        let sqrt_pi_over_2 = (PI_TRUNCATED / 2.0).sqrt();
        let fa = alpha.abs();
        let ex = (-fa * fa / 2.0).exp();
        let a = (n / fa).powf(n) * ex;
        let c1 = n / fa / (n - 1.0) * ex;
        let d1 = 2.0 * sqrt_pi_over_2 * erf(fa / SQRT2);

        let norm = 1.0 / sigma / (d1 + 2.0 * c1);
        let norm_s = norm * sigma;
        let mut cb = Self {
            shape,
            b: n / fa - fa,
            c: (d1 + 2.0 * c1) / c1,
            d: (d1 + 2.0 * c1) / 2.0,
            norm,
            norm_a: norm * a,
            norm_s,
            norm_c: norm_s * c1,
            f: 1.0 - fa * fa / n,
            g: sigma * n / fa,
            k: 1.0 / (n - 1.0),
            cdf_lower: 0.0,
            cdf_upper: 0.0,
        };
        cb.cdf_lower = cb.cdf(mean - alpha * sigma);
        cb.cdf_upper = cb.cdf(mean + alpha * sigma);
        Ok(cb)
    }

    /// Returns the parameters the distribution was built from.
    pub fn shape(&self) -> CrystalBallShape {
        self.shape
    }

    /// Probability density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        let s = &self.shape;
        let d = (x - s.mean) / s.sigma;
        if d < -s.alpha {
            self.norm_a * (self.b - d).powf(-s.n)
        } else if d > s.alpha {
            self.norm_a * (self.b + d).powf(-s.n)
        } else {
            self.norm * (-d * d / 2.0).exp()
        }
    }

    /// Cumulative distribution at `x`.
    pub fn cdf(&self, x: f64) -> f64 {
        let s = &self.shape;
        let d = (x - s.mean) / s.sigma;
        if d < -s.alpha {
            self.norm_c / (self.f - s.sigma * d / self.g).powf(s.n - 1.0)
        } else if d > s.alpha {
            self.norm_c * (self.c - (self.f + s.sigma * d / self.g).powf(1.0 - s.n))
        } else {
            let sqrt_pi_over_2 = (PI_TRUNCATED / 2.0).sqrt();
            self.norm_s * (self.d - sqrt_pi_over_2 * erf(-d / SQRT2))
        }
    }

    /// Inverse cumulative distribution for `u` in `(0, 1)`.
    pub fn inv_cdf(&self, u: f64) -> f64 {
        let s = &self.shape;
        if u < self.cdf_lower {
            s.mean + self.g * (self.f - (self.norm_c / u).powf(self.k))
        } else if u > self.cdf_upper {
            s.mean - self.g * (self.f - (self.c - u / self.norm_c).powf(-self.k))
        } else {
            let sqrt_pi_over_2 = (PI_TRUNCATED / 2.0).sqrt();
            s.mean - SQRT2 * s.sigma * erf_inv((self.d - u / self.norm_s) / sqrt_pi_over_2)
        }
    }
}

/// Identifies the object a draw belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedKey {
    /// Event number.
    pub event: u64,
    /// Luminosity block.
    pub lumi: u64,
    /// Object azimuth.
    pub phi: f64,
}

impl SeedKey {
    /// Creates a new key.
    pub fn new(event: u64, lumi: u64, phi: f64) -> Self {
        Self { event, lumi, phi }
    }
}

/// Draws one value from `dist` for the object identified by `key`.
///
/// The draw is a pure function of `key` and the distribution parameters: the
/// seed is mixed from the key, a fresh generator produces one uniform number
/// and the inverse CDF maps it onto the shape.
pub fn deterministic_draw(dist: &CrystalBall, key: SeedKey) -> f64 {
    let mut rng = EventRng::for_object(key.event, key.lumi, key.phi);
    dist.inv_cdf(rng.uniform())
}

/// Convenience wrapper holding a validated shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterministicSampler {
    dist: CrystalBall,
}

impl DeterministicSampler {
    /// Validates `shape` and builds a sampler for it.
    pub fn new(shape: CrystalBallShape) -> Result<Self, SystError> {
        Ok(Self {
            dist: CrystalBall::new(shape)?,
        })
    }

    /// Returns the underlying distribution.
    pub fn distribution(&self) -> &CrystalBall {
        &self.dist
    }

    /// Draws the value for one object.
    pub fn draw(&self, key: SeedKey) -> f64 {
        deterministic_draw(&self.dist, key)
    }
}
