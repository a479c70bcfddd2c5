//! Gaussian-vector sources for the Monte Carlo driver.
//!
//! The driver only depends on [`GaussianSource`]; `Mrg32k3a` is the
//! reference generator the end-to-end scenarios are calibrated against
//! (grounded on `original_source/Mrg32k.hpp`), while [`StdRngSource`]
//! wraps `rand`'s generators the way
//! `rustatlas/src/models/blackscholes.rs` does, for quick ad-hoc runs
//! that don't need antithetic reproducibility.

pub mod mrg32k3a;

pub use mrg32k3a::Mrg32k3a;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// A source of independent standard-normal draws, one vector per path.
pub trait GaussianSource {
    /// (Re)allocate internal buffers for vectors of length `dim`.
    fn init(&mut self, dim: usize);
    /// Fill `out` with the next vector of standard normals.
    fn next_gaussians(&mut self, out: &mut [f64]);
}

/// Thin wrapper over `rand`'s `StdRng` + `rand_distr::StandardNormal`, no
/// antithetic pairing.
pub struct StdRngSource {
    rng: StdRng,
}

impl StdRngSource {
    pub fn seeded(seed: u64) -> Self {
        StdRngSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        StdRngSource {
            rng: StdRng::from_entropy(),
        }
    }
}

impl GaussianSource for StdRngSource {
    fn init(&mut self, _dim: usize) {}

    fn next_gaussians(&mut self, out: &mut [f64]) {
        for slot in out.iter_mut() {
            *slot = self.rng.sample::<f64, _>(StandardNormal);
        }
    }
}
