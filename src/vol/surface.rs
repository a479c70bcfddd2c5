//! Local-volatility surface: implied-vol/local-vol grid generation via
//! Dupire's formula, and the grid object the Monte Carlo driver
//! interpolates against during simulation.
//!
//! Grounded on `original_source/Surface.hpp`: `PricingModel::call_price`
//! stands in for `Model::call`, `implied_vol`/`dupire_local_vol` for
//! `Model::iVol`/`Model::Dupires_LV`, and `generate_surface` for
//! `Generate_surface` — an ATM column computed first, then each
//! maturity row walked outward from the ATM spot in both directions,
//! freezing ("going flat") once a step changes implied or local vol by
//! more than `FREEZE_TOLERANCE` or produces a non-finite local vol.

use serde::{Deserialize, Serialize};

use crate::math::black_scholes::implied_vol_bisection;
use crate::math::interpolation::{bilinear_interp, linear_interp};
use crate::utils::errors::{AtlasError, Result};
use crate::utils::num::Real;

/// Anything that can price a European call: the Dupire FD stencil and
/// the implied-vol search only need this.
pub trait PricingModel {
    fn spot(&self) -> f64;
    fn call_price(&self, strike: f64, mat: f64) -> f64;
}

const DUPIRE_FD_STEP: f64 = 1e-4;
const FREEZE_TOLERANCE: f64 = 0.02;

pub fn implied_vol(model: &dyn PricingModel, strike: f64, mat: f64) -> f64 {
    let price = model.call_price(strike, mat);
    implied_vol_bisection(model.spot(), strike, price, mat)
}

/// Dupire's formula via central finite differences in maturity and
/// strike: `sqrt(2 * dC/dT / d2C/dK2) / K`.
pub fn dupire_local_vol(model: &dyn PricingModel, strike: f64, mat: f64) -> f64 {
    let h = DUPIRE_FD_STEP;
    let call_t = (model.call_price(strike, mat + h) - model.call_price(strike, mat - h)) / (2.0 * h);
    let call_kk = (model.call_price(strike - h, mat) + model.call_price(strike + h, mat)
        - 2.0 * model.call_price(strike, mat))
        / (h * h);
    (2.0 * call_t / call_kk).sqrt() / strike
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub spots: Vec<f64>,
    pub mats: Vec<f64>,
    /// row-major, `mats.len() * spots.len()`: row i = maturity i, across
    /// all spots.
    pub ivol: Vec<f64>,
    pub lvol: Vec<f64>,
}

/// Find the index of the spot nearest to the model's ATM level, matching
/// `Surface.hpp`'s `floor(spot) == floor(candidate)` search.
fn atm_index(spots: &[f64], spot: f64) -> Result<usize> {
    let floor_spot = spot.floor();
    spots
        .iter()
        .position(|&s| s.floor() == floor_spot)
        .ok_or_else(|| AtlasError::InvalidInputErr("ATM spot not found in grid; refine spots".into()))
}

pub fn generate_surface(model: &dyn PricingModel, spots: Vec<f64>, mats: Vec<f64>) -> Result<SurfaceGrid> {
    let n = spots.len();
    let m = mats.len();
    let idx = atm_index(&spots, model.spot())?;

    let mut ivol = vec![0.0; m * n];
    let mut lvol = vec![0.0; m * n];
    let at = |i: usize, j: usize| i * n + j;

    for i in 0..m {
        ivol[at(i, idx)] = implied_vol(model, spots[idx], mats[i]);
        lvol[at(i, idx)] = dupire_local_vol(model, spots[idx], mats[i]);
    }

    for i in 0..m {
        let mut go_flat = false;
        for j in (0..idx).rev() {
            let ires = implied_vol(model, spots[j], mats[i]);
            let lres = dupire_local_vol(model, spots[j], mats[i]);
            let prev_i = ivol[at(i, j + 1)];
            let prev_l = lvol[at(i, j + 1)];
            if go_flat
                || (lres - prev_l).abs() > FREEZE_TOLERANCE
                || (ires - prev_i).abs() > FREEZE_TOLERANCE
                || !lres.is_finite()
            {
                go_flat = true;
                ivol[at(i, j)] = prev_i;
                lvol[at(i, j)] = prev_l;
            } else {
                ivol[at(i, j)] = ires;
                lvol[at(i, j)] = lres;
            }
        }
    }

    for i in 0..m {
        let mut go_flat = false;
        for j in idx..n {
            if j == idx {
                continue;
            }
            let ires = implied_vol(model, spots[j], mats[i]);
            let lres = dupire_local_vol(model, spots[j], mats[i]);
            let prev_i = ivol[at(i, j - 1)];
            let prev_l = lvol[at(i, j - 1)];
            if go_flat
                || (lres - prev_l).abs() > FREEZE_TOLERANCE
                || (ires - prev_i).abs() > FREEZE_TOLERANCE
                || !lres.is_finite()
            {
                go_flat = true;
                ivol[at(i, j)] = prev_i;
                lvol[at(i, j)] = prev_l;
            } else {
                ivol[at(i, j)] = ires;
                lvol[at(i, j)] = lres;
            }
        }
    }

    Ok(SurfaceGrid { spots, mats, ivol, lvol })
}

/// Union of `a` and `b`, descending-then-deduped-then-ascending as in
/// `make_simulation_timeline` (two dates closer than 1e-9 are treated as
/// the same timeline point).
pub fn make_simulation_timeline(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut res: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    res.sort_by(|x, y| x.partial_cmp(y).unwrap());
    res.dedup_by(|x, y| (*x - *y).abs() < 1e-9);
    res
}

/// The local-vol grid the Monte Carlo driver actually simulates against,
/// generic over `T: Real` so grid values can be `TNum` leaves and carry
/// bucketed vega.
#[derive(Clone)]
pub struct LocalVolSurface<T: Real> {
    pub spots: Vec<f64>,
    pub mats: Vec<f64>,
    pub lvol: Vec<T>,
}

impl<T: Real> LocalVolSurface<T> {
    pub fn new(spots: Vec<f64>, mats: Vec<f64>, lvol: Vec<T>) -> Self {
        assert_eq!(lvol.len(), spots.len() * mats.len(), "grid shape mismatch");
        LocalVolSurface { spots, mats, lvol }
    }

    pub fn local_vol(&self, spot: f64, mat: f64) -> T {
        bilinear_interp(&self.mats, &self.spots, &self.lvol, mat, spot)
    }

    /// Interpolate along the spot axis alone, at the row for timeline
    /// step `step`. `spot` carries its own AAD chain through the
    /// interpolation weight when `T = TNum`, matching
    /// `original_source/MC.hpp`'s use of `interp` with a `Tdouble`
    /// running spot.
    pub fn local_vol_at_step(&self, step: usize, spot: T) -> T {
        let n = self.spots.len();
        let row = &self.lvol[step * n..(step + 1) * n];
        linear_interp(&self.spots, row, spot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::black_scholes::black_scholes_call;

    struct FlatVolModel {
        spot: f64,
        vol: f64,
    }
    impl PricingModel for FlatVolModel {
        fn spot(&self) -> f64 {
            self.spot
        }
        fn call_price(&self, strike: f64, mat: f64) -> f64 {
            black_scholes_call(self.spot, strike, self.vol, mat)
        }
    }

    #[test]
    fn flat_vol_model_recovers_its_own_vol_everywhere() {
        let model = FlatVolModel { spot: 100.0, vol: 0.25 };
        let iv = implied_vol(&model, 100.0, 1.0);
        assert!((iv - 0.25).abs() < 1e-4);
        let lv = dupire_local_vol(&model, 100.0, 1.0);
        assert!((lv - 0.25).abs() < 1e-2);
    }

    #[test]
    fn timeline_union_dedupes_and_sorts() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0 + 1e-12, 4.0, 0.5];
        let t = make_simulation_timeline(&a, &b);
        assert_eq!(t, vec![0.5, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn generate_surface_produces_finite_flat_grid() {
        let model = FlatVolModel { spot: 100.0, vol: 0.2 };
        let spots = vec![80.0, 90.0, 100.0, 110.0, 120.0];
        let mats = vec![0.5, 1.0];
        let grid = generate_surface(&model, spots, mats).unwrap();
        for v in &grid.lvol {
            assert!(v.is_finite());
        }
    }
}
