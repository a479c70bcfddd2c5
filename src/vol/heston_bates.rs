//! Bates (stochastic-vol-plus-jumps) characteristic-function call pricer,
//! used to generate the implied-vol surface that in turn feeds the Dupire
//! local-vol computation.
//!
//! Grounded on `original_source/Bates_cf.hpp` + `cf_funcs.hpp`: the
//! characteristic function `cf_bates`, the Gil-Pelaez-style `p1`/`p2`
//! integrals, and a plain midpoint quadrature over `[0, 200]` in 400
//! steps. `Model::Bates::call` in `original_source/Model.hpp` passes its
//! jump-mean parameter in twice instead of jump-mean then jump-std; that
//! looks like a copy-paste typo rather than an intended model (see
//! `DESIGN.md`), so `bates_call_price` takes both parameters and wires
//! them correctly.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BatesParams {
    pub r: f64,
    pub q: f64,
    pub v0: f64,
    pub v_bar: f64,
    pub rho: f64,
    pub kappa: f64,
    pub sigma: f64,
    pub intensity: f64,
    pub jump_mean: f64,
    pub jump_std: f64,
}

fn cf_bates(om: Complex64, spot: f64, mat: f64, p: &BatesParams) -> Complex64 {
    let i = Complex64::i();
    let k = p.kappa;
    let sig2 = p.sigma * p.sigma;

    let d = ((p.rho * p.sigma * i * om - k).powf(2.0) + sig2 * (i * om + om * om)).sqrt();
    let g2 = (k - p.rho * p.sigma * i * om - d) / (k - p.rho * p.sigma * i * om + d);

    let cf1 = i * om * (spot.ln() + (p.r - p.q) * mat);
    let cf2 = p.v_bar * k / sig2
        * ((k - p.rho * p.sigma * i * om - d) * mat
            - 2.0 * ((Complex64::new(1.0, 0.0) - g2 * (-d * mat).exp()) / (1.0 - g2)).ln());
    let cf3 = p.v0 / sig2 * (k - p.rho * p.sigma * i * om - d) * (1.0 - (-d * mat).exp())
        / (Complex64::new(1.0, 0.0) - g2 * (-d * mat).exp());
    let cf4 = -p.intensity * p.jump_mean * i * om * mat
        + p.intensity
            * mat
            * ((Complex64::new(1.0 + p.jump_mean, 0.0)).powc(i * om)
                * (0.5 * p.jump_std * p.jump_std * i * om * (i * om - 1.0)).exp()
                - 1.0);

    (cf1 + cf2 + cf3 + cf4).exp()
}

fn p1_integrand(om: f64, spot: f64, strike: f64, mat: f64, p: &BatesParams) -> f64 {
    let i = Complex64::i();
    let numer = (-i * strike.ln() * om).exp() * cf_bates(Complex64::new(om, -1.0), spot, mat, p);
    let denom = i * om * spot * ((p.r - p.q) * mat).exp();
    (numer / denom).re
}

fn p2_integrand(om: f64, spot: f64, strike: f64, mat: f64, p: &BatesParams) -> f64 {
    let i = Complex64::i();
    let numer = (-i * strike.ln() * om).exp() * cf_bates(Complex64::new(om, 0.0), spot, mat, p);
    (numer / (i * om)).re
}

/// Midpoint quadrature: `original_source/cf_funcs.hpp::integral`.
fn integral(f: impl Fn(f64) -> f64, a: f64, b: f64, n: u32) -> f64 {
    let step = (b - a) / n as f64;
    let mut area = 0.0;
    for k in 0..n {
        area += f(a + (k as f64 + 0.5) * step) * step;
    }
    area
}

const QUAD_FROM: f64 = 0.0;
const QUAD_TO: f64 = 200.0;
const QUAD_STEPS: u32 = 400;

pub fn bates_call_price(spot: f64, strike: f64, mat: f64, p: &BatesParams) -> f64 {
    let v_p1 = 0.5
        + 1.0 / PI * integral(|om| p1_integrand(om, spot, strike, mat, p), QUAD_FROM, QUAD_TO, QUAD_STEPS);
    let v_p2 = 0.5
        + 1.0 / PI * integral(|om| p2_integrand(om, spot, strike, mat, p), QUAD_FROM, QUAD_TO, QUAD_STEPS);
    (-p.q * mat).exp() * spot * v_p1 - (-p.r * mat).exp() * strike * v_p2
}
