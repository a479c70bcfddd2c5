//! Closed-form Black-Scholes (zero rates/dividends, matching the thesis
//! engine's convention of an un-discounted, driftless local-vol model)
//! plus implied-vol inversion.
//!
//! Grounded on `original_source/BS.hpp`: `Black_scholes<T>` is a template
//! over the underlying number type, so instantiating it with `TNum`
//! differentiates the price with respect to spot/strike/vol/maturity for
//! free via the chain rule recorded by each operator. `norm_cdf`/`norm_pdf`
//! use the same rational approximation as
//! `rustatlas/src/math/black_scholes.rs`.

use crate::utils::num::Real;

#[inline]
pub fn norm_pdf<T: Real>(x: T) -> T {
    let inv_sqrt_2pi = T::from(1.0 / (2.0 * std::f64::consts::PI).sqrt());
    (-(x * x) * 0.5).exp() * inv_sqrt_2pi
}

/// Abramowitz & Stegun 26.2.17 rational approximation, accurate to ~7.5e-8.
#[inline]
pub fn norm_cdf<T: Real>(x: T) -> T {
    let k = T::from(1.0) / (T::from(1.0) + x.abs() * 0.2316419);
    let poly = k
        * (T::from(0.319_381_530)
            + k * (T::from(-0.356_563_782)
                + k * (T::from(1.781_477_937)
                    + k * (T::from(-1.821_255_978) + k * T::from(1.330_274_429)))));
    let approx = T::from(1.0) - norm_pdf(x) * poly;
    if x.value() >= 0.0 {
        approx
    } else {
        T::from(1.0) - approx
    }
}

/// Undiscounted Black-Scholes call price (no rate/dividend term, per the
/// local-vol engine's flat-forward convention).
pub fn black_scholes_call<T: Real>(spot: T, strike: T, vol: T, mat: T) -> T {
    let std = mat.sqrt() * vol;
    let half_var = std * std * 0.5;
    let d1 = ((spot / strike).ln() + half_var) / std;
    let d2 = d1 - std;
    spot * norm_cdf(d1) - strike * norm_cdf(d2)
}

const IVOL_EPS: f64 = 1e-12;

/// Bracket-then-bisect implied vol search. Returns `0.0` for a premium at
/// or below intrinsic value (deep OTM/ITM numerical degeneracy).
pub fn implied_vol_bisection(spot: f64, strike: f64, premium: f64, mat: f64) -> f64 {
    if premium <= (spot - strike).max(0.0) + IVOL_EPS {
        return 0.0;
    }

    let mut u = 0.5;
    while black_scholes_call(spot, strike, u, mat) < premium {
        u *= 2.0;
    }
    let mut l = 0.05;
    while black_scholes_call(spot, strike, l, mat) > premium {
        l /= 2.0;
    }

    let mut pu = black_scholes_call(spot, strike, u, mat);
    let mut pl = black_scholes_call(spot, strike, l, mat);

    while u - l > IVOL_EPS {
        let m = 0.5 * (u + l);
        let p = black_scholes_call(spot, strike, m, mat);
        if p > premium {
            u = m;
            pu = p;
        } else {
            l = m;
            pl = p;
        }
    }

    l + (premium - pl) / (pu - pl) * (u - l)
}
