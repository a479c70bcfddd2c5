//! Piecewise-linear interpolation with edge clamping (no extrapolation
//! beyond the first/last node).
//!
//! Grounded on `original_source/interp.hpp` ("Borrowed from Antoine
//! Savine Github repo"): an `upper_bound` search over the x-axis, with
//! values outside `[x_first, x_last]` clamped flat to the nearest edge
//! value rather than extrapolated. Generalized here to `T: Real` so the
//! same code interpolates a `f64` local-vol grid or a `TNum` one, and
//! the query position `x0` is itself `T` rather than `f64` — when `T`
//! is `TNum` this carries the position's own sensitivity through the
//! interpolation weight, exactly as `interp<ITX, ITY, T>` does when
//! called with a `Tdouble` running spot in `original_source/MC.hpp`.

use crate::utils::num::Real;

/// Interpolate `y` at `x0` given the knots `(xs, ys)`, sorted ascending
/// by `xs`. Panics if `xs`/`ys` are empty or mismatched in length.
pub fn linear_interp<T: Real>(xs: &[f64], ys: &[T], x0: T) -> T {
    assert_eq!(xs.len(), ys.len(), "interpolation axis length mismatch");
    assert!(!xs.is_empty(), "interpolation on empty axis");

    let x0v = x0.value();
    if xs.len() == 1 || x0v <= xs[0] {
        return ys[0];
    }
    if x0v >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    // first index whose knot is strictly greater than x0
    let n = match xs.binary_search_by(|probe| probe.partial_cmp(&x0v).unwrap()) {
        Ok(i) => i,
        Err(i) => i,
    };
    // n is in (0, xs.len()-1) here since the edge cases were handled above
    let (x1, x2) = (xs[n - 1], xs[n]);
    let (y1, y2) = (ys[n - 1], ys[n]);
    let t = (x0 - x1) / (x2 - x1);
    y1 + (y2 - y1) * t
}

/// Bilinear interpolation over a row-major `(len(xs) * len(ys))` grid of
/// `z` values, `z[i * ys.len() + j]` corresponding to `(xs[i], ys[j])`.
/// Both query positions are plain `f64` — used for ad-hoc surface
/// lookups (reporting, calibration) rather than inside the Monte Carlo
/// step loop, which instead interpolates along the spot axis alone via
/// [`linear_interp`] with the running spot as `x0`.
pub fn bilinear_interp<T: Real>(xs: &[f64], ys: &[f64], z: &[T], x0: f64, y0: f64) -> T {
    assert_eq!(z.len(), xs.len() * ys.len(), "grid shape mismatch");
    let ny = ys.len();

    let row_at = |i: usize| -> T { linear_interp(ys, &z[i * ny..(i + 1) * ny], T::from(y0)) };

    if xs.len() == 1 || x0 <= xs[0] {
        return row_at(0);
    }
    if x0 >= xs[xs.len() - 1] {
        return row_at(xs.len() - 1);
    }
    let n = match xs.binary_search_by(|probe| probe.partial_cmp(&x0).unwrap()) {
        Ok(i) => i,
        Err(i) => i,
    };
    let (x1, x2) = (xs[n - 1], xs[n]);
    let z1 = row_at(n - 1);
    let z2 = row_at(n);
    let t = (x0 - x1) / (x2 - x1);
    z1 + (z2 - z1) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_two_knots() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        assert_eq!(linear_interp(&xs, &ys, 0.5), 0.5);
    }

    #[test]
    fn clamps_below_first_and_above_last() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [10.0, 20.0, 30.0];
        assert_eq!(linear_interp(&xs, &ys, -5.0), 10.0);
        assert_eq!(linear_interp(&xs, &ys, 50.0), 30.0);
    }

    #[test]
    fn interpolates_interior_segment() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 10.0];
        assert!((linear_interp(&xs, &ys, 1.5) - 10.0).abs() < 1e-12);
        assert!((linear_interp(&xs, &ys, 0.5) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bilinear_matches_linear_on_degenerate_row() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let z = [0.0, 1.0, 2.0, 3.0]; // row0: (0,0)=0,(0,1)=1 ; row1: (1,0)=2,(1,1)=3
        assert!((bilinear_interp(&xs, &ys, &z, 0.0, 0.5) - 0.5).abs() < 1e-12);
        assert!((bilinear_interp(&xs, &ys, &z, 1.0, 0.5) - 2.5).abs() < 1e-12);
        assert!((bilinear_interp(&xs, &ys, &z, 0.5, 0.5) - 1.5).abs() < 1e-12);
    }
}
