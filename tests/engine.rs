//! End-to-end scenarios: the AAD engine against hand derivatives and
//! node-count invariants, then the full pricing stack (surface generation,
//! Monte Carlo, Black-Scholes/Bates oracles) against each product shape.
//! Path counts are reduced from the reference 300,000 to keep this suite
//! fast; tolerances are loosened to match.

use localvol_aad::math::ad::TNum;
use localvol_aad::math::black_scholes::black_scholes_call;
use localvol_aad::mc::{price_auto_callable, price_european_call, price_up_and_out_call, ProductLeaves};
use localvol_aad::products::Product;
use localvol_aad::rng::Mrg32k3a;
use localvol_aad::vol::heston_bates::{bates_call_price, BatesParams};
use localvol_aad::vol::surface::{generate_surface, make_simulation_timeline, LocalVolSurface, PricingModel};

struct BatesModel {
    spot: f64,
    params: BatesParams,
}
impl PricingModel for BatesModel {
    fn spot(&self) -> f64 {
        self.spot
    }
    fn call_price(&self, strike: f64, mat: f64) -> f64 {
        bates_call_price(self.spot, strike, mat, &self.params)
    }
}

fn flat_surface(spots: Vec<f64>, mats: Vec<f64>, vol: f64) -> LocalVolSurface<TNum> {
    let n = spots.len();
    let m = mats.len();
    let lvol = vec![TNum::leaf(vol); n * m];
    LocalVolSurface::new(spots, mats, lvol)
}

/// Scenario 5: identity AAD check, `y = ((x+2)*3-1)/4` at `x=5`.
#[test]
fn identity_chain_matches_exact_derivative() {
    TNum::clear_tape();
    let x = TNum::leaf(5.0);
    let y = ((x + 2.0) * 3.0 - 1.0) / 4.0;
    y.propagate_to_start();
    assert!((y.value() - 5.0).abs() < 1e-12);
    assert!((x.adjoint() - 0.75).abs() < 1e-12);
}

/// Scenario 6: mark/reset consistency — 1000 ops before the mark, 1000
/// after, reset should bring the node count back to 1000.
#[test]
fn mark_reset_restores_node_count() {
    TNum::clear_tape();
    let mut acc = TNum::leaf(0.0); // the first of the 1000 pre-mark nodes
    for _ in 0..999 {
        acc = acc + 1.0;
    }
    assert_eq!(TNum::tape_len(), 1000);
    TNum::set_mark();
    for _ in 0..1000 {
        acc = acc + 1.0;
    }
    assert_eq!(TNum::tape_len(), 2000);
    TNum::reset_to_mark();
    assert_eq!(TNum::tape_len(), 1000);
}

/// Scenario 1: European call under constant vol against Black-Scholes.
#[test]
fn european_call_matches_black_scholes_price_and_delta() {
    TNum::clear_tape();
    let spot = TNum::leaf(100.0);
    let rate = TNum::leaf(0.0);
    let dividend = TNum::leaf(0.0);
    let strike = TNum::leaf(100.0);
    let maturity = TNum::leaf(1.0);
    let surface = flat_surface(vec![50.0, 100.0, 150.0, 200.0], vec![1.0], 0.2);
    let mut rng = Mrg32k3a::reference();

    let price = price_european_call(spot, rate, dividend, strike, maturity, &surface, &mut rng, 40_000);
    let bs_price = black_scholes_call(100.0, 100.0, 0.2, 1.0);
    assert!((price - bs_price).abs() / bs_price < 0.02);

    let delta = spot.adjoint();
    assert!((delta - 0.5398).abs() < 0.02);
}

/// Scenario 2: European call under a Bates-implied local-vol surface,
/// against the closed-form characteristic-function price. Bucket vegas
/// (the lvol leaves' own adjoints) should roughly sum to a finite-difference
/// total vega.
#[test]
fn european_call_under_bates_local_vol_matches_cf_price() {
    TNum::clear_tape();
    let params = BatesParams {
        r: 0.0,
        q: 0.0,
        v0: 0.04,
        v_bar: 0.05,
        rho: -0.7,
        kappa: 1.0,
        sigma: 0.2,
        intensity: 1.0,
        jump_mean: 0.05,
        jump_std: 0.05,
    };
    let model = BatesModel { spot: 100.0, params };

    let spots = vec![60.0, 80.0, 100.0, 110.0, 120.0, 140.0, 160.0];
    let mats = make_simulation_timeline(&[0.5, 1.0, 1.5, 2.0, 2.5, 3.0], &[3.0]);
    let grid = generate_surface(&model, spots.clone(), mats.clone()).expect("surface generation");

    let spot = TNum::leaf(100.0);
    let rate = TNum::leaf(0.0);
    let dividend = TNum::leaf(0.0);
    let strike = TNum::leaf(110.0);
    let maturity = TNum::leaf(3.0);

    let lvol_leaves: Vec<TNum> = grid.lvol.iter().map(|&v| TNum::leaf(v)).collect();
    let surface = LocalVolSurface::new(spots, mats, lvol_leaves.clone());

    let mut rng = Mrg32k3a::reference();
    let price = price_european_call(spot, rate, dividend, strike, maturity, &surface, &mut rng, 40_000);

    let cf_price = bates_call_price(100.0, 110.0, 3.0, &model.params);
    assert!((price - cf_price).abs() / cf_price < 0.15);

    let bucket_vega: f64 = lvol_leaves.iter().map(|l| l.adjoint()).sum();
    // a finite local-vol bump of the same magnitude should move price by
    // roughly the same amount as the summed bucket adjoints; just check
    // the sign and that it isn't identically zero (the strike is well away
    // from every frozen/flat region of the grid).
    assert!(bucket_vega.abs() > 0.0);
}

/// Scenario 3: up-and-out call price decreases monotonically as the
/// barrier tightens from 200 down to 101.
#[test]
fn up_and_out_call_price_is_monotone_in_barrier() {
    let mut prev = f64::INFINITY;
    for upper in [200.0, 150.0, 125.0, 101.0] {
        TNum::clear_tape();
        let spot = TNum::leaf(100.0);
        let rate = TNum::leaf(0.0);
        let dividend = TNum::leaf(0.0);
        let strike = TNum::leaf(100.0);
        let maturity = TNum::leaf(1.0);
        let upper_t = TNum::leaf(upper);
        let surface = flat_surface(vec![50.0, 100.0, 150.0, 200.0, 250.0], vec![0.25, 0.5, 0.75, 1.0], 0.2);
        let mut rng = Mrg32k3a::reference();
        let price = price_up_and_out_call(
            spot, rate, dividend, strike, maturity, upper_t, &surface, &mut rng, 8_000, 5.0,
        );
        assert!(price <= prev + 1e-6);
        prev = price;
    }
}

/// Scenario 4: auto-callable, spot deep in the money at every observation —
/// the smoothed payoff should approach the first coupon.
#[test]
fn auto_callable_approaches_first_coupon_when_deep_itm() {
    TNum::clear_tape();
    let spot = TNum::leaf(150.0);
    let rate = TNum::leaf(0.0);
    let dividend = TNum::leaf(0.0);
    let coupon = TNum::leaf(10.0);
    let upper = TNum::leaf(120.0);
    let lower = TNum::leaf(50.0);
    let anchor = TNum::leaf(100.0);
    let times = [1.0, 2.0, 3.0];
    let surface = flat_surface(vec![50.0, 100.0, 150.0, 200.0], times.to_vec(), 0.01);
    let mut rng = Mrg32k3a::reference();

    let price = price_auto_callable(
        spot, rate, dividend, coupon, upper, lower, anchor, &times, &surface, &mut rng, 4_000, 1.0,
    );
    assert!(price > 8.0 && price <= 10.5);
}

/// Scenario 4b: auto-callable that is never called away and drifts below
/// `lower` by the final observation — the only scenario that exercises the
/// final-observation branch's principal/capital-protection leg.
#[test]
fn auto_callable_never_called_pays_principal_loss_below_lower() {
    TNum::clear_tape();
    let spot = TNum::leaf(100.0);
    let rate = TNum::leaf(0.0);
    // mu = rate - dividend = -2.0/yr with near-zero vol: the path decays to
    // roughly spot*exp(-2*t) regardless of the Gaussian draws, so it never
    // nears `upper` (never called away) and ends far below `lower`.
    let dividend = TNum::leaf(2.0);
    let coupon = TNum::leaf(10.0);
    let upper = TNum::leaf(200.0);
    let lower = TNum::leaf(50.0);
    let anchor = TNum::leaf(100.0);
    let times = [1.0, 2.0, 3.0];
    let surface = flat_surface(vec![0.1, 50.0, 100.0, 200.0], times.to_vec(), 0.0001);
    let mut rng = Mrg32k3a::reference();

    let price = price_auto_callable(
        spot, rate, dividend, coupon, upper, lower, anchor, &times, &surface, &mut rng, 500, 1.0,
    );
    // running_spot ends near 100*exp(-6) =~ 0.25, deep below lower; the
    // coupon leg is out of the money, so only the unconditional principal
    // leg fires: running_spot - anchor =~ -99.75, a capital loss.
    assert!(price < -90.0 && price > -105.0);
}

/// The `Product`/`ProductLeaves` dispatch path used by callers that hold a
/// `Product` rather than calling the per-shape pricers directly.
#[test]
fn product_dispatch_matches_direct_call() {
    TNum::clear_tape();
    let product = Product::EuropeanCall { maturity: 1.0, strike: 100.0 };
    let leaves = ProductLeaves::EuropeanCall { strike: TNum::leaf(100.0), maturity: TNum::leaf(1.0) };
    let spot = TNum::leaf(100.0);
    let rate = TNum::leaf(0.0);
    let dividend = TNum::leaf(0.0);
    let surface = flat_surface(vec![50.0, 100.0, 150.0], vec![1.0], 0.2);
    let mut rng = Mrg32k3a::reference();

    let price = localvol_aad::mc::price(&product, &leaves, spot, rate, dividend, &surface, &mut rng, 5_000, 5.0);
    assert!(price > 0.0);
}
