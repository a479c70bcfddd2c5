//! L'Ecuyer's MRG32k3a combined multiple-recursive generator, with
//! antithetic pairing on the Gaussian stream.
//!
//! Grounded on `original_source/Mrg32k.hpp` and `RNG_base.hpp` for the
//! constants, seeding, and the `init`/antithetic-toggle interface. The
//! state shift (`x2 <- x1 <- x0 <- new`) is the textbook MRG32k3a
//! recurrence; the original C++ overwrote `x1`/`x2` from the
//! already-updated `x0` in the same statement, which collapses the three
//! lags into one after the first draw — that looks like a transcription
//! bug rather than an intended design, so it is not reproduced here (see
//! `DESIGN.md`).
//!
//! Antithetic variates: odd-numbered calls negate the previous Gaussian
//! vector in place rather than drawing new uniforms, exactly as
//! `Mrg32k_RNG::nextG` does.

use super::GaussianSource;

const M1: f64 = 4_294_967_087.0; // 2^32 - 209
const M2: f64 = 4_294_944_443.0; // 2^32 - 28532
const A11: f64 = 1_403_580.0;
const A12: f64 = 810_728.0;
const A20: f64 = 527_612.0;
const A22: f64 = 1_370_589.0;
const MY_MAX: f64 = 4_294_967_088.0;

pub struct Mrg32k3a {
    seed_a: f64,
    seed_b: f64,
    x0: f64,
    x1: f64,
    x2: f64,
    y0: f64,
    y1: f64,
    y2: f64,
    antithetic: bool,
    last_gaussians: Vec<f64>,
}

impl Mrg32k3a {
    pub fn new(seed_a: u32, seed_b: u32) -> Self {
        assert!((seed_a as f64) < M1 && (seed_b as f64) < M2, "seed out of range");
        let mut rng = Mrg32k3a {
            seed_a: seed_a as f64,
            seed_b: seed_b as f64,
            x0: 0.0,
            x1: 0.0,
            x2: 0.0,
            y0: 0.0,
            y1: 0.0,
            y2: 0.0,
            antithetic: false,
            last_gaussians: Vec::new(),
        };
        rng.reset();
        rng
    }

    /// Default seeds from the reference scenarios: alpha=12345, beta=54321.
    pub fn reference() -> Self {
        Mrg32k3a::new(12345, 54321)
    }

    pub fn reset(&mut self) {
        self.x0 = self.seed_a;
        self.x1 = self.seed_a;
        self.x2 = self.seed_a;
        self.y0 = self.seed_b;
        self.y1 = self.seed_b;
        self.y2 = self.seed_b;
        self.antithetic = false;
    }

    fn next_unif(&mut self) -> f64 {
        let x = A11 * self.x1 + A12 * self.x2;
        let x = x - (x / M1).trunc() * M1;
        self.x2 = self.x1;
        self.x1 = self.x0;
        self.x0 = x;

        let y = A20 * self.y0 + A22 * self.y2;
        let y = y - (y / M1).trunc() * M1;
        self.y2 = self.y1;
        self.y1 = self.y0;
        self.y0 = y;

        if x > y {
            (x - y) / MY_MAX
        } else {
            (x - y + M1) / MY_MAX
        }
    }
}

impl GaussianSource for Mrg32k3a {
    fn init(&mut self, dim: usize) {
        self.last_gaussians = vec![0.0; dim];
        self.reset();
    }

    fn next_gaussians(&mut self, out: &mut [f64]) {
        assert_eq!(out.len(), self.last_gaussians.len(), "dim mismatch with init()");
        if self.antithetic {
            for (o, prev) in out.iter_mut().zip(self.last_gaussians.iter()) {
                *o = -prev;
            }
            self.antithetic = false;
        } else {
            for o in out.iter_mut() {
                let u = self.next_unif();
                *o = inv_normal_cdf(u);
            }
            self.last_gaussians.copy_from_slice(out);
            self.antithetic = true;
        }
    }
}

/// Acklam's rational approximation of the inverse standard-normal CDF,
/// accurate to about 1.15e-9 absolute error across (0, 1).
pub fn inv_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e+01,
        2.209_460_984_245_205e+02,
        -2.759_285_104_469_687e+02,
        1.383_577_518_672_690e+02,
        -3.066_479_806_614_716e+01,
        2.506_628_277_459_239e+00,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e+01,
        1.615_858_368_580_409e+02,
        -1.556_989_798_598_866e+02,
        6.680_131_188_771_972e+01,
        -1.328_068_155_288_572e+01,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-03,
        -3.223_964_580_411_365e-01,
        -2.400_758_277_161_838e+00,
        -2.549_732_539_343_734e+00,
        4.374_664_141_464_968e+00,
        2.938_163_982_698_783e+00,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-03,
        3.224_671_290_700_398e-01,
        2.445_134_137_142_996e+00,
        3.754_408_661_907_416e+00,
    ];

    const P_LOW: f64 = 0.024_25;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
