//! A local-volatility equity-derivatives Monte Carlo pricing engine built
//! around a reverse-mode AAD core.
//!
//! [`math::ad`] holds the engine itself — the taped scalar [`math::ad::TNum`],
//! its [`math::ad::Tape`], and the [`math::ad::ChunkedArena`] it's built on.
//! Everything else is a collaborator: [`vol`] turns a characteristic-function
//! model into a local-vol grid, [`products`] names what's being priced,
//! [`smoother`] keeps discontinuous payoffs differentiable, and [`mc`] is the
//! per-path driver that ties a product, a surface, and an RNG together under
//! tape mark/reset checkpointing.

pub mod math;
pub mod mc;
pub mod products;
pub mod rng;
pub mod smoother;
pub mod utils;
pub mod vol;

pub mod prelude;
