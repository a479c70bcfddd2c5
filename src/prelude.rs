#[allow(ambiguous_glob_reexports)]
pub use crate::{
    math::{
        ad::{ChunkedArena, Node, Tape, TNum},
        black_scholes::*,
        interpolation::*,
    },
    mc::*,
    products::*,
    rng::*,
    smoother::*,
    utils::{errors::*, num::*},
    vol::*,
};
