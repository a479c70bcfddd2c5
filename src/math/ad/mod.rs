//! Reverse-mode algorithmic differentiation core.
//!
//! [`TNum`] is the taped scalar; [`Tape`] is the computation graph it
//! records onto, stored in three [`ChunkedArena`]s (nodes, edge weights,
//! child indices) via [`Node`].

pub mod chunked_arena;
pub mod node;
pub mod tape;
pub mod tnum;

pub use chunked_arena::ChunkedArena;
pub use node::Node;
pub use tape::Tape;
pub use tnum::{with_tape, TNum};
