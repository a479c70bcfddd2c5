//! The computation graph: three parallel [`ChunkedArena`]s holding nodes,
//! edge weights, and child back-pointers, plus reverse propagation.
//!
//! Grounded on `original_source/Tape.hpp`. Nodes are recorded in creation
//! order, which is a topological order of the graph (every child is
//! recorded strictly before any node that uses it as an input), so a
//! single reverse (highest-index-first) sweep accumulates every node's
//! adjoint before it is consumed.

use super::chunked_arena::ChunkedArena;
use super::node::Node;

pub struct Tape {
    nodes: ChunkedArena<Node>,
    weights: ChunkedArena<f64>,
    children: ChunkedArena<u32>,
}

impl Tape {
    pub fn new() -> Self {
        Tape {
            nodes: ChunkedArena::new(),
            weights: ChunkedArena::new(),
            children: ChunkedArena::new(),
        }
    }

    /// Record a leaf (no parents): an independent variable.
    pub fn record_leaf(&mut self) -> usize {
        self.nodes.emplace(Node::leaf())
    }

    /// Record a unary node: `d(out)/d(arg) = weight`.
    pub fn record_unary(&mut self, arg: usize, weight: f64) -> usize {
        let w_start = self.weights.reserve(1, 0.0) as u32;
        *self.weights.get_mut(w_start as usize) = weight;
        let c_start = self.children.reserve(1, 0) as u32;
        *self.children.get_mut(c_start as usize) = arg as u32;
        self.nodes.emplace(Node::with_children(1, w_start, c_start))
    }

    /// Record a binary node: `d(out)/d(lhs) = w_lhs`, `d(out)/d(rhs) = w_rhs`.
    pub fn record_binary(&mut self, lhs: usize, w_lhs: f64, rhs: usize, w_rhs: f64) -> usize {
        let w_start = self.weights.reserve(2, 0.0) as u32;
        *self.weights.get_mut(w_start as usize) = w_lhs;
        *self.weights.get_mut(w_start as usize + 1) = w_rhs;
        let c_start = self.children.reserve(2, 0) as u32;
        *self.children.get_mut(c_start as usize) = lhs as u32;
        *self.children.get_mut(c_start as usize + 1) = rhs as u32;
        self.nodes.emplace(Node::with_children(2, w_start, c_start))
    }

    pub fn adjoint(&self, idx: usize) -> f64 {
        self.nodes.get(idx).adjoint
    }

    pub fn set_adjoint(&mut self, idx: usize, value: f64) {
        self.nodes.get_mut(idx).adjoint = value;
    }

    pub fn accumulate_adjoint(&mut self, idx: usize, value: f64) {
        self.nodes.get_mut(idx).adjoint += value;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_mark(&mut self) {
        self.nodes.set_mark();
        self.weights.set_mark();
        self.children.set_mark();
    }

    pub fn has_mark(&self) -> bool {
        self.nodes.has_mark()
    }

    /// Rewind node/weight/child cursors to the last mark, ready to record
    /// the next Monte Carlo path over the same tape memory.
    pub fn reset_to_mark(&mut self) {
        self.nodes.reset_to_mark();
        self.weights.reset_to_mark();
        self.children.reset_to_mark();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.weights.clear();
        self.children.clear();
    }

    /// Zero every adjoint in `[from, to)`. Used before each propagation
    /// pass so stale adjoints from a previous path don't leak in.
    fn zero_adjoints(&mut self, from: usize, to: usize) {
        for i in from..to {
            self.nodes.get_mut(i).adjoint = 0.0;
        }
    }

    fn propagate_node(&mut self, idx: usize) {
        let node = *self.nodes.get(idx);
        let bar = node.adjoint;
        if bar == 0.0 || node.n_children == 0 {
            return;
        }
        for k in 0..node.n_children as usize {
            let w = *self.weights.get(node.weights_start as usize + k);
            let child = *self.children.get(node.children_start as usize + k) as usize;
            self.nodes.get_mut(child).adjoint += w * bar;
        }
    }

    /// Reverse sweep over `[from, to)` (`to` exclusive), seeding `seed_idx`
    /// with adjoint 1.0 first. `from` is typically 0 or a mark; `to` is
    /// typically the tape's current length or a mark.
    fn propagate_range(&mut self, from: usize, to: usize, seed_idx: usize) {
        assert!(seed_idx < to && seed_idx >= from, "seed index out of range");
        self.zero_adjoints(from, to);
        self.nodes.get_mut(seed_idx).adjoint = 1.0;
        let mut i = to;
        while i > from {
            i -= 1;
            self.propagate_node(i);
        }
    }

    /// Propagate from `seed_idx` down to index 0, covering the whole tape
    /// recorded so far. Used outside the Monte Carlo mark/reset loop, e.g.
    /// for a single standalone evaluation.
    pub fn propagate_to_start(&mut self, seed_idx: usize) {
        let len = self.len();
        self.propagate_range(0, len, seed_idx);
    }

    /// Propagate from `seed_idx` (which must be at or after the mark) down
    /// to the mark, leaving everything before the mark untouched. This is
    /// the per-path sweep in the Monte Carlo driver.
    pub fn propagate_to_mark(&mut self, seed_idx: usize) {
        let mark = self.nodes.mark_index();
        let len = self.len();
        self.propagate_range(mark, len, seed_idx);
    }

    /// Finish the reverse sweep over the pre-mark region. Every call to
    /// `propagate_to_mark` already walks edges from post-mark nodes
    /// straight into whichever pre-mark nodes they reference, so by the
    /// time the Monte Carlo loop is done those pre-mark nodes hold the
    /// sum of every path's contribution. This pass does not reseed or
    /// zero anything: it just keeps propagating those accumulated values
    /// further down through the pre-mark graph (e.g. a derived "forward"
    /// node flowing into the true `spot`/`rate` leaves).
    pub fn propagate_from_mark_to_start(&mut self) {
        let mark = self.nodes.mark_index();
        let mut i = mark;
        while i > 0 {
            i -= 1;
            self.propagate_node(i);
        }
    }
}

impl Default for Tape {
    fn default() -> Self {
        Tape::new()
    }
}
