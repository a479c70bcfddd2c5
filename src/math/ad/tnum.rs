//! `TNum`: a taped scalar that behaves like `f64` but records every
//! operation applied to it onto a thread-local [`Tape`].
//!
//! Grounded on `original_source/Tdouble.hpp`: each operator computes the
//! forward value directly and records exactly one node carrying the
//! local partial derivatives ("weights") with respect to its operand(s).
//! Comparisons and ordering only ever look at the value, never record.
//!
//! The tape lives in a `thread_local!`, not behind an explicit context
//! parameter threaded through every call — this keeps pricing code
//! (Black-Scholes, the smoother, interpolation) generic over `f64` and
//! `TNum` without an extra parameter on every function, matching how
//! `Tdouble::tape` is a static shared across all instances in the
//! original. A Monte Carlo engine that wants independent tapes per
//! thread (for parallel path batches) gets that for free from
//! `thread_local!`; see `DESIGN.md`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::tape::Tape;
use crate::utils::num::Real;

thread_local! {
    static TAPE: RefCell<Tape> = RefCell::new(Tape::new());
}

/// Run `f` with exclusive access to this thread's tape.
pub fn with_tape<R>(f: impl FnOnce(&mut Tape) -> R) -> R {
    TAPE.with(|t| f(&mut t.borrow_mut()))
}

#[derive(Clone, Copy, Debug)]
pub struct TNum {
    value: f64,
    node: usize,
}

impl TNum {
    /// Record a fresh leaf for `value`: an independent variable whose
    /// adjoint after propagation is the derivative with respect to it.
    pub fn leaf(value: f64) -> Self {
        let node = with_tape(|t| t.record_leaf());
        TNum { value, node }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.value
    }

    #[inline]
    pub fn node_index(self) -> usize {
        self.node
    }

    pub fn adjoint(self) -> f64 {
        with_tape(|t| t.adjoint(self.node))
    }

    fn unary(value: f64, arg: TNum, weight: f64) -> Self {
        let node = with_tape(|t| t.record_unary(arg.node, weight));
        TNum { value, node }
    }

    fn binary(value: f64, lhs: TNum, w_lhs: f64, rhs: TNum, w_rhs: f64) -> Self {
        let node = with_tape(|t| t.record_binary(lhs.node, w_lhs, rhs.node, w_rhs));
        TNum { value, node }
    }

    pub fn set_mark() {
        with_tape(|t| t.set_mark());
    }

    /// Propagate from `self` down to the start of the tape.
    pub fn propagate_to_start(self) {
        with_tape(|t| t.propagate_to_start(self.node));
    }

    /// Propagate from `self` (which must be at or after the mark) down to
    /// the mark.
    pub fn propagate_to_mark(self) {
        with_tape(|t| t.propagate_to_mark(self.node));
    }

    /// Finish propagating the pre-mark region down to the start, using
    /// adjoints already accumulated there by prior `propagate_to_mark`
    /// calls.
    pub fn propagate_from_mark_to_start() {
        with_tape(|t| t.propagate_from_mark_to_start());
    }

    pub fn reset_to_mark() {
        with_tape(|t| t.reset_to_mark());
    }

    pub fn clear_tape() {
        with_tape(|t| t.clear());
    }

    pub fn tape_len() -> usize {
        with_tape(|t| t.len())
    }

    pub fn pow(self, rhs: TNum) -> Self {
        let val = self.value.powf(rhs.value);
        TNum::binary(
            val,
            self,
            rhs.value * val / self.value,
            rhs,
            self.value.ln() * val,
        )
    }

    pub fn powf_const(self, rhs: f64) -> Self {
        let val = self.value.powf(rhs);
        TNum::unary(val, self, rhs * val / self.value)
    }
}

impl From<f64> for TNum {
    fn from(value: f64) -> Self {
        TNum::leaf(value)
    }
}

impl fmt::Display for TNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl PartialEq for TNum {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl PartialEq<f64> for TNum {
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}
impl PartialOrd for TNum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}
impl PartialOrd<f64> for TNum {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

// ---------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------

impl Add for TNum {
    type Output = TNum;
    fn add(self, rhs: TNum) -> TNum {
        TNum::binary(self.value + rhs.value, self, 1.0, rhs, 1.0)
    }
}
impl Add<f64> for TNum {
    type Output = TNum;
    fn add(self, rhs: f64) -> TNum {
        TNum::unary(self.value + rhs, self, 1.0)
    }
}

impl Sub for TNum {
    type Output = TNum;
    fn sub(self, rhs: TNum) -> TNum {
        TNum::binary(self.value - rhs.value, self, 1.0, rhs, -1.0)
    }
}
impl Sub<f64> for TNum {
    type Output = TNum;
    fn sub(self, rhs: f64) -> TNum {
        TNum::unary(self.value - rhs, self, 1.0)
    }
}

impl Mul for TNum {
    type Output = TNum;
    fn mul(self, rhs: TNum) -> TNum {
        TNum::binary(self.value * rhs.value, self, rhs.value, rhs, self.value)
    }
}
impl Mul<f64> for TNum {
    type Output = TNum;
    fn mul(self, rhs: f64) -> TNum {
        TNum::unary(self.value * rhs, self, rhs)
    }
}

impl Div for TNum {
    type Output = TNum;
    fn div(self, rhs: TNum) -> TNum {
        let val = self.value / rhs.value;
        TNum::binary(
            val,
            self,
            1.0 / rhs.value,
            rhs,
            -(self.value / (rhs.value * rhs.value)),
        )
    }
}
impl Div<f64> for TNum {
    type Output = TNum;
    fn div(self, rhs: f64) -> TNum {
        TNum::unary(self.value / rhs, self, 1.0 / rhs)
    }
}

impl Neg for TNum {
    type Output = TNum;
    fn neg(self) -> TNum {
        TNum::unary(-self.value, self, -1.0)
    }
}

impl AddAssign for TNum {
    fn add_assign(&mut self, rhs: TNum) {
        *self = *self + rhs;
    }
}
impl AddAssign<f64> for TNum {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}
impl SubAssign for TNum {
    fn sub_assign(&mut self, rhs: TNum) {
        *self = *self - rhs;
    }
}
impl SubAssign<f64> for TNum {
    fn sub_assign(&mut self, rhs: f64) {
        *self = *self - rhs;
    }
}
impl MulAssign for TNum {
    fn mul_assign(&mut self, rhs: TNum) {
        *self = *self * rhs;
    }
}
impl MulAssign<f64> for TNum {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}
impl DivAssign for TNum {
    fn div_assign(&mut self, rhs: TNum) {
        *self = *self / rhs;
    }
}
impl DivAssign<f64> for TNum {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

// f64 op TNum: commutative ops flip, div/sub need their own dedicated weight.
impl Add<TNum> for f64 {
    type Output = TNum;
    fn add(self, rhs: TNum) -> TNum {
        rhs + self
    }
}
impl Sub<TNum> for f64 {
    type Output = TNum;
    fn sub(self, rhs: TNum) -> TNum {
        TNum::unary(self - rhs.value, rhs, -1.0)
    }
}
impl Mul<TNum> for f64 {
    type Output = TNum;
    fn mul(self, rhs: TNum) -> TNum {
        rhs * self
    }
}
impl Div<TNum> for f64 {
    type Output = TNum;
    fn div(self, rhs: TNum) -> TNum {
        let val = self / rhs.value;
        TNum::unary(val, rhs, -(self / (rhs.value * rhs.value)))
    }
}

// ---------------------------------------------------------------------
// Free functions: unary math, matching Real's contract
// ---------------------------------------------------------------------

pub fn sqrt(arg: TNum) -> TNum {
    let val = arg.value.sqrt();
    TNum::unary(val, arg, 0.5 / val)
}

pub fn exp(arg: TNum) -> TNum {
    let val = arg.value.exp();
    TNum::unary(val, arg, val)
}

pub fn ln(arg: TNum) -> TNum {
    let val = arg.value.ln();
    TNum::unary(val, arg, 1.0 / arg.value)
}

pub fn abs(arg: TNum) -> TNum {
    let val = arg.value.abs();
    let w = if arg.value > 0.0 { 1.0 } else { -1.0 };
    TNum::unary(val, arg, w)
}

pub fn sin(arg: TNum) -> TNum {
    let val = arg.value.sin();
    TNum::unary(val, arg, arg.value.cos())
}

pub fn cos(arg: TNum) -> TNum {
    let val = arg.value.cos();
    TNum::unary(val, arg, -arg.value.sin())
}

pub fn max(l: TNum, r: TNum) -> TNum {
    if l.value > r.value {
        TNum::binary(l.value, l, 1.0, r, 0.0)
    } else {
        TNum::binary(r.value, l, 0.0, r, 1.0)
    }
}

pub fn min(l: TNum, r: TNum) -> TNum {
    if l.value < r.value {
        TNum::binary(l.value, l, 1.0, r, 0.0)
    } else {
        TNum::binary(r.value, l, 0.0, r, 1.0)
    }
}

impl Real for TNum {
    #[inline]
    fn value(self) -> f64 {
        self.value
    }
    fn ln(self) -> Self {
        ln(self)
    }
    fn exp(self) -> Self {
        exp(self)
    }
    fn powf(self, rhs: Self) -> Self {
        self.pow(rhs)
    }
    fn sqrt(self) -> Self {
        sqrt(self)
    }
    fn sin(self) -> Self {
        sin(self)
    }
    fn cos(self) -> Self {
        cos(self)
    }
    fn abs(self) -> Self {
        abs(self)
    }
    fn min(self, other: Self) -> Self {
        min(self, other)
    }
    fn max(self, other: Self) -> Self {
        max(self, other)
    }
}
