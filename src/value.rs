//! Recorded value handles.
//!
//! A [`Value`] is what user code computes with while a [`Recorder`] is open:
//! it carries the record-time numeric value together with its tape identity —
//! a true constant, a dynamic parameter, or a tape variable. Arithmetic on
//! values appends operations to the recorder the value borrows.

use std::fmt;

use crate::float::Float;
use crate::opcode::OpCode;
use crate::recorder::{Cmp, Recorder};

/// Tape identity of a recorded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    /// Constant; folded into operations as a parameter when needed.
    Con,
    /// Dynamic parameter, by parameter-table index.
    Dyn(u32),
    /// Tape variable, by address.
    Var(u32),
}

/// A scalar participating in a recording.
#[derive(Clone, Copy)]
pub struct Value<'t, F: Float> {
    pub(crate) rec: &'t Recorder<F>,
    pub(crate) value: F,
    pub(crate) kind: Kind,
}

impl<'t, F: Float> fmt::Debug for Value<'t, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("value", &self.value)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<'t, F: Float> Value<'t, F> {
    /// The record-time numeric value.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    /// True if this is a tape variable.
    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, Kind::Var(_))
    }

    /// True if this is a dynamic parameter.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, Kind::Dyn(_))
    }

    /// True if this is a constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, Kind::Con)
    }

    // ── Unary math ──

    #[inline]
    pub fn abs(self) -> Self {
        self.rec.record_unary(OpCode::Abs, self)
    }

    /// Sign function: -1, 0, or +1. Derivative is zero where it exists.
    #[inline]
    pub fn signum(self) -> Self {
        self.rec.record_unary(OpCode::Sign, self)
    }

    #[inline]
    pub fn recip(self) -> Self {
        self.rec.record_unary(OpCode::Recip, self)
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        self.rec.record_unary(OpCode::Sqrt, self)
    }

    #[inline]
    pub fn exp(self) -> Self {
        self.rec.record_unary(OpCode::Exp, self)
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.rec.record_unary(OpCode::Ln, self)
    }

    #[inline]
    pub fn sin(self) -> Self {
        self.rec.record_unary(OpCode::Sin, self)
    }

    #[inline]
    pub fn cos(self) -> Self {
        self.rec.record_unary(OpCode::Cos, self)
    }

    #[inline]
    pub fn tan(self) -> Self {
        self.rec.record_unary(OpCode::Tan, self)
    }

    #[inline]
    pub fn sinh(self) -> Self {
        self.rec.record_unary(OpCode::Sinh, self)
    }

    #[inline]
    pub fn cosh(self) -> Self {
        self.rec.record_unary(OpCode::Cosh, self)
    }

    #[inline]
    pub fn tanh(self) -> Self {
        self.rec.record_unary(OpCode::Tanh, self)
    }

    #[inline]
    pub fn asin(self) -> Self {
        self.rec.record_unary(OpCode::Asin, self)
    }

    #[inline]
    pub fn acos(self) -> Self {
        self.rec.record_unary(OpCode::Acos, self)
    }

    #[inline]
    pub fn atan(self) -> Self {
        self.rec.record_unary(OpCode::Atan, self)
    }

    #[inline]
    pub fn asinh(self) -> Self {
        self.rec.record_unary(OpCode::Asinh, self)
    }

    #[inline]
    pub fn acosh(self) -> Self {
        self.rec.record_unary(OpCode::Acosh, self)
    }

    #[inline]
    pub fn atanh(self) -> Self {
        self.rec.record_unary(OpCode::Atanh, self)
    }

    /// Integer power, lowered at record time to a square-and-multiply
    /// product chain (a reciprocal on top for negative exponents).
    pub fn powi(self, n: i32) -> Self {
        let mut result = self.rec.constant(F::one());
        let mut base = self;
        // Widen before taking the magnitude so `i32::MIN` is handled.
        let mut m = (n as i64).unsigned_abs();
        while m > 0 {
            if m & 1 == 1 {
                result = result * base;
            }
            m >>= 1;
            if m > 0 {
                base = base * base;
            }
        }
        if n < 0 {
            result = result.recip();
        }
        result
    }

    /// General power, lowered at record time to `exp(e * ln(self))`.
    #[inline]
    pub fn powf(self, e: Self) -> Self {
        (self.ln() * e).exp()
    }
}

// ── Comparisons ──
//
// Comparing values records a comparison operation when a variable is
// involved; the forward sweep re-checks the recorded relation at order zero
// and counts the operations whose outcome changed.

impl<'t, F: Float> PartialEq for Value<'t, F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.rec.record_compare(Cmp::Eq, *self, *other)
    }
}

impl<'t, F: Float> PartialOrd for Value<'t, F> {
    /// Compares record-time values without recording; use the comparison
    /// operators themselves for recorded branches.
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }

    #[inline]
    fn lt(&self, other: &Self) -> bool {
        self.rec.record_compare(Cmp::Lt, *self, *other)
    }

    #[inline]
    fn le(&self, other: &Self) -> bool {
        self.rec.record_compare(Cmp::Le, *self, *other)
    }

    #[inline]
    fn gt(&self, other: &Self) -> bool {
        other.rec.record_compare(Cmp::Lt, *other, *self)
    }

    #[inline]
    fn ge(&self, other: &Self) -> bool {
        other.rec.record_compare(Cmp::Le, *other, *self)
    }
}

impl<'t, F: Float> PartialEq<F> for Value<'t, F> {
    #[inline]
    fn eq(&self, other: &F) -> bool {
        let rhs = self.rec.constant(*other);
        self.rec.record_compare(Cmp::Eq, *self, rhs)
    }
}

impl<'t, F: Float> PartialOrd<F> for Value<'t, F> {
    #[inline]
    fn partial_cmp(&self, other: &F) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(other)
    }

    #[inline]
    fn lt(&self, other: &F) -> bool {
        let rhs = self.rec.constant(*other);
        self.rec.record_compare(Cmp::Lt, *self, rhs)
    }

    #[inline]
    fn le(&self, other: &F) -> bool {
        let rhs = self.rec.constant(*other);
        self.rec.record_compare(Cmp::Le, *self, rhs)
    }

    #[inline]
    fn gt(&self, other: &F) -> bool {
        let rhs = self.rec.constant(*other);
        self.rec.record_compare(Cmp::Lt, rhs, *self)
    }

    #[inline]
    fn ge(&self, other: &F) -> bool {
        let rhs = self.rec.constant(*other);
        self.rec.record_compare(Cmp::Le, rhs, *self)
    }
}
