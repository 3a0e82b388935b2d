//! `std::ops` implementations for [`Value`].
//!
//! Each operator records an opcode to the recorder both operands borrow;
//! mixing values from different recorders is a fatal error. Plain floats on
//! either side fold in as constant parameters.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::float::Float;
use crate::opcode::OpCode;
use crate::recorder::Bop;
use crate::value::Value;

impl<'t, F: Float> Add for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.rec.record_binary(Bop::Add, self, rhs)
    }
}

impl<'t, F: Float> Sub for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.rec.record_binary(Bop::Sub, self, rhs)
    }
}

impl<'t, F: Float> Mul for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.rec.record_binary(Bop::Mul, self, rhs)
    }
}

impl<'t, F: Float> Div for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.rec.record_binary(Bop::Div, self, rhs)
    }
}

impl<'t, F: Float> Neg for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.rec.record_unary(OpCode::Neg, self)
    }
}

// ── Value<F> ⊕ F ──

impl<'t, F: Float> Add<F> for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: F) -> Self {
        let rhs = self.rec.constant(rhs);
        self.rec.record_binary(Bop::Add, self, rhs)
    }
}

impl<'t, F: Float> Sub<F> for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: F) -> Self {
        let rhs = self.rec.constant(rhs);
        self.rec.record_binary(Bop::Sub, self, rhs)
    }
}

impl<'t, F: Float> Mul<F> for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: F) -> Self {
        let rhs = self.rec.constant(rhs);
        self.rec.record_binary(Bop::Mul, self, rhs)
    }
}

impl<'t, F: Float> Div<F> for Value<'t, F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: F) -> Self {
        let rhs = self.rec.constant(rhs);
        self.rec.record_binary(Bop::Div, self, rhs)
    }
}

// ── F ⊕ Value<F>, per concrete float ──

macro_rules! scalar_lhs_ops {
    ($f:ty) => {
        impl<'t> Add<Value<'t, $f>> for $f {
            type Output = Value<'t, $f>;
            #[inline]
            fn add(self, rhs: Value<'t, $f>) -> Value<'t, $f> {
                let lhs = rhs.rec.constant(self);
                rhs.rec.record_binary(Bop::Add, lhs, rhs)
            }
        }

        impl<'t> Sub<Value<'t, $f>> for $f {
            type Output = Value<'t, $f>;
            #[inline]
            fn sub(self, rhs: Value<'t, $f>) -> Value<'t, $f> {
                let lhs = rhs.rec.constant(self);
                rhs.rec.record_binary(Bop::Sub, lhs, rhs)
            }
        }

        impl<'t> Mul<Value<'t, $f>> for $f {
            type Output = Value<'t, $f>;
            #[inline]
            fn mul(self, rhs: Value<'t, $f>) -> Value<'t, $f> {
                let lhs = rhs.rec.constant(self);
                rhs.rec.record_binary(Bop::Mul, lhs, rhs)
            }
        }

        impl<'t> Div<Value<'t, $f>> for $f {
            type Output = Value<'t, $f>;
            #[inline]
            fn div(self, rhs: Value<'t, $f>) -> Value<'t, $f> {
                let lhs = rhs.rec.constant(self);
                rhs.rec.record_binary(Bop::Div, lhs, rhs)
            }
        }
    };
}

scalar_lhs_ops!(f32);
scalar_lhs_ops!(f64);

// Assign variants delegate to the binary ops.

impl<'t, F: Float> AddAssign for Value<'t, F> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<'t, F: Float> SubAssign for Value<'t, F> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<'t, F: Float> MulAssign for Value<'t, F> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<'t, F: Float> DivAssign for Value<'t, F> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl<'t, F: Float> AddAssign<F> for Value<'t, F> {
    #[inline]
    fn add_assign(&mut self, rhs: F) {
        *self = *self + rhs;
    }
}

impl<'t, F: Float> SubAssign<F> for Value<'t, F> {
    #[inline]
    fn sub_assign(&mut self, rhs: F) {
        *self = *self - rhs;
    }
}

impl<'t, F: Float> MulAssign<F> for Value<'t, F> {
    #[inline]
    fn mul_assign(&mut self, rhs: F) {
        *self = *self * rhs;
    }
}

impl<'t, F: Float> DivAssign<F> for Value<'t, F> {
    #[inline]
    fn div_assign(&mut self, rhs: F) {
        *self = *self / rhs;
    }
}
