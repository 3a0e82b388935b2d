//! Opcode catalog for the operation tape.
//!
//! Every recorded operation is one [`OpCode`] plus two `u32` argument slots.
//! Binary arithmetic comes in operand-kind variants: `Pv` takes a parameter
//! index in slot 0 and a variable address in slot 1, `Vp` the other way
//! around, `Vv` two variable addresses. The commutative ops (`Add`, `Mul`)
//! only need `Pv`; the recorder swaps operands. Unary ops take a variable
//! address in slot 0. Comparison ops produce no result variable; they record
//! the relation that held at record time so the forward sweep can count
//! branch invalidations. `Call` takes an index into the tape's atomic-call
//! table and occupies as many result addresses as the call has results.

use num_traits::Float;

/// Sentinel for an unused argument slot.
pub const UNUSED: u32 = u32::MAX;

/// Operation kinds recorded on a tape.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Independent variable. No arguments.
    Inv,
    /// Materialize a parameter as a variable; slot 0 is the parameter index.
    Par,

    // Binary arithmetic.
    AddPv,
    AddVv,
    SubPv,
    SubVp,
    SubVv,
    MulPv,
    MulVv,
    DivPv,
    DivVp,
    DivVv,

    // Unary.
    Neg,
    Abs,
    Sign,
    Recip,
    Sqrt,
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
    Asinh,
    Acosh,
    Atanh,

    // Comparisons (no result variable).
    LtPv,
    LtVp,
    LtVv,
    LePv,
    LeVp,
    LeVv,
    EqPv,
    EqVv,
    NePv,
    NeVv,

    /// Atomic function call; slot 0 indexes the tape's call table.
    Call,
}

/// Second-derivative structure of an opcode, used by Hessian sparsity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// Result is linear in every variable operand.
    Linear,
    /// One variable operand, nonzero second derivative.
    UnaryNonlinear,
    /// Two variable operands with cross second derivatives.
    BinaryNonlinear,
    /// Derivative is zero wherever it exists.
    ZeroDerivative,
}

impl OpCode {
    /// True for the binary arithmetic variants.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            OpCode::AddPv
                | OpCode::AddVv
                | OpCode::SubPv
                | OpCode::SubVp
                | OpCode::SubVv
                | OpCode::MulPv
                | OpCode::MulVv
                | OpCode::DivPv
                | OpCode::DivVp
                | OpCode::DivVv
        )
    }

    /// True for the unary math ops.
    #[inline]
    pub fn is_unary(self) -> bool {
        (OpCode::Neg as u8..=OpCode::Atanh as u8).contains(&(self as u8))
    }

    /// True for the comparison ops.
    #[inline]
    pub fn is_compare(self) -> bool {
        (OpCode::LtPv as u8..=OpCode::NeVv as u8).contains(&(self as u8))
    }

    /// Number of result addresses this op claims. `Call` results are counted
    /// by the sweeps through the call table.
    #[inline]
    pub fn n_res(self) -> usize {
        if self.is_compare() {
            0
        } else {
            1
        }
    }

    /// Variable addresses among the argument slots, in operand order.
    #[inline]
    pub fn var_operands(self, args: [u32; 2]) -> [Option<u32>; 2] {
        match self {
            OpCode::Inv | OpCode::Par | OpCode::Call => [None, None],
            OpCode::AddPv
            | OpCode::SubPv
            | OpCode::MulPv
            | OpCode::DivPv
            | OpCode::LtPv
            | OpCode::LePv
            | OpCode::EqPv
            | OpCode::NePv => [None, Some(args[1])],
            OpCode::SubVp | OpCode::DivVp | OpCode::LtVp | OpCode::LeVp => [Some(args[0]), None],
            OpCode::AddVv
            | OpCode::SubVv
            | OpCode::MulVv
            | OpCode::DivVv
            | OpCode::LtVv
            | OpCode::LeVv
            | OpCode::EqVv
            | OpCode::NeVv => [Some(args[0]), Some(args[1])],
            _ => [Some(args[0]), None],
        }
    }

    /// Second-derivative classification.
    pub fn classify(self) -> OpClass {
        match self {
            OpCode::Inv
            | OpCode::Par
            | OpCode::AddPv
            | OpCode::AddVv
            | OpCode::SubPv
            | OpCode::SubVp
            | OpCode::SubVv
            | OpCode::MulPv
            | OpCode::DivVp
            | OpCode::Neg
            | OpCode::Abs => OpClass::Linear,
            OpCode::MulVv | OpCode::DivVv => OpClass::BinaryNonlinear,
            // p/v is nonlinear in its single variable operand.
            OpCode::DivPv => OpClass::UnaryNonlinear,
            OpCode::Sign => OpClass::ZeroDerivative,
            op if op.is_unary() => OpClass::UnaryNonlinear,
            _ => OpClass::Linear,
        }
    }
}

/// Scalar evaluation of a binary arithmetic op on resolved operand values.
#[inline]
pub fn eval_binary<F: Float>(op: OpCode, a: F, b: F) -> F {
    match op {
        OpCode::AddPv | OpCode::AddVv => a + b,
        OpCode::SubPv | OpCode::SubVp | OpCode::SubVv => a - b,
        OpCode::MulPv | OpCode::MulVv => a * b,
        OpCode::DivPv | OpCode::DivVp | OpCode::DivVv => a / b,
        _ => unreachable!("eval_binary: {:?} is not a binary op", op),
    }
}

/// Scalar evaluation of a unary op.
#[inline]
pub fn eval_unary<F: Float>(op: OpCode, x: F) -> F {
    match op {
        OpCode::Neg => -x,
        OpCode::Abs => x.abs(),
        OpCode::Sign => {
            if x > F::zero() {
                F::one()
            } else if x < F::zero() {
                -F::one()
            } else {
                F::zero()
            }
        }
        OpCode::Recip => x.recip(),
        OpCode::Sqrt => x.sqrt(),
        OpCode::Exp => x.exp(),
        OpCode::Ln => x.ln(),
        OpCode::Sin => x.sin(),
        OpCode::Cos => x.cos(),
        OpCode::Tan => x.tan(),
        OpCode::Sinh => x.sinh(),
        OpCode::Cosh => x.cosh(),
        OpCode::Tanh => x.tanh(),
        OpCode::Asin => x.asin(),
        OpCode::Acos => x.acos(),
        OpCode::Atan => x.atan(),
        OpCode::Asinh => x.asinh(),
        OpCode::Acosh => x.acosh(),
        OpCode::Atanh => x.atanh(),
        _ => unreachable!("eval_unary: {:?} is not a unary op", op),
    }
}

/// Whether the recorded comparison still holds for operand values `(a, b)`.
#[inline]
pub fn compare_holds<F: Float>(op: OpCode, a: F, b: F) -> bool {
    match op {
        OpCode::LtPv | OpCode::LtVp | OpCode::LtVv => a < b,
        OpCode::LePv | OpCode::LeVp | OpCode::LeVv => a <= b,
        OpCode::EqPv | OpCode::EqVv => a == b,
        OpCode::NePv | OpCode::NeVv => a != b,
        _ => unreachable!("compare_holds: {:?} is not a comparison", op),
    }
}
