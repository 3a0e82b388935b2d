//! Tape-based automatic differentiation through operator overloading.
//!
//! A [`Recorder`] captures the arithmetic performed on its [`Value`] handles
//! as an operation tape; sealing the recorder yields an immutable
//! [`Function`]. A function is evaluated through a [`Workspace`], which runs
//! forward Taylor-coefficient sweeps to any order, reverse sweeps for
//! adjoints, and sparsity sweeps for Jacobian and Hessian structure.
//! Recordings fold constants aggressively: operations between constants
//! never reach the tape, operations among dynamic parameters go to a
//! parameter sub-tape replayed by [`Workspace::new_dynamic`], and identities
//! like `x + 0` or `x * 1` vanish entirely.
//!
//! ```
//! use platypus::Recorder;
//!
//! let rec = Recorder::new();
//! let x = rec.independent(&[1.0_f64, 2.0]);
//! let y = vec![x[0] * x[1] + x[1].sin()];
//! let f = rec.seal(&y);
//!
//! let mut ws = f.workspace();
//! let g = ws.gradient(&[1.0, 2.0]);
//! assert!((g[0] - 2.0).abs() < 1e-12);
//! assert!((g[1] - (1.0 + 2.0_f64.cos())).abs() < 1e-12);
//! ```

pub mod atomic;
pub mod float;
pub mod function;
pub mod graph;
pub mod opcode;
pub mod recorder;
pub mod sparsity;

mod api;
mod taylor;
mod value;
mod value_ops;

pub use api::record;
pub use atomic::{Atomic, AtomicId, AtomicRegistry, ValueType};
pub use float::Float;
pub use function::{Function, Workspace};
pub use graph::{Graph, GraphOp};
pub use recorder::Recorder;
pub use sparsity::{ListSetVec, PackSetVec, SetVec, SparsityPattern};
pub use value::Value;

/// `f64`-valued recording handle.
pub type Value64<'t> = Value<'t, f64>;
/// `f32`-valued recording handle.
pub type Value32<'t> = Value<'t, f32>;
