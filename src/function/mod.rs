//! Sealed functions and their evaluation workspaces.
//!
//! A [`Function`] owns an immutable operation tape, the parameter table
//! (constants and dynamic parameters), the dynamic sub-tape, the atomic-call
//! table with its registry, and the dependent address list. It is never
//! mutated by evaluation; all per-call state — Taylor coefficients, the
//! working parameter vector, the compare-change counter — lives in a
//! [`Workspace`] borrowing the function.

mod dynamic;
mod forward;
mod reverse;

use crate::atomic::{AtomicId, AtomicRegistry};
use crate::float::Float;
use crate::opcode::OpCode;

/// One argument of a recorded atomic call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallArg {
    /// Parameter-table index (constant or dynamic).
    Par(u32),
    /// Tape variable address.
    Var(u32),
}

/// A recorded atomic call; its results occupy consecutive tape addresses
/// starting at the `Call` operation's result base.
#[derive(Debug, Clone)]
pub(crate) struct CallRecord {
    pub atom: AtomicId,
    pub args: Vec<CallArg>,
    pub n_res: u32,
}

/// A sealed tape ready for evaluation.
pub struct Function<F: Float> {
    pub(crate) ops: Vec<OpCode>,
    pub(crate) args: Vec<[u32; 2]>,
    pub(crate) n_var: usize,
    pub(crate) n_ind: usize,
    pub(crate) params: Vec<F>,
    pub(crate) dyn_flag: Vec<bool>,
    pub(crate) ind_dyn: Vec<u32>,
    pub(crate) dyn_ops: Vec<OpCode>,
    pub(crate) dyn_args: Vec<[u32; 2]>,
    pub(crate) dyn_res: Vec<u32>,
    pub(crate) calls: Vec<CallRecord>,
    pub(crate) registry: AtomicRegistry<F>,
    pub(crate) dependents: Vec<u32>,
    name: String,
}

impl<F: Float> Function<F> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        ops: Vec<OpCode>,
        args: Vec<[u32; 2]>,
        n_var: usize,
        n_ind: usize,
        params: Vec<F>,
        dyn_flag: Vec<bool>,
        ind_dyn: Vec<u32>,
        dyn_ops: Vec<OpCode>,
        dyn_args: Vec<[u32; 2]>,
        dyn_res: Vec<u32>,
        calls: Vec<CallRecord>,
        registry: AtomicRegistry<F>,
        dependents: Vec<u32>,
    ) -> Self {
        Function {
            ops,
            args,
            n_var,
            n_ind,
            params,
            dyn_flag,
            ind_dyn,
            dyn_ops,
            dyn_args,
            dyn_res,
            calls,
            registry,
            dependents,
            name: String::new(),
        }
    }

    /// Number of independent variables.
    #[inline]
    pub fn domain(&self) -> usize {
        self.n_ind
    }

    /// Number of dependent variables.
    #[inline]
    pub fn range(&self) -> usize {
        self.dependents.len()
    }

    /// Number of independent dynamic parameters.
    #[inline]
    pub fn n_dynamic(&self) -> usize {
        self.ind_dyn.len()
    }

    /// Number of tape operations (independent variables included).
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Number of tape variables.
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.n_var
    }

    /// Size of the parameter table.
    #[inline]
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Function name, used in messages and the graph exchange form.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Delete a registered atomic function. Sweeps over calls that still
    /// reference it abort with a named error.
    pub fn delete_atomic(&mut self, id: AtomicId) {
        self.registry.delete(id);
    }

    /// Fresh evaluation workspace for this function.
    pub fn workspace(&self) -> Workspace<'_, F> {
        Workspace {
            fun: self,
            taylor: Vec::new(),
            cap: 0,
            n_ord: 0,
            params: self.params.clone(),
            compare_change: 0,
        }
    }
}

/// Per-call evaluation state for a [`Function`].
///
/// Holds the Taylor-coefficient matrix (row per tape variable, `cap`
/// coefficient orders per row), the working parameter vector updated by
/// [`Workspace::new_dynamic`], and the comparison-change counter maintained
/// by order-0 forward sweeps.
pub struct Workspace<'f, F: Float> {
    pub(crate) fun: &'f Function<F>,
    pub(crate) taylor: Vec<F>,
    /// Allocated coefficient orders per variable row.
    pub(crate) cap: usize,
    /// Coefficient orders currently evaluated; 0 means none.
    pub(crate) n_ord: usize,
    pub(crate) params: Vec<F>,
    pub(crate) compare_change: usize,
}

impl<'f, F: Float> Workspace<'f, F> {
    /// The function this workspace evaluates.
    #[inline]
    pub fn function(&self) -> &'f Function<F> {
        self.fun
    }

    /// Number of recorded comparisons whose outcome differed from record
    /// time during the most recent order-0 forward sweep.
    #[inline]
    pub fn compare_change(&self) -> usize {
        self.compare_change
    }

    /// Forget all evaluated Taylor coefficients so the next forward sweep
    /// may restart at order 0.
    pub fn reset(&mut self) {
        self.n_ord = 0;
    }

    /// Taylor row for variable `v`, truncated to `n` orders.
    #[inline]
    pub(crate) fn row(&self, v: usize, n: usize) -> &[F] {
        &self.taylor[v * self.cap..v * self.cap + n]
    }

    /// Grow the per-row coefficient capacity, keeping evaluated orders.
    pub(crate) fn ensure_cap(&mut self, want: usize) {
        if want <= self.cap {
            return;
        }
        let n_var = self.fun.n_var;
        let mut fresh = vec![F::zero(); n_var * want];
        for v in 0..n_var {
            let old = &self.taylor[v * self.cap..v * self.cap + self.n_ord.min(self.cap)];
            fresh[v * want..v * want + old.len()].copy_from_slice(old);
        }
        self.taylor = fresh;
        self.cap = want;
    }
}
