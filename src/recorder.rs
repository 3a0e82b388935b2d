//! Recording context: builds an operation tape through operator overloading.
//!
//! A [`Recorder`] is an explicit object; the [`Value`] handles it hands out
//! borrow it, so a recording cannot outlive its recorder and values from
//! different recorders cannot be mixed (fatal error, checked on every
//! operation). Sealing the recorder with [`Recorder::seal`] produces an
//! immutable [`Function`].
//!
//! Operand folding: an operation whose operands are all constants is
//! evaluated immediately and produces a constant; all-parameter operations
//! involving a dynamic parameter go to the dynamic sub-tape and produce a
//! new dynamic parameter; only operations with at least one variable operand
//! reach the main tape, through the `Pv`/`Vp`/`Vv` opcode variants. Identity
//! operands fold away entirely: `x + 0`, `x - 0`, `x * 1`, `x / 1` alias
//! `x`, and `x * 0`, `0 / x` produce the constant zero.

use std::cell::RefCell;
use std::mem;

use crate::atomic::{Atomic, AtomicId, AtomicRegistry, ValueType};
use crate::float::Float;
use crate::function::{CallArg, CallRecord, Function};
use crate::opcode::{self, OpCode, UNUSED};
use crate::value::{Kind, Value};

/// Binary arithmetic operation being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bop {
    Add,
    Sub,
    Mul,
    Div,
}

/// Comparison being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cmp {
    Lt,
    Le,
    Eq,
    Ne,
}

/// An open recording.
pub struct Recorder<F: Float> {
    inner: RefCell<Inner<F>>,
}

struct Inner<F: Float> {
    open: bool,
    ops: Vec<OpCode>,
    args: Vec<[u32; 2]>,
    n_var: u32,
    n_ind: usize,
    // Parameter table; `dyn_flag[i]` marks dynamic entries.
    params: Vec<F>,
    dyn_flag: Vec<bool>,
    // Parameter indices of the independent dynamic parameters, in
    // declaration order.
    ind_dyn: Vec<u32>,
    // Dynamic sub-tape: operations over the parameter table, replayed by
    // `new_dynamic`. Argument slots are parameter indices.
    dyn_ops: Vec<OpCode>,
    dyn_args: Vec<[u32; 2]>,
    dyn_res: Vec<u32>,
    calls: Vec<CallRecord>,
    registry: AtomicRegistry<F>,
}

impl<F: Float> Default for Inner<F> {
    fn default() -> Self {
        Inner {
            open: false,
            ops: Vec::new(),
            args: Vec::new(),
            n_var: 0,
            n_ind: 0,
            params: Vec::new(),
            dyn_flag: Vec::new(),
            ind_dyn: Vec::new(),
            dyn_ops: Vec::new(),
            dyn_args: Vec::new(),
            dyn_res: Vec::new(),
            calls: Vec::new(),
            registry: AtomicRegistry::default(),
        }
    }
}

impl<F: Float> Inner<F> {
    fn push_var(&mut self, op: OpCode, args: [u32; 2]) -> u32 {
        let addr = self.n_var;
        self.ops.push(op);
        self.args.push(args);
        self.n_var += 1;
        addr
    }

    fn push_compare(&mut self, op: OpCode, args: [u32; 2]) {
        self.ops.push(op);
        self.args.push(args);
    }

    /// Parameter-table index for an operand that is not a variable.
    fn par_index(&mut self, v: F, kind: Kind) -> u32 {
        match kind {
            Kind::Dyn(i) => i,
            Kind::Con => {
                let i = self.params.len() as u32;
                self.params.push(v);
                self.dyn_flag.push(false);
                i
            }
            Kind::Var(_) => unreachable!("par_index on a variable"),
        }
    }

    /// Record a dynamic sub-tape operation; returns the result's parameter
    /// index.
    fn push_dyn(&mut self, op: OpCode, args: [u32; 2], v: F) -> u32 {
        let res = self.params.len() as u32;
        self.params.push(v);
        self.dyn_flag.push(true);
        self.dyn_ops.push(op);
        self.dyn_args.push(args);
        self.dyn_res.push(res);
        res
    }
}

impl<F: Float> Default for Recorder<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Recorder<F> {
    /// Open a fresh recording.
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.open = true;
        Recorder {
            inner: RefCell::new(inner),
        }
    }

    #[inline]
    fn check_same(&self, other: &Recorder<F>) {
        assert!(
            std::ptr::eq(self, other),
            "values from different recorders cannot be combined"
        );
    }

    /// Declare the independent variables with their record-time values.
    ///
    /// Must be called exactly once, before any operation is recorded; the
    /// returned values occupy tape addresses `0..values.len()`.
    pub fn independent(&self, values: &[F]) -> Vec<Value<'_, F>> {
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        assert!(
            inner.n_ind == 0 && inner.n_var == 0,
            "independent variables already declared"
        );
        assert!(!values.is_empty(), "need at least one independent variable");
        inner.n_ind = values.len();
        values
            .iter()
            .map(|&v| {
                let addr = inner.push_var(OpCode::Inv, [UNUSED, UNUSED]);
                Value {
                    rec: self,
                    value: v,
                    kind: Kind::Var(addr),
                }
            })
            .collect()
    }

    /// Declare the independent dynamic parameters with their initial values.
    ///
    /// At most one call per recording. A sealed function can be re-pointed
    /// at new values for these parameters without re-recording.
    pub fn dynamic(&self, values: &[F]) -> Vec<Value<'_, F>> {
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        assert!(
            inner.ind_dyn.is_empty(),
            "dynamic parameters already declared"
        );
        values
            .iter()
            .map(|&v| {
                let i = inner.params.len() as u32;
                inner.params.push(v);
                inner.dyn_flag.push(true);
                inner.ind_dyn.push(i);
                Value {
                    rec: self,
                    value: v,
                    kind: Kind::Dyn(i),
                }
            })
            .collect()
    }

    /// A constant value on this recording.
    #[inline]
    pub fn constant(&self, v: F) -> Value<'_, F> {
        Value {
            rec: self,
            value: v,
            kind: Kind::Con,
        }
    }

    /// Number of operations recorded so far (independent variables included).
    pub fn num_ops(&self) -> usize {
        self.inner.borrow().ops.len()
    }

    pub(crate) fn record_binary<'t>(
        &'t self,
        bop: Bop,
        lhs: Value<'t, F>,
        rhs: Value<'t, F>,
    ) -> Value<'t, F> {
        self.check_same(lhs.rec);
        self.check_same(rhs.rec);
        let value = match bop {
            Bop::Add => lhs.value + rhs.value,
            Bop::Sub => lhs.value - rhs.value,
            Bop::Mul => lhs.value * rhs.value,
            Bop::Div => lhs.value / rhs.value,
        };

        // Identity folds on constant operands.
        match bop {
            Bop::Add => {
                if lhs.kind == Kind::Con && lhs.value == F::zero() {
                    return rhs;
                }
                if rhs.kind == Kind::Con && rhs.value == F::zero() {
                    return lhs;
                }
            }
            Bop::Sub => {
                if rhs.kind == Kind::Con && rhs.value == F::zero() {
                    return lhs;
                }
            }
            Bop::Mul => {
                if lhs.kind == Kind::Con {
                    if lhs.value == F::one() {
                        return rhs;
                    }
                    if lhs.value == F::zero() {
                        return self.constant(F::zero());
                    }
                }
                if rhs.kind == Kind::Con {
                    if rhs.value == F::one() {
                        return lhs;
                    }
                    if rhs.value == F::zero() {
                        return self.constant(F::zero());
                    }
                }
            }
            Bop::Div => {
                if rhs.kind == Kind::Con && rhs.value == F::one() {
                    return lhs;
                }
                if lhs.kind == Kind::Con && lhs.value == F::zero() {
                    return self.constant(F::zero());
                }
            }
        }

        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        let kind = match (lhs.kind, rhs.kind) {
            (Kind::Con, Kind::Con) => Kind::Con,
            (Kind::Var(a), Kind::Var(b)) => {
                let op = match bop {
                    Bop::Add => OpCode::AddVv,
                    Bop::Sub => OpCode::SubVv,
                    Bop::Mul => OpCode::MulVv,
                    Bop::Div => OpCode::DivVv,
                };
                Kind::Var(inner.push_var(op, [a, b]))
            }
            (l, Kind::Var(b)) => {
                let p = inner.par_index(lhs.value, l);
                let op = match bop {
                    Bop::Add => OpCode::AddPv,
                    Bop::Sub => OpCode::SubPv,
                    Bop::Mul => OpCode::MulPv,
                    Bop::Div => OpCode::DivPv,
                };
                Kind::Var(inner.push_var(op, [p, b]))
            }
            (Kind::Var(a), r) => {
                let p = inner.par_index(rhs.value, r);
                // Add and Mul commute into the Pv form.
                let (op, args) = match bop {
                    Bop::Add => (OpCode::AddPv, [p, a]),
                    Bop::Mul => (OpCode::MulPv, [p, a]),
                    Bop::Sub => (OpCode::SubVp, [a, p]),
                    Bop::Div => (OpCode::DivVp, [a, p]),
                };
                Kind::Var(inner.push_var(op, args))
            }
            // No variable operand, at least one dynamic: dynamic sub-tape.
            (l, r) => {
                let a = inner.par_index(lhs.value, l);
                let b = inner.par_index(rhs.value, r);
                let op = match bop {
                    Bop::Add => OpCode::AddVv,
                    Bop::Sub => OpCode::SubVv,
                    Bop::Mul => OpCode::MulVv,
                    Bop::Div => OpCode::DivVv,
                };
                Kind::Dyn(inner.push_dyn(op, [a, b], value))
            }
        };
        drop(inner);
        Value {
            rec: self,
            value,
            kind,
        }
    }

    pub(crate) fn record_unary<'t>(&'t self, op: OpCode, x: Value<'t, F>) -> Value<'t, F> {
        self.check_same(x.rec);
        let value = opcode::eval_unary(op, x.value);
        let kind = match x.kind {
            Kind::Con => Kind::Con,
            Kind::Dyn(i) => {
                let mut inner = self.inner.borrow_mut();
                assert!(inner.open, "recording already sealed");
                Kind::Dyn(inner.push_dyn(op, [i, UNUSED], value))
            }
            Kind::Var(a) => {
                let mut inner = self.inner.borrow_mut();
                assert!(inner.open, "recording already sealed");
                Kind::Var(inner.push_var(op, [a, UNUSED]))
            }
        };
        Value {
            rec: self,
            value,
            kind,
        }
    }

    /// Record a comparison and return its record-time outcome. The recorded
    /// opcode states the relation that held, so the order-0 forward sweep
    /// can count operations whose outcome has flipped.
    pub(crate) fn record_compare<'t>(
        &'t self,
        cmp: Cmp,
        lhs: Value<'t, F>,
        rhs: Value<'t, F>,
    ) -> bool {
        self.check_same(lhs.rec);
        self.check_same(rhs.rec);
        let holds = match cmp {
            Cmp::Lt => lhs.value < rhs.value,
            Cmp::Le => lhs.value <= rhs.value,
            Cmp::Eq => lhs.value == rhs.value,
            Cmp::Ne => lhs.value != rhs.value,
        };
        // Comparisons among parameters are not tracked.
        if !lhs.is_variable() && !rhs.is_variable() {
            return holds;
        }
        // Normalize to the true-direction relation.
        let (cmp, lhs, rhs) = match (cmp, holds) {
            (Cmp::Lt, true) | (Cmp::Le, true) | (Cmp::Eq, true) | (Cmp::Ne, true) => {
                (cmp, lhs, rhs)
            }
            (Cmp::Lt, false) => (Cmp::Le, rhs, lhs),
            (Cmp::Le, false) => (Cmp::Lt, rhs, lhs),
            (Cmp::Eq, false) => (Cmp::Ne, lhs, rhs),
            (Cmp::Ne, false) => (Cmp::Eq, lhs, rhs),
        };
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        match (cmp, lhs.kind, rhs.kind) {
            (Cmp::Lt, Kind::Var(a), Kind::Var(b)) => inner.push_compare(OpCode::LtVv, [a, b]),
            (Cmp::Le, Kind::Var(a), Kind::Var(b)) => inner.push_compare(OpCode::LeVv, [a, b]),
            (Cmp::Eq, Kind::Var(a), Kind::Var(b)) => inner.push_compare(OpCode::EqVv, [a, b]),
            (Cmp::Ne, Kind::Var(a), Kind::Var(b)) => inner.push_compare(OpCode::NeVv, [a, b]),
            (cmp, l, Kind::Var(b)) => {
                let p = inner.par_index(lhs.value, l);
                let op = match cmp {
                    Cmp::Lt => OpCode::LtPv,
                    Cmp::Le => OpCode::LePv,
                    Cmp::Eq => OpCode::EqPv,
                    Cmp::Ne => OpCode::NePv,
                };
                inner.push_compare(op, [p, b]);
            }
            (cmp, Kind::Var(a), r) => {
                let p = inner.par_index(rhs.value, r);
                // Eq and Ne are symmetric; only the Pv form exists.
                let (op, args) = match cmp {
                    Cmp::Lt => (OpCode::LtVp, [a, p]),
                    Cmp::Le => (OpCode::LeVp, [a, p]),
                    Cmp::Eq => (OpCode::EqPv, [p, a]),
                    Cmp::Ne => (OpCode::NePv, [p, a]),
                };
                inner.push_compare(op, args);
            }
            _ => unreachable!("parameter-only comparison reached the tape"),
        }
        holds
    }

    /// Raw comparison record for graph import: no normalization, operands
    /// are placed as given.
    pub(crate) fn record_compare_direct<'t>(
        &'t self,
        cmp: Cmp,
        lhs: Value<'t, F>,
        rhs: Value<'t, F>,
    ) {
        if !lhs.is_variable() && !rhs.is_variable() {
            return;
        }
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        match (lhs.kind, rhs.kind) {
            (Kind::Var(a), Kind::Var(b)) => {
                let op = match cmp {
                    Cmp::Lt => OpCode::LtVv,
                    Cmp::Le => OpCode::LeVv,
                    Cmp::Eq => OpCode::EqVv,
                    Cmp::Ne => OpCode::NeVv,
                };
                inner.push_compare(op, [a, b]);
            }
            (l, Kind::Var(b)) => {
                let p = inner.par_index(lhs.value, l);
                let op = match cmp {
                    Cmp::Lt => OpCode::LtPv,
                    Cmp::Le => OpCode::LePv,
                    Cmp::Eq => OpCode::EqPv,
                    Cmp::Ne => OpCode::NePv,
                };
                inner.push_compare(op, [p, b]);
            }
            (Kind::Var(a), r) => {
                let p = inner.par_index(rhs.value, r);
                let (op, args) = match cmp {
                    Cmp::Lt => (OpCode::LtVp, [a, p]),
                    Cmp::Le => (OpCode::LeVp, [a, p]),
                    Cmp::Eq => (OpCode::EqPv, [p, a]),
                    Cmp::Ne => (OpCode::NePv, [p, a]),
                };
                inner.push_compare(op, args);
            }
            _ => unreachable!(),
        }
    }

    /// Register an atomic function for use in this recording.
    pub fn register_atomic(&self, imp: Box<dyn Atomic<F> + Send>) -> AtomicId {
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        inner.registry.register(imp)
    }

    /// Record a call to a registered atomic function.
    ///
    /// The callback's order-0 forward is invoked immediately to obtain the
    /// record-time result values. A call whose arguments are all constants is
    /// folded to constants; a call with at least one variable argument puts
    /// one `Call` operation on the tape and makes every result a variable.
    pub fn call<'t>(&'t self, id: AtomicId, args: &[Value<'t, F>]) -> Vec<Value<'t, F>> {
        for a in args {
            self.check_same(a.rec);
        }
        assert!(!args.is_empty(), "atomic call needs at least one argument");
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        let inner = &mut *inner;

        let type_x: Vec<ValueType> = args
            .iter()
            .map(|a| match a.kind {
                Kind::Con => ValueType::Constant,
                Kind::Dyn(_) => ValueType::Dynamic,
                Kind::Var(_) => ValueType::Variable,
            })
            .collect();
        let parameter_x: Vec<F> = args.iter().map(|a| a.value).collect();

        let atom = inner.registry.fetch(id);
        let name = atom.name().to_string();
        let type_y = atom.for_type(&type_x);
        let n_res = type_y.len();
        assert!(n_res > 0, "atomic function '{}' declared no results", name);

        let mut taylor_y = vec![F::zero(); n_res];
        let ok = atom.forward(&parameter_x, &type_x, 0, 0, &parameter_x, &mut taylor_y);
        assert!(ok, "{}: atomic forward returned false", name);

        let any_var = args.iter().any(|a| a.is_variable());
        if !any_var {
            assert!(
                args.iter().all(|a| a.is_constant()),
                "atomic function '{}' called with dynamic parameters but no variables",
                name
            );
            return taylor_y
                .into_iter()
                .map(|v| Value {
                    rec: self,
                    value: v,
                    kind: Kind::Con,
                })
                .collect();
        }

        let call_args: Vec<CallArg> = args
            .iter()
            .map(|a| match a.kind {
                Kind::Var(v) => CallArg::Var(v),
                Kind::Dyn(i) => CallArg::Par(i),
                Kind::Con => CallArg::Par(inner.par_index(a.value, Kind::Con)),
            })
            .collect();
        let call_idx = inner.calls.len() as u32;
        inner.calls.push(CallRecord {
            atom: id,
            args: call_args,
            n_res: n_res as u32,
        });
        inner.ops.push(OpCode::Call);
        inner.args.push([call_idx, UNUSED]);
        let base = inner.n_var;
        inner.n_var += n_res as u32;

        taylor_y
            .into_iter()
            .enumerate()
            .map(|(i, v)| Value {
                rec: self,
                value: v,
                kind: Kind::Var(base + i as u32),
            })
            .collect()
    }

    /// Seal the recording into an immutable [`Function`] with the given
    /// dependent (output) values. Constant and dynamic dependents are
    /// materialized as variables through `Par` operations.
    pub fn seal(&self, dependents: &[Value<'_, F>]) -> Function<F> {
        assert!(!dependents.is_empty(), "need at least one dependent value");
        let mut inner = self.inner.borrow_mut();
        assert!(inner.open, "recording already sealed");
        assert!(inner.n_ind > 0, "no independent variables were declared");

        let deps: Vec<u32> = dependents
            .iter()
            .map(|d| {
                self.check_same(d.rec);
                match d.kind {
                    Kind::Var(a) => a,
                    Kind::Dyn(i) => inner.push_var(OpCode::Par, [i, UNUSED]),
                    Kind::Con => {
                        let p = inner.par_index(d.value, Kind::Con);
                        inner.push_var(OpCode::Par, [p, UNUSED])
                    }
                }
            })
            .collect();

        // Forward-reference validation: every variable operand must be
        // assigned before the operation that consumes it.
        let mut i_var: u32 = 0;
        for (i_op, (&op, &args)) in inner.ops.iter().zip(inner.args.iter()).enumerate() {
            for operand in op.var_operands(args).into_iter().flatten() {
                assert!(
                    operand < i_var,
                    "operation {} references variable {} before it is assigned",
                    i_op,
                    operand
                );
            }
            i_var += match op {
                OpCode::Call => inner.calls[args[0] as usize].n_res,
                _ => op.n_res() as u32,
            };
            if op == OpCode::Call {
                let call = &inner.calls[args[0] as usize];
                for a in &call.args {
                    if let CallArg::Var(v) = a {
                        assert!(
                            *v < i_var - call.n_res,
                            "operation {} references variable {} before it is assigned",
                            i_op,
                            v
                        );
                    }
                }
            }
        }
        debug_assert_eq!(i_var, inner.n_var);

        inner.open = false;
        let inner = mem::take(&mut *inner);
        Function::from_parts(
            inner.ops,
            inner.args,
            inner.n_var as usize,
            inner.n_ind,
            inner.params,
            inner.dyn_flag,
            inner.ind_dyn,
            inner.dyn_ops,
            inner.dyn_args,
            inner.dyn_res,
            inner.calls,
            inner.registry,
            deps,
        )
    }
}
