//! Jacobian and Hessian sparsity sweeps over a sealed tape.

use crate::float::Float;
use crate::function::{CallArg, Function};
use crate::opcode::{OpClass, OpCode};

use super::{ListSetVec, SetVec, SparsityPattern};

impl<F: Float> Function<F> {
    /// Forward Jacobian-sparsity sets: one set per tape variable, holding
    /// the independent-variable indices it depends on.
    fn for_jac_sets<S: SetVec>(&self) -> S {
        let mut sets = S::with_sets(self.n_var, self.n_ind);
        let mut i_var = 0usize;
        for (&op, &args) in self.ops.iter().zip(self.args.iter()) {
            match op {
                OpCode::Inv => {
                    sets.add_element(i_var, i_var);
                    i_var += 1;
                }
                OpCode::Par => {
                    i_var += 1;
                }
                op if op.is_compare() => {}
                OpCode::Call => {
                    let call = &self.calls[args[0] as usize];
                    let atom = self.registry.fetch(call.atom);
                    let pairs = match atom.jac_sparsity(call.args.len()) {
                        Some(p) => p,
                        None => panic!("{}: atomic jac_sparsity returned false", atom.name()),
                    };
                    for (res, arg) in pairs {
                        if let CallArg::Var(v) = call.args[arg] {
                            let z = i_var + res;
                            sets.binary_union(z, z, v as usize);
                        }
                    }
                    i_var += call.n_res as usize;
                }
                _ => {
                    let z = i_var;
                    match op.var_operands(args) {
                        [Some(a), Some(b)] => sets.binary_union(z, a as usize, b as usize),
                        [Some(a), None] | [None, Some(a)] => sets.assignment(z, a as usize),
                        [None, None] => {}
                    }
                    i_var += 1;
                }
            }
        }
        debug_assert_eq!(i_var, self.n_var);
        sets
    }

    /// Jacobian sparsity pattern (`range() × domain()`) by forward
    /// propagation with the given vector-of-sets backend.
    pub fn jac_sparsity_forward_with<S: SetVec>(&self) -> SparsityPattern {
        let sets: S = self.for_jac_sets();
        let mut pattern = SparsityPattern::new(self.range(), self.domain());
        for (d, &dep) in self.dependents.iter().enumerate() {
            for j in sets.iter(dep as usize) {
                pattern.add(d, j);
            }
        }
        pattern
    }

    /// Jacobian sparsity pattern by forward propagation.
    pub fn jac_sparsity_forward(&self) -> SparsityPattern {
        self.jac_sparsity_forward_with::<ListSetVec>()
    }

    /// Jacobian sparsity pattern (`range() × domain()`) by reverse
    /// propagation: one set per tape variable, holding the dependent
    /// indices it affects.
    pub fn jac_sparsity_reverse_with<S: SetVec>(&self) -> SparsityPattern {
        let mut sets = S::with_sets(self.n_var, self.range());
        for (d, &dep) in self.dependents.iter().enumerate() {
            sets.add_element(dep as usize, d);
        }
        let mut i_var = self.n_var;
        for (&op, &args) in self.ops.iter().zip(self.args.iter()).rev() {
            let n_res = match op {
                OpCode::Call => self.calls[args[0] as usize].n_res as usize,
                _ => op.n_res(),
            };
            i_var -= n_res;
            match op {
                OpCode::Inv | OpCode::Par => {}
                op if op.is_compare() => {}
                OpCode::Call => {
                    let call = &self.calls[args[0] as usize];
                    let atom = self.registry.fetch(call.atom);
                    let pairs = match atom.jac_sparsity(call.args.len()) {
                        Some(p) => p,
                        None => panic!("{}: atomic jac_sparsity returned false", atom.name()),
                    };
                    for (res, arg) in pairs {
                        if let CallArg::Var(v) = call.args[arg] {
                            let v = v as usize;
                            sets.binary_union(v, v, i_var + res);
                        }
                    }
                }
                _ => {
                    for operand in op.var_operands(args).into_iter().flatten() {
                        let x = operand as usize;
                        sets.binary_union(x, x, i_var);
                    }
                }
            }
        }
        debug_assert_eq!(i_var, 0);

        let mut pattern = SparsityPattern::new(self.range(), self.domain());
        for j in 0..self.n_ind {
            for d in sets.iter(j) {
                pattern.add(d, j);
            }
        }
        pattern
    }

    /// Jacobian sparsity pattern by reverse propagation.
    pub fn jac_sparsity_reverse(&self) -> SparsityPattern {
        self.jac_sparsity_reverse_with::<ListSetVec>()
    }

    /// Hessian sparsity pattern (`domain() × domain()`) of the scalar
    /// `Σ_i w_i · y_i` over the outputs selected by `select_range`.
    ///
    /// A pair `(j, i)` appears when a nonlinear operation combines two
    /// quantities whose forward Jacobian sets contain `j` and `i`, and the
    /// operation's result still affects a selected output.
    pub fn hes_sparsity_with<S: SetVec>(&self, select_range: &[bool]) -> SparsityPattern {
        assert_eq!(
            select_range.len(),
            self.range(),
            "expected {} output selectors, got {}",
            self.range(),
            select_range.len()
        );
        let jac: S = self.for_jac_sets();

        // Reverse activity: does this variable still affect a selected
        // output? Settled for each variable before its defining operation
        // is visited.
        let mut active = vec![false; self.n_var];
        for (d, &dep) in self.dependents.iter().enumerate() {
            if select_range[d] {
                active[dep as usize] = true;
            }
        }

        let mut hes = S::with_sets(self.n_var, self.n_ind);
        let mut i_var = self.n_var;
        for (&op, &args) in self.ops.iter().zip(self.args.iter()).rev() {
            let n_res = match op {
                OpCode::Call => self.calls[args[0] as usize].n_res as usize,
                _ => op.n_res(),
            };
            i_var -= n_res;
            match op {
                OpCode::Inv | OpCode::Par => continue,
                op if op.is_compare() => continue,
                OpCode::Call => {
                    self.hes_call(args[0] as usize, i_var, &jac, &mut hes, &mut active);
                    continue;
                }
                _ => {}
            }
            let z = i_var;
            if !active[z] || op.classify() == OpClass::ZeroDerivative {
                continue;
            }

            // First-order chain: operands are active and inherit z's
            // second-order couplings.
            for operand in op.var_operands(args).into_iter().flatten() {
                let x = operand as usize;
                active[x] = true;
                hes.binary_union(x, x, z);
            }
            // Second-order couplings created by this operation.
            match op.classify() {
                OpClass::Linear | OpClass::ZeroDerivative => {}
                OpClass::UnaryNonlinear => {
                    if let Some(x) = op.var_operands(args).into_iter().flatten().next() {
                        let x = x as usize;
                        hes.union_from(x, x, &jac, x);
                    }
                }
                OpClass::BinaryNonlinear => {
                    let (x, y) = (args[0] as usize, args[1] as usize);
                    hes.union_from(x, x, &jac, y);
                    hes.union_from(y, y, &jac, x);
                    // x/y is also nonlinear in y alone.
                    if op == OpCode::DivVv {
                        hes.union_from(y, y, &jac, y);
                    }
                }
            }
        }
        debug_assert_eq!(i_var, 0);

        let mut pattern = SparsityPattern::new(self.n_ind, self.n_ind);
        for j in 0..self.n_ind {
            for i in hes.iter(j) {
                pattern.add(j, i);
            }
        }
        pattern
    }

    /// Hessian sparsity pattern over the selected outputs.
    pub fn hes_sparsity(&self, select_range: &[bool]) -> SparsityPattern {
        self.hes_sparsity_with::<ListSetVec>(select_range)
    }

    fn hes_call<S: SetVec>(
        &self,
        call_idx: usize,
        res_base: usize,
        jac: &S,
        hes: &mut S,
        active: &mut [bool],
    ) {
        let call = &self.calls[call_idx];
        let atom = self.registry.fetch(call.atom);
        if !(0..call.n_res as usize).any(|r| active[res_base + r]) {
            return;
        }
        let jac_pairs = match atom.jac_sparsity(call.args.len()) {
            Some(p) => p,
            None => panic!("{}: atomic jac_sparsity returned false", atom.name()),
        };
        let hes_pairs = match atom.hes_sparsity(call.args.len()) {
            Some(p) => p,
            None => panic!("{}: atomic hes_sparsity returned false", atom.name()),
        };
        for (res, arg) in jac_pairs {
            if !active[res_base + res] {
                continue;
            }
            if let CallArg::Var(v) = call.args[arg] {
                let v = v as usize;
                active[v] = true;
                hes.binary_union(v, v, res_base + res);
            }
        }
        for (i, j) in hes_pairs {
            if let (CallArg::Var(a), CallArg::Var(b)) = (call.args[i], call.args[j]) {
                let (a, b) = (a as usize, b as usize);
                hes.union_from(a, a, jac, b);
                if a != b {
                    hes.union_from(b, b, jac, a);
                }
            }
        }
    }
}
