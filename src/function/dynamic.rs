//! Dynamic-parameter sweep.

use crate::float::Float;
use crate::opcode;

use super::Workspace;

impl<'f, F: Float> Workspace<'f, F> {
    /// Re-point the independent dynamic parameters at new values and replay
    /// the dynamic sub-tape, recomputing every parameter that depends on
    /// them. Evaluated Taylor coefficients become stale, so the next forward
    /// sweep must restart at order 0.
    pub fn new_dynamic(&mut self, values: &[F]) {
        let fun = self.fun;
        assert_eq!(
            values.len(),
            fun.ind_dyn.len(),
            "expected {} dynamic parameter values, got {}",
            fun.ind_dyn.len(),
            values.len()
        );
        for (i, &v) in values.iter().enumerate() {
            self.params[fun.ind_dyn[i] as usize] = v;
        }
        for ((&op, &args), &res) in fun
            .dyn_ops
            .iter()
            .zip(fun.dyn_args.iter())
            .zip(fun.dyn_res.iter())
        {
            let v = if op.is_binary() {
                let a = self.params[args[0] as usize];
                let b = self.params[args[1] as usize];
                opcode::eval_binary(op, a, b)
            } else {
                debug_assert!(op.is_unary(), "dynamic sub-tape op {:?}", op);
                opcode::eval_unary(op, self.params[args[0] as usize])
            };
            self.params[res as usize] = v;
        }
        self.n_ord = 0;
    }
}
