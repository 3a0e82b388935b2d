//! Forward Taylor-coefficient sweep.

use crate::atomic::ValueType;
use crate::float::Float;
use crate::opcode::{compare_holds, OpCode};
use crate::taylor::*;

use super::{CallArg, Workspace};

/// Fill `dst` with the Taylor series of a parameter: `[p, 0, 0, ...]`.
#[inline]
fn par_series<F: Float>(p: F, dst: &mut [F]) {
    dst[0] = p;
    for v in dst[1..].iter_mut() {
        *v = F::zero();
    }
}

impl<'f, F: Float> Workspace<'f, F> {
    /// Zero-order forward sweep: evaluate the function at `x`.
    pub fn forward0(&mut self, x: &[F]) -> Vec<F> {
        self.forward(0, 0, x)
    }

    /// Propagate Taylor coefficients for orders `order_low..=order_up`.
    ///
    /// `x` supplies the independent variables' coefficients for exactly
    /// those orders, row-major by variable. Orders must advance
    /// monotonically: `order_low` has to equal the number of orders already
    /// evaluated ([`Workspace::reset`] restarts at order 0). Returns the
    /// dependent variables' coefficients for the requested orders.
    ///
    /// An order-0 sweep re-checks every recorded comparison and counts the
    /// ones whose outcome changed; see [`Workspace::compare_change`].
    pub fn forward(&mut self, order_low: usize, order_up: usize, x: &[F]) -> Vec<F> {
        let fun = self.fun;
        assert!(order_low <= order_up, "order_low exceeds order_up");
        assert_eq!(
            order_low, self.n_ord,
            "forward orders must advance monotonically: order_low is {} but {} orders are evaluated (use reset to restart)",
            order_low, self.n_ord
        );
        let span = order_up - order_low + 1;
        assert_eq!(
            x.len(),
            fun.n_ind * span,
            "expected {} input coefficients, got {}",
            fun.n_ind * span,
            x.len()
        );

        self.ensure_cap(order_up + 1);
        let cap = self.cap;
        let n = order_up + 1;
        if order_low == 0 {
            self.compare_change = 0;
        }

        for j in 0..fun.n_ind {
            for k in 0..span {
                self.taylor[j * cap + order_low + k] = x[j * span + k];
            }
        }

        // Each operation recomputes its result's orders 0..=order_up from
        // the operands' stored coefficients; lower orders come out identical
        // to the earlier sweeps that produced them.
        let mut ax = vec![F::zero(); n];
        let mut ay = vec![F::zero(); n];
        let mut cz = vec![F::zero(); n];
        let mut s1 = vec![F::zero(); n];
        let mut s2 = vec![F::zero(); n];
        let mut s3 = vec![F::zero(); n];

        let mut i_var: usize = 0;
        for (&op, &args) in fun.ops.iter().zip(fun.args.iter()) {
            match op {
                OpCode::Inv => {
                    i_var += 1;
                    continue;
                }
                OpCode::Par => {
                    par_series(self.params[args[0] as usize], &mut cz);
                }
                op if op.is_compare() => {
                    if order_low == 0 {
                        let operand = |slot: usize| -> F {
                            match op.var_operands(args)[slot] {
                                Some(v) => self.taylor[v as usize * cap],
                                None => self.params[args[slot] as usize],
                            }
                        };
                        if !compare_holds(op, operand(0), operand(1)) {
                            self.compare_change += 1;
                        }
                    }
                    continue;
                }
                OpCode::Call => {
                    i_var += self.forward_call(args[0] as usize, i_var, order_up);
                    continue;
                }
                op if op.is_binary() => {
                    self.load_binary(op, args, n, &mut ax, &mut ay);
                    match op {
                        OpCode::AddPv | OpCode::AddVv => taylor_add(&ax, &ay, &mut cz),
                        OpCode::SubPv | OpCode::SubVp | OpCode::SubVv => {
                            taylor_sub(&ax, &ay, &mut cz)
                        }
                        OpCode::MulPv => taylor_scale(&ay, ax[0], &mut cz),
                        OpCode::MulVv => taylor_mul(&ax, &ay, &mut cz),
                        OpCode::DivVp => taylor_scale(&ax, ay[0].recip(), &mut cz),
                        OpCode::DivPv | OpCode::DivVv => taylor_div(&ax, &ay, &mut cz),
                        _ => unreachable!(),
                    }
                }
                _ => {
                    let v = args[0] as usize;
                    ax.copy_from_slice(&self.taylor[v * cap..v * cap + n]);
                    match op {
                        OpCode::Neg => taylor_neg(&ax, &mut cz),
                        // |x| has coefficients sign(x₀) · x_k.
                        OpCode::Abs => {
                            let s = if ax[0] > F::zero() {
                                F::one()
                            } else if ax[0] < F::zero() {
                                -F::one()
                            } else {
                                F::zero()
                            };
                            taylor_scale(&ax, s, &mut cz);
                            cz[0] = ax[0].abs();
                        }
                        OpCode::Sign => {
                            let s = if ax[0] > F::zero() {
                                F::one()
                            } else if ax[0] < F::zero() {
                                -F::one()
                            } else {
                                F::zero()
                            };
                            par_series(s, &mut cz);
                        }
                        OpCode::Recip => taylor_recip(&ax, &mut cz),
                        OpCode::Sqrt => taylor_sqrt(&ax, &mut cz),
                        OpCode::Exp => taylor_exp(&ax, &mut cz),
                        OpCode::Ln => taylor_ln(&ax, &mut cz),
                        OpCode::Sin => taylor_sin_cos(&ax, &mut cz, &mut s1),
                        OpCode::Cos => taylor_sin_cos(&ax, &mut s1, &mut cz),
                        OpCode::Tan => taylor_tan(&ax, &mut cz, &mut s1),
                        OpCode::Sinh => taylor_sinh_cosh(&ax, &mut cz, &mut s1),
                        OpCode::Cosh => taylor_sinh_cosh(&ax, &mut s1, &mut cz),
                        OpCode::Tanh => taylor_tanh(&ax, &mut cz, &mut s1),
                        OpCode::Asin => taylor_asin(&ax, &mut cz, &mut s1, &mut s2, &mut s3),
                        OpCode::Acos => taylor_acos(&ax, &mut cz, &mut s1, &mut s2, &mut s3),
                        OpCode::Atan => taylor_atan(&ax, &mut cz, &mut s1, &mut s2),
                        OpCode::Asinh => taylor_asinh(&ax, &mut cz, &mut s1, &mut s2, &mut s3),
                        OpCode::Acosh => taylor_acosh(&ax, &mut cz, &mut s1, &mut s2, &mut s3),
                        OpCode::Atanh => taylor_atanh(&ax, &mut cz, &mut s1, &mut s2),
                        _ => unreachable!("forward: unhandled opcode {:?}", op),
                    }
                }
            }
            self.taylor[i_var * cap..i_var * cap + n].copy_from_slice(&cz);
            i_var += 1;
        }
        debug_assert_eq!(i_var, fun.n_var);

        self.n_ord = n;
        let mut out = vec![F::zero(); fun.dependents.len() * span];
        for (d, &dep) in fun.dependents.iter().enumerate() {
            for k in 0..span {
                out[d * span + k] = self.taylor[dep as usize * cap + order_low + k];
            }
        }
        out
    }

    /// Resolve a binary op's operand series into `ax` (left) and `ay`
    /// (right).
    fn load_binary(&self, op: OpCode, args: [u32; 2], n: usize, ax: &mut [F], ay: &mut [F]) {
        let cap = self.cap;
        match op {
            OpCode::AddPv | OpCode::SubPv | OpCode::MulPv | OpCode::DivPv => {
                par_series(self.params[args[0] as usize], ax);
                let v = args[1] as usize;
                ay.copy_from_slice(&self.taylor[v * cap..v * cap + n]);
            }
            OpCode::SubVp | OpCode::DivVp => {
                let v = args[0] as usize;
                ax.copy_from_slice(&self.taylor[v * cap..v * cap + n]);
                par_series(self.params[args[1] as usize], ay);
            }
            _ => {
                let a = args[0] as usize;
                let b = args[1] as usize;
                ax.copy_from_slice(&self.taylor[a * cap..a * cap + n]);
                ay.copy_from_slice(&self.taylor[b * cap..b * cap + n]);
            }
        }
    }

    /// Forward-dispatch one atomic call; returns the number of tape
    /// addresses it occupies.
    fn forward_call(&mut self, call_idx: usize, res_base: usize, order_up: usize) -> usize {
        let fun = self.fun;
        let call = &fun.calls[call_idx];
        let atom = fun.registry.fetch(call.atom);
        let cap = self.cap;
        let n = order_up + 1;
        let n_arg = call.args.len();
        let n_res = call.n_res as usize;

        let mut taylor_x = vec![F::zero(); n_arg * n];
        let mut parameter_x = vec![F::zero(); n_arg];
        let mut type_x = vec![ValueType::Constant; n_arg];
        for (i, arg) in call.args.iter().enumerate() {
            match *arg {
                CallArg::Par(p) => {
                    let p = p as usize;
                    taylor_x[i * n] = self.params[p];
                    parameter_x[i] = self.params[p];
                    type_x[i] = if fun.dyn_flag[p] {
                        ValueType::Dynamic
                    } else {
                        ValueType::Constant
                    };
                }
                CallArg::Var(v) => {
                    let v = v as usize;
                    taylor_x[i * n..(i + 1) * n].copy_from_slice(&self.taylor[v * cap..v * cap + n]);
                    parameter_x[i] = self.taylor[v * cap];
                    type_x[i] = ValueType::Variable;
                }
            }
        }

        let mut taylor_y = vec![F::zero(); n_res * n];
        let ok = atom.forward(&parameter_x, &type_x, 0, order_up, &taylor_x, &mut taylor_y);
        assert!(ok, "{}: atomic forward returned false", atom.name());

        for r in 0..n_res {
            let z = res_base + r;
            self.taylor[z * cap..z * cap + n].copy_from_slice(&taylor_y[r * n..(r + 1) * n]);
        }
        n_res
    }
}
