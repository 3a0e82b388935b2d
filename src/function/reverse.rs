//! Reverse adjoint sweep.
//!
//! Runs over the tape in reverse address order, folding each operation's
//! contribution into its operands' adjoint accumulators. For Taylor
//! coefficients the transposed chain rule is a coefficient correlation: if
//! `z = f(x)` has derivative series `c = f'(x)`, then
//! `∂z[k]/∂x[j] = c[k-j]`, so `px[j] += Σ_k pz[k] · c[k-j]`. The derivative
//! series are rebuilt here from the stored forward coefficients.

use crate::float::Float;
use crate::opcode::OpCode;
use crate::taylor::*;

use super::{CallArg, Workspace};

#[inline]
fn negate<F: Float>(s: &mut [F]) {
    for v in s.iter_mut() {
        *v = -*v;
    }
}

impl<'f, F: Float> Workspace<'f, F> {
    /// Adjoint sweep of order `order_up`.
    ///
    /// Requires a prior forward sweep at order `order_up`. `w` weights the
    /// dependent variables; the sweep differentiates the scalar
    /// `W = Σ_i w[i] · y_i^(order_up - 1)` (for `order_up == 1` this is the
    /// weighted function value, so the result is the gradient `wᵀ · f'(x)`).
    /// Returns `domain() * order_up` adjoints, row-major by independent
    /// variable: entry `[j * order_up + k]` is `∂W / ∂x_j^(k)`.
    pub fn reverse(&self, order_up: usize, w: &[F]) -> Vec<F> {
        let fun = self.fun;
        let q = order_up;
        assert!(q >= 1, "reverse order must be at least 1");
        assert!(
            self.n_ord >= q + 1,
            "reverse of order {} requires a prior forward sweep at order {}",
            q,
            q
        );
        assert_eq!(
            w.len(),
            fun.dependents.len(),
            "expected {} dependent weights, got {}",
            fun.dependents.len(),
            w.len()
        );

        let cap = self.cap;
        let mut partial = vec![F::zero(); fun.n_var * q];
        for (d, &dep) in fun.dependents.iter().enumerate() {
            let slot = dep as usize * q + (q - 1);
            partial[slot] = partial[slot] + w[d];
        }

        let mut pz = vec![F::zero(); q];
        let mut s1 = vec![F::zero(); q];
        let mut s2 = vec![F::zero(); q];
        let mut s3 = vec![F::zero(); q];

        let mut i_var = fun.n_var;
        for (&op, &args) in fun.ops.iter().zip(fun.args.iter()).rev() {
            let n_res = match op {
                OpCode::Call => fun.calls[args[0] as usize].n_res as usize,
                _ => op.n_res(),
            };
            i_var -= n_res;
            match op {
                OpCode::Inv | OpCode::Par => continue,
                op if op.is_compare() => continue,
                OpCode::Call => {
                    self.reverse_call(args[0] as usize, i_var, q, &mut partial);
                    continue;
                }
                _ => {}
            }

            let z = i_var;
            pz.copy_from_slice(&partial[z * q..z * q + q]);
            if pz.iter().all(|v| *v == F::zero()) {
                continue;
            }
            let rowz = &self.taylor[z * cap..z * cap + q];

            match op {
                OpCode::AddPv => {
                    let y = args[1] as usize;
                    adjoint_scale(F::one(), &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::AddVv => {
                    let (x, y) = (args[0] as usize, args[1] as usize);
                    adjoint_scale(F::one(), &pz, &mut partial[x * q..x * q + q]);
                    adjoint_scale(F::one(), &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::SubPv => {
                    let y = args[1] as usize;
                    adjoint_scale(-F::one(), &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::SubVp => {
                    let x = args[0] as usize;
                    adjoint_scale(F::one(), &pz, &mut partial[x * q..x * q + q]);
                }
                OpCode::SubVv => {
                    let (x, y) = (args[0] as usize, args[1] as usize);
                    adjoint_scale(F::one(), &pz, &mut partial[x * q..x * q + q]);
                    adjoint_scale(-F::one(), &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::MulPv => {
                    let y = args[1] as usize;
                    let p = self.params[args[0] as usize];
                    adjoint_scale(p, &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::MulVv => {
                    let (x, y) = (args[0] as usize, args[1] as usize);
                    let rowx = &self.taylor[x * cap..x * cap + q];
                    let rowy = &self.taylor[y * cap..y * cap + q];
                    adjoint_corr(rowy, &pz, &mut partial[x * q..x * q + q]);
                    adjoint_corr(rowx, &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::DivVp => {
                    let x = args[0] as usize;
                    let p = self.params[args[1] as usize];
                    adjoint_scale(p.recip(), &pz, &mut partial[x * q..x * q + q]);
                }
                OpCode::DivPv => {
                    // z = p / y, so ∂z/∂y = -z/y.
                    let y = args[1] as usize;
                    let rowy = &self.taylor[y * cap..y * cap + q];
                    taylor_recip(rowy, &mut s1);
                    taylor_mul(rowz, &s1, &mut s2);
                    negate(&mut s2);
                    adjoint_corr(&s2, &pz, &mut partial[y * q..y * q + q]);
                }
                OpCode::DivVv => {
                    // ∂z/∂x = 1/y, ∂z/∂y = -z/y.
                    let (x, y) = (args[0] as usize, args[1] as usize);
                    let rowy = &self.taylor[y * cap..y * cap + q];
                    taylor_recip(rowy, &mut s1);
                    adjoint_corr(&s1, &pz, &mut partial[x * q..x * q + q]);
                    taylor_mul(rowz, &s1, &mut s2);
                    negate(&mut s2);
                    adjoint_corr(&s2, &pz, &mut partial[y * q..y * q + q]);
                }
                _ => {
                    let x = args[0] as usize;
                    let rowx = &self.taylor[x * cap..x * cap + q];
                    let px = x * q;
                    match op {
                        OpCode::Neg => adjoint_scale(-F::one(), &pz, &mut partial[px..px + q]),
                        OpCode::Abs => {
                            let s = if rowx[0] > F::zero() {
                                F::one()
                            } else if rowx[0] < F::zero() {
                                -F::one()
                            } else {
                                F::zero()
                            };
                            adjoint_scale(s, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Sign => {}
                        OpCode::Recip => {
                            // f' = -z².
                            taylor_mul(rowz, rowz, &mut s1);
                            negate(&mut s1);
                            adjoint_corr(&s1, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Sqrt => {
                            // f' = 1/(2z).
                            taylor_scale(rowz, F::one() + F::one(), &mut s1);
                            taylor_recip(&s1, &mut s2);
                            adjoint_corr(&s2, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Exp => adjoint_corr(rowz, &pz, &mut partial[px..px + q]),
                        OpCode::Ln => {
                            taylor_recip(rowx, &mut s1);
                            adjoint_corr(&s1, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Sin => {
                            taylor_sin_cos(rowx, &mut s1, &mut s2);
                            adjoint_corr(&s2, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Cos => {
                            taylor_sin_cos(rowx, &mut s1, &mut s2);
                            negate(&mut s1);
                            adjoint_corr(&s1, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Tan => {
                            // f' = 1 + z².
                            taylor_mul(rowz, rowz, &mut s1);
                            s1[0] = s1[0] + F::one();
                            adjoint_corr(&s1, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Sinh => {
                            taylor_sinh_cosh(rowx, &mut s1, &mut s2);
                            adjoint_corr(&s2, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Cosh => {
                            taylor_sinh_cosh(rowx, &mut s1, &mut s2);
                            adjoint_corr(&s1, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Tanh => {
                            // f' = 1 - z².
                            taylor_mul(rowz, rowz, &mut s1);
                            negate(&mut s1);
                            s1[0] = s1[0] + F::one();
                            adjoint_corr(&s1, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Asin => {
                            asin_factor(rowx, &mut s3, &mut s1, &mut s2);
                            adjoint_corr(&s3, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Acos => {
                            asin_factor(rowx, &mut s3, &mut s1, &mut s2);
                            negate(&mut s3);
                            adjoint_corr(&s3, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Atan => {
                            atan_factor(rowx, &mut s2, &mut s1);
                            adjoint_corr(&s2, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Asinh => {
                            asinh_factor(rowx, &mut s3, &mut s1, &mut s2);
                            adjoint_corr(&s3, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Acosh => {
                            acosh_factor(rowx, &mut s3, &mut s1, &mut s2);
                            adjoint_corr(&s3, &pz, &mut partial[px..px + q]);
                        }
                        OpCode::Atanh => {
                            atanh_factor(rowx, &mut s2, &mut s1);
                            adjoint_corr(&s2, &pz, &mut partial[px..px + q]);
                        }
                        _ => unreachable!("reverse: unhandled opcode {:?}", op),
                    }
                }
            }
        }
        debug_assert_eq!(i_var, 0);

        partial.truncate(fun.n_ind * q);
        partial
    }

    /// Reverse-dispatch one atomic call.
    fn reverse_call(&self, call_idx: usize, res_base: usize, q: usize, partial: &mut [F]) {
        let fun = self.fun;
        let call = &fun.calls[call_idx];
        let atom = fun.registry.fetch(call.atom);
        let cap = self.cap;
        let n_arg = call.args.len();
        let n_res = call.n_res as usize;

        let mut taylor_x = vec![F::zero(); n_arg * q];
        for (i, arg) in call.args.iter().enumerate() {
            match *arg {
                CallArg::Par(p) => taylor_x[i * q] = self.params[p as usize],
                CallArg::Var(v) => {
                    let v = v as usize;
                    taylor_x[i * q..(i + 1) * q].copy_from_slice(&self.taylor[v * cap..v * cap + q]);
                }
            }
        }
        let mut taylor_y = vec![F::zero(); n_res * q];
        let mut partial_y = vec![F::zero(); n_res * q];
        for r in 0..n_res {
            let z = res_base + r;
            taylor_y[r * q..(r + 1) * q].copy_from_slice(&self.taylor[z * cap..z * cap + q]);
            partial_y[r * q..(r + 1) * q].copy_from_slice(&partial[z * q..z * q + q]);
        }
        if partial_y.iter().all(|v| *v == F::zero()) {
            return;
        }

        let mut partial_x = vec![F::zero(); n_arg * q];
        let ok = atom.reverse(q, &taylor_x, &taylor_y, &partial_y, &mut partial_x);
        assert!(ok, "{}: atomic reverse returned false", atom.name());

        for (i, arg) in call.args.iter().enumerate() {
            if let CallArg::Var(v) = *arg {
                let v = v as usize;
                for k in 0..q {
                    partial[v * q + k] = partial[v * q + k] + partial_x[i * q + k];
                }
            }
        }
    }
}
