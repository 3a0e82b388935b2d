//! Convenience layer: one-shot recording and common derivative drivers.

use crate::float::Float;
use crate::function::{Function, Workspace};
use crate::recorder::Recorder;
use crate::value::Value;

/// Record a function in one call: declares `x` as the independent variables,
/// runs `build`, and seals the result.
///
/// ```
/// let f = platypus::record(&[0.5_f64, 2.0], |_, x| vec![x[0] * x[1]]);
/// assert_eq!(f.domain(), 2);
/// ```
pub fn record<F, G>(x: &[F], build: G) -> Function<F>
where
    F: Float,
    G: for<'t> Fn(&'t Recorder<F>, &[Value<'t, F>]) -> Vec<Value<'t, F>>,
{
    let rec = Recorder::new();
    let ind = rec.independent(x);
    let dep = build(&rec, &ind);
    rec.seal(&dep)
}

impl<'f, F: Float> Workspace<'f, F> {
    /// Gradient of a scalar-valued function at `x`.
    pub fn gradient(&mut self, x: &[F]) -> Vec<F> {
        let n = self.fun.domain();
        assert_eq!(
            self.fun.range(),
            1,
            "gradient needs a scalar-valued function, this one has {} outputs",
            self.fun.range()
        );
        self.reset();
        self.forward(0, 0, x);
        self.forward(1, 1, &vec![F::zero(); n]);
        self.reverse(1, &[F::one()])
    }

    /// Dense Jacobian at `x`, row-major `range() × domain()`.
    ///
    /// Uses one reverse sweep per output when there are at most as many
    /// outputs as inputs, one forward sweep per input otherwise.
    pub fn jacobian(&mut self, x: &[F]) -> Vec<F> {
        let n = self.fun.domain();
        let m = self.fun.range();
        let mut jac = vec![F::zero(); m * n];
        if m <= n {
            self.reset();
            self.forward(0, 0, x);
            self.forward(1, 1, &vec![F::zero(); n]);
            let mut w = vec![F::zero(); m];
            for i in 0..m {
                w[i] = F::one();
                let dw = self.reverse(1, &w);
                w[i] = F::zero();
                jac[i * n..(i + 1) * n].copy_from_slice(&dw);
            }
        } else {
            let mut dx = vec![F::zero(); n];
            for j in 0..n {
                self.reset();
                self.forward(0, 0, x);
                dx[j] = F::one();
                let col = self.forward(1, 1, &dx);
                dx[j] = F::zero();
                for i in 0..m {
                    jac[i * n + j] = col[i];
                }
            }
        }
        jac
    }

    /// Hessian-vector product `H(x) · v` of a scalar-valued function.
    ///
    /// Runs forward sweeps up to order two (direction `v` at order one, zero
    /// at order two) and reads the product out of a second-order reverse
    /// sweep.
    pub fn hvp(&mut self, x: &[F], v: &[F]) -> Vec<F> {
        let n = self.fun.domain();
        assert_eq!(
            self.fun.range(),
            1,
            "hvp needs a scalar-valued function, this one has {} outputs",
            self.fun.range()
        );
        self.reset();
        self.forward(0, 0, x);
        self.forward(1, 1, v);
        self.forward(2, 2, &vec![F::zero(); n]);
        let dw = self.reverse(2, &[F::one()]);
        (0..n).map(|j| dw[j * 2]).collect()
    }
}
