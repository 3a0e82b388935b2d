//! Taylor-coefficient recurrence kernels.
//!
//! Convention: `c[k] = f^(k)(t₀) / k!` (normalized Taylor coefficients).
//! Kernels operate on slices; the degree is the output slice length. The
//! forward sweep uses them to propagate coefficients through the tape, the
//! reverse sweep uses them to rebuild each operation's derivative series and
//! then folds adjoints with [`adjoint_corr`].

use num_traits::Float;

// ── Arithmetic ──

/// `c = a + b`
#[inline]
pub fn taylor_add<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = a[k] + b[k];
    }
}

/// `c = a - b`
#[inline]
pub fn taylor_sub<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = a[k] - b[k];
    }
}

/// `c = -a`
#[inline]
pub fn taylor_neg<F: Float>(a: &[F], c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = -a[k];
    }
}

/// `c = s * a` where `s` is a scalar.
#[inline]
pub fn taylor_scale<F: Float>(a: &[F], s: F, c: &mut [F]) {
    for k in 0..c.len() {
        c[k] = s * a[k];
    }
}

/// `c = a * b` — Cauchy product.
///
/// `c[k] = Σ_{j=0}^{k} a[j] * b[k-j]`
#[inline]
pub fn taylor_mul<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    let n = c.len();
    for k in 0..n {
        let mut sum = F::zero();
        for j in 0..=k {
            sum = sum + a[j] * b[k - j];
        }
        c[k] = sum;
    }
}

/// `c = a / b` — recursive Taylor division.
///
/// `c[k] = (a[k] - Σ_{j=1}^{k} b[j] * c[k-j]) / b[0]`
#[inline]
pub fn taylor_div<F: Float>(a: &[F], b: &[F], c: &mut [F]) {
    let n = c.len();
    let inv_b0 = F::one() / b[0];
    for k in 0..n {
        let mut sum = a[k];
        for j in 1..=k {
            sum = sum - b[j] * c[k - j];
        }
        c[k] = sum * inv_b0;
    }
}

/// `c = 1/a` — division with numerator `[1, 0, ..., 0]`.
#[inline]
pub fn taylor_recip<F: Float>(a: &[F], c: &mut [F]) {
    let n = c.len();
    let inv_a0 = F::one() / a[0];
    c[0] = inv_a0;
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + a[j] * c[k - j];
        }
        c[k] = -sum * inv_a0;
    }
}

// ── Transcendentals (logarithmic-derivative recurrences) ──

/// `c = exp(a)`
///
/// `c[0] = exp(a[0])`
/// `c[k] = (1/k) * Σ_{j=1}^{k} j * a[j] * c[k-j]`
#[inline]
pub fn taylor_exp<F: Float>(a: &[F], c: &mut [F]) {
    let n = c.len();
    c[0] = a[0].exp();
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from(j).unwrap() * a[j] * c[k - j];
        }
        c[k] = sum / F::from(k).unwrap();
    }
}

/// `c = ln(a)`
///
/// `c[0] = ln(a[0])`
/// `c[k] = (a[k] - (1/k) * Σ_{j=1}^{k-1} j * c[j] * a[k-j]) / a[0]`
#[inline]
pub fn taylor_ln<F: Float>(a: &[F], c: &mut [F]) {
    let n = c.len();
    let inv_a0 = F::one() / a[0];
    c[0] = a[0].ln();
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..k {
            sum = sum + F::from(j).unwrap() * c[j] * a[k - j];
        }
        c[k] = (a[k] - sum / F::from(k).unwrap()) * inv_a0;
    }
}

/// `c = sqrt(a)`
///
/// `c[0] = sqrt(a[0])`
/// `c[k] = (a[k] - Σ_{j=1}^{k-1} c[j] * c[k-j]) / (2 * c[0])`
#[inline]
pub fn taylor_sqrt<F: Float>(a: &[F], c: &mut [F]) {
    let n = c.len();
    c[0] = a[0].sqrt();
    let two_c0 = c[0] + c[0];
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..k {
            sum = sum + c[j] * c[k - j];
        }
        c[k] = (a[k] - sum) / two_c0;
    }
}

/// `(s, co) = (sin(a), cos(a))` — coupled recurrence.
///
/// `s[k] = (1/k) * Σ_{j=1}^{k} j * a[j] * co[k-j]`
/// `co[k] = -(1/k) * Σ_{j=1}^{k} j * a[j] * s[k-j]`
#[inline]
pub fn taylor_sin_cos<F: Float>(a: &[F], s: &mut [F], co: &mut [F]) {
    let n = s.len();
    let (s0, c0) = a[0].sin_cos();
    s[0] = s0;
    co[0] = c0;
    for k in 1..n {
        let inv_k = F::one() / F::from(k).unwrap();
        let mut sum_s = F::zero();
        let mut sum_c = F::zero();
        for j in 1..=k {
            let jf = F::from(j).unwrap();
            sum_s = sum_s + jf * a[j] * co[k - j];
            sum_c = sum_c + jf * a[j] * s[k - j];
        }
        s[k] = sum_s * inv_k;
        co[k] = -sum_c * inv_k;
    }
}

/// `(sh, ch) = (sinh(a), cosh(a))` — coupled recurrence, positive signs.
#[inline]
pub fn taylor_sinh_cosh<F: Float>(a: &[F], sh: &mut [F], ch: &mut [F]) {
    let n = sh.len();
    sh[0] = a[0].sinh();
    ch[0] = a[0].cosh();
    for k in 1..n {
        let inv_k = F::one() / F::from(k).unwrap();
        let mut sum_sh = F::zero();
        let mut sum_ch = F::zero();
        for j in 1..=k {
            let jf = F::from(j).unwrap();
            sum_sh = sum_sh + jf * a[j] * ch[k - j];
            sum_ch = sum_ch + jf * a[j] * sh[k - j];
        }
        sh[k] = sum_sh * inv_k;
        ch[k] = sum_ch * inv_k;
    }
}

/// Integration step shared by the inverse functions: given the derivative
/// series `g` with `c' = a' * g`, fill `c[1..]` by
/// `c[k] = (1/k) * Σ_{j=1}^{k} j * a[j] * g[k-j]`.
#[inline]
fn integrate<F: Float>(a: &[F], g: &[F], c: &mut [F]) {
    let n = c.len();
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from(j).unwrap() * a[j] * g[k - j];
        }
        c[k] = sum / F::from(k).unwrap();
    }
}

/// `c = tan(a)` — via `c' = a' * (1 + c²)`; `scratch` holds `1 + c²`.
///
/// `s[k]` depends on `c[k]`, but the integration step for `c[k]` only reads
/// `s[0..k]`, so the two rows advance in lockstep.
#[inline]
pub fn taylor_tan<F: Float>(a: &[F], c: &mut [F], scratch: &mut [F]) {
    let n = c.len();
    c[0] = a[0].tan();
    scratch[0] = F::one() + c[0] * c[0];
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from(j).unwrap() * a[j] * scratch[k - j];
        }
        c[k] = sum / F::from(k).unwrap();
        let mut s_k = F::zero();
        for j in 0..=k {
            s_k = s_k + c[j] * c[k - j];
        }
        scratch[k] = s_k;
    }
}

/// `c = tanh(a)` — via `c' = a' * (1 - c²)`; `scratch` holds `1 - c²`.
#[inline]
pub fn taylor_tanh<F: Float>(a: &[F], c: &mut [F], scratch: &mut [F]) {
    let n = c.len();
    c[0] = a[0].tanh();
    scratch[0] = F::one() - c[0] * c[0];
    for k in 1..n {
        let mut sum = F::zero();
        for j in 1..=k {
            sum = sum + F::from(j).unwrap() * a[j] * scratch[k - j];
        }
        c[k] = sum / F::from(k).unwrap();
        let mut s_k = F::zero();
        for j in 0..=k {
            s_k = s_k + c[j] * c[k - j];
        }
        scratch[k] = -s_k;
    }
}

/// Derivative series `g = 1/(1 + a²)` of `atan(a)`, written into `g`.
/// `s1` is work space.
#[inline]
pub fn atan_factor<F: Float>(a: &[F], g: &mut [F], s1: &mut [F]) {
    taylor_mul(a, a, s1);
    s1[0] = F::one() + s1[0];
    taylor_recip(s1, g);
}

/// Derivative series `g = 1/(1 - a²)` of `atanh(a)`.
#[inline]
pub fn atanh_factor<F: Float>(a: &[F], g: &mut [F], s1: &mut [F]) {
    taylor_mul(a, a, s1);
    for v in s1.iter_mut() {
        *v = -*v;
    }
    s1[0] = F::one() + s1[0];
    taylor_recip(s1, g);
}

/// Derivative series `g = 1/sqrt(1 - a²)` of `asin(a)`.
/// `s1` and `s2` are work space.
#[inline]
pub fn asin_factor<F: Float>(a: &[F], g: &mut [F], s1: &mut [F], s2: &mut [F]) {
    taylor_mul(a, a, s1);
    for v in s1.iter_mut() {
        *v = -*v;
    }
    s1[0] = F::one() + s1[0];
    taylor_sqrt(s1, s2);
    taylor_recip(s2, g);
}

/// Derivative series `g = 1/sqrt(1 + a²)` of `asinh(a)`.
#[inline]
pub fn asinh_factor<F: Float>(a: &[F], g: &mut [F], s1: &mut [F], s2: &mut [F]) {
    taylor_mul(a, a, s1);
    s1[0] = F::one() + s1[0];
    taylor_sqrt(s1, s2);
    taylor_recip(s2, g);
}

/// Derivative series `g = 1/sqrt(a² - 1)` of `acosh(a)`.
#[inline]
pub fn acosh_factor<F: Float>(a: &[F], g: &mut [F], s1: &mut [F], s2: &mut [F]) {
    taylor_mul(a, a, s1);
    s1[0] = s1[0] - F::one();
    taylor_sqrt(s1, s2);
    taylor_recip(s2, g);
}

/// `c = atan(a)`; `s1`, `s2` are work space.
#[inline]
pub fn taylor_atan<F: Float>(a: &[F], c: &mut [F], s1: &mut [F], s2: &mut [F]) {
    c[0] = a[0].atan();
    atan_factor(a, s2, s1);
    integrate(a, s2, c);
}

/// `c = atanh(a)`.
#[inline]
pub fn taylor_atanh<F: Float>(a: &[F], c: &mut [F], s1: &mut [F], s2: &mut [F]) {
    c[0] = a[0].atanh();
    atanh_factor(a, s2, s1);
    integrate(a, s2, c);
}

/// `c = asin(a)`; `s1`, `s2`, `s3` are work space.
#[inline]
pub fn taylor_asin<F: Float>(a: &[F], c: &mut [F], s1: &mut [F], s2: &mut [F], s3: &mut [F]) {
    c[0] = a[0].asin();
    asin_factor(a, s3, s1, s2);
    integrate(a, s3, c);
}

/// `c = acos(a) = π/2 - asin(a)`.
#[inline]
pub fn taylor_acos<F: Float>(a: &[F], c: &mut [F], s1: &mut [F], s2: &mut [F], s3: &mut [F]) {
    taylor_asin(a, c, s1, s2, s3);
    c[0] = a[0].acos();
    for ck in c[1..].iter_mut() {
        *ck = -*ck;
    }
}

/// `c = asinh(a)`.
#[inline]
pub fn taylor_asinh<F: Float>(a: &[F], c: &mut [F], s1: &mut [F], s2: &mut [F], s3: &mut [F]) {
    c[0] = a[0].asinh();
    asinh_factor(a, s3, s1, s2);
    integrate(a, s3, c);
}

/// `c = acosh(a)`.
#[inline]
pub fn taylor_acosh<F: Float>(a: &[F], c: &mut [F], s1: &mut [F], s2: &mut [F], s3: &mut [F]) {
    c[0] = a[0].acosh();
    acosh_factor(a, s3, s1, s2);
    integrate(a, s3, c);
}

// ── Adjoint helpers ──

/// Transposed coefficient product: `px[j] += Σ_{k=j}^{q-1} pz[k] * c[k-j]`.
///
/// If `z = f(x)` with derivative series `c = f'(x)`, then
/// `∂z[k]/∂x[j] = c[k-j]`, so this folds the adjoint of `z`'s coefficients
/// into the adjoint of `x`'s coefficients.
#[inline]
pub fn adjoint_corr<F: Float>(c: &[F], pz: &[F], px: &mut [F]) {
    let q = pz.len();
    for j in 0..q {
        let mut sum = F::zero();
        for k in j..q {
            sum = sum + pz[k] * c[k - j];
        }
        px[j] = px[j] + sum;
    }
}

/// Scalar special case of [`adjoint_corr`]: `px[j] += s * pz[j]`.
#[inline]
pub fn adjoint_scale<F: Float>(s: F, pz: &[F], px: &mut [F]) {
    for j in 0..pz.len() {
        px[j] = px[j] + s * pz[j];
    }
}
