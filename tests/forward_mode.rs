use approx::assert_relative_eq;
use platypus::Recorder;

/// Central finite difference: (f(x+h) - f(x-h)) / 2h
fn finite_diff(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = 1e-7;
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// Record a unary elemental, evaluate it at `x`, and check value and first
/// derivative against `f64` and finite differences.
macro_rules! check_elemental {
    ($name:ident, $method:ident, $x:expr) => {
        #[test]
        fn $name() {
            let f = platypus::record(&[$x], |_, x| vec![x[0].$method()]);
            let mut ws = f.workspace();
            let y = ws.forward0(&[$x]);
            assert_relative_eq!(y[0], f64::$method($x), max_relative = 1e-12);
            let dy = ws.forward(1, 1, &[1.0]);
            let expected = finite_diff(|v| f64::$method(v), $x);
            assert_relative_eq!(dy[0], expected, max_relative = 1e-5);
        }
    };
}

// ── Arithmetic ──

#[test]
fn product_rule() {
    let f = platypus::record(&[3.0_f64, 4.0], |_, x| vec![x[0] * x[1]]);
    let mut ws = f.workspace();
    assert_relative_eq!(ws.forward0(&[3.0, 4.0])[0], 12.0);
    // Direction (1, 1): d(xy) = y dx + x dy = 7.
    assert_relative_eq!(ws.forward(1, 1, &[1.0, 1.0])[0], 7.0);
}

#[test]
fn quotient_rule() {
    // d/dx (x / (x+1)) at x=2: 1/(x+1)^2 = 1/9
    let f = platypus::record(&[2.0_f64], |_, x| vec![x[0] / (x[0] + 1.0)]);
    let mut ws = f.workspace();
    assert_relative_eq!(ws.forward0(&[2.0])[0], 2.0 / 3.0, max_relative = 1e-15);
    assert_relative_eq!(ws.forward(1, 1, &[1.0])[0], 1.0 / 9.0, max_relative = 1e-12);
}

#[test]
fn parameter_variants() {
    // Every Pv/Vp variant in one function.
    let f = platypus::record(&[2.0_f64], |_, x| {
        vec![3.0 + x[0], 3.0 - x[0], x[0] - 3.0, 3.0 * x[0], 3.0 / x[0], x[0] / 3.0]
    });
    let mut ws = f.workspace();
    let y = ws.forward0(&[2.0]);
    assert_relative_eq!(y[0], 5.0);
    assert_relative_eq!(y[1], 1.0);
    assert_relative_eq!(y[2], -1.0);
    assert_relative_eq!(y[3], 6.0);
    assert_relative_eq!(y[4], 1.5);
    assert_relative_eq!(y[5], 2.0 / 3.0, max_relative = 1e-15);
    let d = ws.forward(1, 1, &[1.0]);
    assert_relative_eq!(d[0], 1.0);
    assert_relative_eq!(d[1], -1.0);
    assert_relative_eq!(d[2], 1.0);
    assert_relative_eq!(d[3], 3.0);
    assert_relative_eq!(d[4], -3.0 / 4.0, max_relative = 1e-12);
    assert_relative_eq!(d[5], 1.0 / 3.0, max_relative = 1e-15);
}

// ── Elementals ──

check_elemental!(recip_deriv, recip, 2.5);
check_elemental!(sqrt_deriv, sqrt, 4.0);
check_elemental!(exp_deriv, exp, 1.0);
check_elemental!(ln_deriv, ln, 2.0);
check_elemental!(sin_deriv, sin, 0.7);
check_elemental!(cos_deriv, cos, 0.7);
check_elemental!(tan_deriv, tan, 0.5);
check_elemental!(sinh_deriv, sinh, 0.9);
check_elemental!(cosh_deriv, cosh, 0.9);
check_elemental!(tanh_deriv, tanh, 0.9);
check_elemental!(asin_deriv, asin, 0.4);
check_elemental!(acos_deriv, acos, 0.4);
check_elemental!(atan_deriv, atan, 1.4);
check_elemental!(asinh_deriv, asinh, 1.4);
check_elemental!(acosh_deriv, acosh, 1.7);
check_elemental!(atanh_deriv, atanh, 0.4);

#[test]
fn negation() {
    let f = platypus::record(&[1.3_f64], |_, x| vec![-x[0]]);
    let mut ws = f.workspace();
    assert_relative_eq!(ws.forward0(&[1.3])[0], -1.3);
    assert_relative_eq!(ws.forward(1, 1, &[1.0])[0], -1.0);
}

#[test]
fn abs_on_negative_branch() {
    let f = platypus::record(&[1.0_f64], |_, x| vec![x[0].abs()]);
    let mut ws = f.workspace();
    assert_relative_eq!(ws.forward0(&[-2.5])[0], 2.5);
    assert_relative_eq!(ws.forward(1, 1, &[1.0])[0], -1.0);
}

#[test]
fn signum_has_zero_derivative() {
    let f = platypus::record(&[-3.0_f64], |_, x| vec![x[0].signum()]);
    let mut ws = f.workspace();
    assert_relative_eq!(ws.forward0(&[-3.0])[0], -1.0);
    assert_relative_eq!(ws.forward(1, 1, &[1.0])[0], 0.0);
}

// ── Higher orders ──

#[test]
fn second_order_coefficients() {
    // f(x) = exp(x): every Taylor coefficient at direction dx = 1 is
    // exp(x) / k!.
    let f = platypus::record(&[0.5_f64], |_, x| vec![x[0].exp()]);
    let mut ws = f.workspace();
    let e = 0.5_f64.exp();
    assert_relative_eq!(ws.forward0(&[0.5])[0], e, max_relative = 1e-14);
    assert_relative_eq!(ws.forward(1, 1, &[1.0])[0], e, max_relative = 1e-14);
    assert_relative_eq!(ws.forward(2, 2, &[0.0])[0], e / 2.0, max_relative = 1e-13);
    assert_relative_eq!(ws.forward(3, 3, &[0.0])[0], e / 6.0, max_relative = 1e-13);
}

#[test]
fn multiple_orders_in_one_sweep() {
    // x(t) = 2 + t, f = x^2: coefficients 4, 4, 1.
    let f = platypus::record(&[2.0_f64], |_, x| vec![x[0] * x[0]]);
    let mut ws = f.workspace();
    let c = ws.forward(0, 2, &[2.0, 1.0, 0.0]);
    assert_relative_eq!(c[0], 4.0);
    assert_relative_eq!(c[1], 4.0);
    assert_relative_eq!(c[2], 1.0);
}

#[test]
fn reset_restarts_at_order_zero() {
    let f = platypus::record(&[1.0_f64], |_, x| vec![x[0].sin()]);
    let mut ws = f.workspace();
    ws.forward(0, 1, &[1.0, 1.0]);
    ws.reset();
    let y = ws.forward0(&[2.0]);
    assert_relative_eq!(y[0], 2.0_f64.sin(), max_relative = 1e-14);
}

#[test]
#[should_panic(expected = "forward orders must advance monotonically")]
fn non_monotonic_orders_are_fatal() {
    let f = platypus::record(&[1.0_f64], |_, x| vec![x[0].exp()]);
    let mut ws = f.workspace();
    ws.forward0(&[1.0]);
    // Order 0 is already evaluated; order 2 without order 1 is an error.
    ws.forward(2, 2, &[0.0]);
}
