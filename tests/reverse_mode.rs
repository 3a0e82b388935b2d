use approx::assert_relative_eq;

/// Central finite difference: (f(x+h) - f(x-h)) / 2h
fn finite_diff(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = 1e-7;
    (f(x + h) - f(x - h)) / (2.0 * h)
}

/// Gradient of a recorded unary elemental against finite differences.
macro_rules! check_gradient {
    ($name:ident, $method:ident, $x:expr) => {
        #[test]
        fn $name() {
            let f = platypus::record(&[$x], |_, x| vec![x[0].$method()]);
            let g = f.workspace().gradient(&[$x]);
            let expected = finite_diff(|v| f64::$method(v), $x);
            assert_relative_eq!(g[0], expected, max_relative = 1e-5);
        }
    };
}

// ── First order ──

#[test]
fn gradient_of_product() {
    // f = x0 * x1 * x2
    let f = platypus::record(&[2.0_f64, 3.0, 5.0], |_, x| vec![x[0] * x[1] * x[2]]);
    let g = f.workspace().gradient(&[2.0, 3.0, 5.0]);
    assert_relative_eq!(g[0], 15.0);
    assert_relative_eq!(g[1], 10.0);
    assert_relative_eq!(g[2], 6.0);
}

#[test]
fn gradient_of_composition() {
    // f = sin(x0 * x1) + exp(x1 / x0)
    let f = platypus::record(&[1.5_f64, 0.5], |_, x| {
        vec![(x[0] * x[1]).sin() + (x[1] / x[0]).exp()]
    });
    let g = f.workspace().gradient(&[1.5, 0.5]);
    let r = 0.5_f64 / 1.5;
    assert_relative_eq!(
        g[0],
        0.5 * 0.75_f64.cos() - r / 1.5 * r.exp(),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        g[1],
        1.5 * 0.75_f64.cos() + r.exp() / 1.5,
        max_relative = 1e-12
    );
}

check_gradient!(grad_recip, recip, 2.5);
check_gradient!(grad_sqrt, sqrt, 4.0);
check_gradient!(grad_exp, exp, 1.0);
check_gradient!(grad_ln, ln, 2.0);
check_gradient!(grad_sin, sin, 0.7);
check_gradient!(grad_cos, cos, 0.7);
check_gradient!(grad_tan, tan, 0.5);
check_gradient!(grad_sinh, sinh, 0.9);
check_gradient!(grad_cosh, cosh, 0.9);
check_gradient!(grad_tanh, tanh, 0.9);
check_gradient!(grad_asin, asin, 0.4);
check_gradient!(grad_acos, acos, 0.4);
check_gradient!(grad_atan, atan, 1.4);
check_gradient!(grad_asinh, asinh, 1.4);
check_gradient!(grad_acosh, acosh, 1.7);
check_gradient!(grad_atanh, atanh, 0.4);
check_gradient!(grad_abs, abs, -2.0);

// ── Forward/reverse agreement ──

#[test]
fn jacobian_rows_match_forward_columns() {
    let f = platypus::record(&[1.0_f64, 2.0, 3.0], |_, x| {
        vec![x[0] * x[1] + x[2].sqrt(), x[2] / x[0] - x[1].sin()]
    });
    let x = [1.2, 0.8, 2.5];
    let mut ws = f.workspace();
    // Reverse-mode Jacobian (two outputs, three inputs).
    let jac = ws.jacobian(&x);

    // One forward sweep per input direction.
    for j in 0..3 {
        ws.reset();
        ws.forward0(&x);
        let mut dx = [0.0; 3];
        dx[j] = 1.0;
        let col = ws.forward(1, 1, &dx);
        for i in 0..2 {
            assert_relative_eq!(jac[i * 3 + j], col[i], max_relative = 1e-12);
        }
    }
}

#[test]
fn forward_mode_jacobian_when_wide() {
    // More outputs than inputs takes the forward path.
    let f = platypus::record(&[2.0_f64], |_, x| {
        vec![x[0] * x[0], x[0].exp(), x[0].recip()]
    });
    let jac = f.workspace().jacobian(&[2.0]);
    assert_relative_eq!(jac[0], 4.0);
    assert_relative_eq!(jac[1], 2.0_f64.exp(), max_relative = 1e-14);
    assert_relative_eq!(jac[2], -0.25, max_relative = 1e-14);
}

// ── Second order ──

#[test]
fn second_order_reverse() {
    // f = x0^2 * x1, at (2, 3), direction v = (1, 0).
    let f = platypus::record(&[2.0_f64, 3.0], |_, x| vec![x[0] * x[0] * x[1]]);
    let mut ws = f.workspace();
    ws.forward0(&[2.0, 3.0]);
    ws.forward(1, 1, &[1.0, 0.0]);
    ws.forward(2, 2, &[0.0, 0.0]);
    let dw = ws.reverse(2, &[1.0]);

    // dw[j*2 + 1] is the gradient: (2 x0 x1, x0^2).
    assert_relative_eq!(dw[1], 12.0, max_relative = 1e-13);
    assert_relative_eq!(dw[3], 4.0, max_relative = 1e-13);
    // dw[j*2 + 0] is H v: H = [[2 x1, 2 x0], [2 x0, 0]], v = (1, 0).
    assert_relative_eq!(dw[0], 6.0, max_relative = 1e-13);
    assert_relative_eq!(dw[2], 4.0, max_relative = 1e-13);
}

#[test]
fn hessian_vector_product() {
    // f = sin(x0) + x0 * x1^2
    let f = platypus::record(&[0.5_f64, 1.5], |_, x| {
        vec![x[0].sin() + x[0] * x[1] * x[1]]
    });
    let x = [0.5, 1.5];
    let v = [0.3, -0.7];
    let hv = f.workspace().hvp(&x, &v);
    // H = [[-sin x0, 2 x1], [2 x1, 2 x0]]
    let h = [[-x[0].sin(), 2.0 * x[1]], [2.0 * x[1], 2.0 * x[0]]];
    for j in 0..2 {
        let expected = h[j][0] * v[0] + h[j][1] * v[1];
        assert_relative_eq!(hv[j], expected, max_relative = 1e-12);
    }
}

#[test]
fn second_order_reverse_of_ln() {
    // f = ln(x) with x(t) = x + t has c_1 = 1/x. Reverse at order 2
    // differentiates c_1: dw[0] = d c_1 / d x^(0) = -1/x^2 and
    // dw[1] = d c_1 / d x^(1) = 1/x.
    let f = platypus::record(&[2.0_f64], |_, x| vec![x[0].ln()]);
    let mut ws = f.workspace();
    ws.forward(0, 2, &[2.0, 1.0, 0.0]);
    let dw = ws.reverse(2, &[1.0]);
    assert_relative_eq!(dw[0], -0.25, max_relative = 1e-13);
    assert_relative_eq!(dw[1], 0.5, max_relative = 1e-13);
}

// ── Errors ──

#[test]
#[should_panic(expected = "requires a prior forward sweep")]
fn reverse_without_forward_is_fatal() {
    let f = platypus::record(&[1.0_f64], |_, x| vec![x[0].exp()]);
    let ws = f.workspace();
    let _ = ws.reverse(1, &[1.0]);
}

#[test]
#[should_panic(expected = "reverse order must be at least 1")]
fn reverse_order_zero_is_fatal() {
    let f = platypus::record(&[1.0_f64], |_, x| vec![x[0].exp()]);
    let mut ws = f.workspace();
    ws.forward0(&[1.0]);
    let _ = ws.reverse(0, &[1.0]);
}
