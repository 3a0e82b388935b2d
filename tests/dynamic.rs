use approx::assert_relative_eq;
use platypus::Recorder;

#[test]
fn dynamic_parameters_re_evaluate_without_re_recording() {
    let rec = Recorder::new();
    let p = rec.dynamic(&[2.0_f64, 3.0]);
    let x = rec.independent(&[1.0_f64]);
    // y = p0 * x + p1
    let y = vec![p[0] * x[0] + p[1]];
    let f = rec.seal(&y);
    assert_eq!(f.n_dynamic(), 2);

    let mut ws = f.workspace();
    assert_relative_eq!(ws.forward0(&[4.0])[0], 11.0);

    ws.new_dynamic(&[10.0, -1.0]);
    assert_relative_eq!(ws.forward0(&[4.0])[0], 39.0);
}

#[test]
fn dynamic_sub_tape_replays_derived_parameters() {
    let rec = Recorder::new();
    let p = rec.dynamic(&[0.5_f64]);
    let x = rec.independent(&[2.0_f64]);
    // sin(p), p*p, and p + 1 are all computed on the parameter sub-tape.
    let a = p[0].sin();
    let b = p[0] * p[0];
    let c = p[0] + 1.0;
    assert!(a.is_dynamic() && b.is_dynamic() && c.is_dynamic());
    let y = vec![a * x[0] + b + c];
    let f = rec.seal(&y);

    let mut ws = f.workspace();
    let expect = |p: f64, x: f64| p.sin() * x + p * p + p + 1.0;
    assert_relative_eq!(ws.forward0(&[2.0])[0], expect(0.5, 2.0), max_relative = 1e-15);

    ws.new_dynamic(&[1.25]);
    assert_relative_eq!(ws.forward0(&[2.0])[0], expect(1.25, 2.0), max_relative = 1e-15);
}

#[test]
fn derivatives_track_the_current_parameters() {
    let rec = Recorder::new();
    let p = rec.dynamic(&[3.0_f64]);
    let x = rec.independent(&[1.0_f64]);
    let y = vec![p[0] * x[0] * x[0]];
    let f = rec.seal(&y);

    let mut ws = f.workspace();
    // d/dx (p x^2) = 2 p x
    assert_relative_eq!(ws.gradient(&[2.0])[0], 12.0);
    ws.new_dynamic(&[-1.0]);
    assert_relative_eq!(ws.gradient(&[2.0])[0], -4.0);
}

#[test]
#[should_panic(expected = "expected 2 dynamic parameter values")]
fn wrong_dynamic_count_is_fatal() {
    let rec = Recorder::new();
    let p = rec.dynamic(&[1.0_f64, 2.0]);
    let x = rec.independent(&[1.0_f64]);
    let f = rec.seal(&[p[0] * x[0] + p[1]]);
    f.workspace().new_dynamic(&[1.0]);
}

// ── Comparison tracking ──

#[test]
fn compare_change_counts_flipped_branches() {
    let rec = Recorder::new();
    let x = rec.independent(&[1.0_f64, 2.0]);
    // Recorded while x0 < x1 holds.
    let _ = x[0] < x[1];
    let _ = x[0] == 1.0;
    let f = rec.seal(&[x[0] * x[1]]);

    let mut ws = f.workspace();
    ws.forward0(&[1.0, 2.0]);
    assert_eq!(ws.compare_change(), 0);

    // Both recorded relations now fail.
    ws.reset();
    ws.forward0(&[3.0, 2.0]);
    assert_eq!(ws.compare_change(), 2);

    // Equal operands break the strict relation only.
    ws.reset();
    ws.forward0(&[2.0, 2.0]);
    assert_eq!(ws.compare_change(), 2);
}

#[test]
fn parameter_only_comparisons_are_not_recorded() {
    let rec = Recorder::new();
    let x = rec.independent(&[1.0_f64]);
    let n0 = rec.num_ops();
    let a = rec.constant(1.0);
    let b = rec.constant(2.0);
    assert!(a < b);
    assert_eq!(rec.num_ops(), n0);
    let _ = x;
}
