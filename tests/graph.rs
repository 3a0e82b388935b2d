use approx::assert_relative_eq;
use platypus::{Graph, GraphOp, Recorder};

#[test]
fn export_import_round_trip() {
    let rec = Recorder::new();
    let x = rec.independent(&[1.0_f64, 2.0]);
    let y = vec![(x[0] * x[1]).sin() + 3.0 * x[0], x[1] / x[0] - x[0].sqrt()];
    let mut f = rec.seal(&y);
    f.set_name("round_trip");

    let g = f.to_graph();
    assert_eq!(g.function_name, "round_trip");
    assert_eq!(g.n_dynamic_ind, 0);
    assert_eq!(g.n_variable_ind, 2);
    let f2 = g.into_function();
    assert_eq!(f2.name(), "round_trip");
    assert_eq!(f2.domain(), f.domain());
    assert_eq!(f2.range(), f.range());

    let x_eval = [1.7, 0.4];
    let out = f.workspace().forward0(&x_eval);
    let out2 = f2.workspace().forward0(&x_eval);
    assert_eq!(out, out2, "re-recorded tape must evaluate identically");
}

#[test]
fn round_trip_preserves_derivatives() {
    let f = platypus::record(&[0.5_f64, 1.5], |_, x| {
        vec![x[0].exp() * x[1] + x[1].tanh()]
    });
    let f2 = f.to_graph().into_function();
    let x = [0.5, 1.5];
    let g1 = f.workspace().gradient(&x);
    let g2 = f2.workspace().gradient(&x);
    assert_eq!(g1, g2);
}

#[test]
fn dynamic_parameters_survive_the_round_trip() {
    let rec = Recorder::new();
    let p = rec.dynamic(&[2.0_f64]);
    let x = rec.independent(&[3.0_f64]);
    // p enters both the variable tape and the dynamic sub-tape.
    let y = vec![p[0] * x[0] + p[0].cos()];
    let f = rec.seal(&y);

    let g = f.to_graph();
    assert_eq!(g.n_dynamic_ind, 1);
    let f2 = g.into_function();
    assert_eq!(f2.n_dynamic(), 1);

    let mut ws = f2.workspace();
    ws.new_dynamic(&[2.0]);
    let out = ws.forward0(&[3.0]);
    assert_relative_eq!(out[0], 6.0 + 2.0_f64.cos(), max_relative = 1e-15);

    ws.new_dynamic(&[-1.0]);
    ws.reset();
    let out = ws.forward0(&[3.0]);
    assert_relative_eq!(out[0], -3.0 + 1.0_f64.cos(), max_relative = 1e-15);
}

#[test]
fn comparisons_are_exported() {
    let rec = Recorder::new();
    let x = rec.independent(&[1.0_f64, 2.0]);
    let _ = x[0] < x[1];
    let f = rec.seal(&[x[0] + x[1]]);

    let g = f.to_graph();
    assert!(g
        .operators
        .iter()
        .any(|op| matches!(op, GraphOp::CompLt(..))));

    let f2 = g.into_function();
    let mut ws = f2.workspace();
    ws.forward0(&[5.0, 2.0]);
    assert_eq!(ws.compare_change(), 1);
}

#[test]
fn sum_operator_imports_as_addition_chain() {
    // Hand-built graph: y = x0 + x1 + x2 + 1.
    let g = Graph::<f64> {
        function_name: String::from("summed"),
        n_dynamic_ind: 0,
        n_variable_ind: 3,
        constants: vec![1.0],
        operators: vec![GraphOp::Sum(vec![1, 2, 3, 4])],
        dependents: vec![5],
    };
    let f = g.into_function();
    assert_eq!(f.domain(), 3);
    let out = f.workspace().forward0(&[10.0, 20.0, 30.0]);
    assert_relative_eq!(out[0], 61.0);
}

#[test]
#[should_panic(expected = "graph form cannot represent atomic function calls")]
fn atomic_calls_refuse_export() {
    use platypus::{Atomic, ValueType};

    struct Identity;
    impl Atomic<f64> for Identity {
        fn name(&self) -> &str {
            "identity"
        }
        fn for_type(&self, type_x: &[ValueType]) -> Vec<ValueType> {
            type_x.to_vec()
        }
        fn forward(
            &self,
            _parameter_x: &[f64],
            _type_x: &[ValueType],
            order_low: usize,
            order_up: usize,
            taylor_x: &[f64],
            taylor_y: &mut [f64],
        ) -> bool {
            taylor_y[order_low..=order_up].copy_from_slice(&taylor_x[order_low..=order_up]);
            true
        }
    }

    let rec = Recorder::new();
    let x = rec.independent(&[1.0_f64]);
    let id = rec.register_atomic(Box::new(Identity));
    let y = rec.call(id, &[x[0]]);
    let f = rec.seal(&y);
    let _ = f.to_graph();
}

#[cfg(feature = "serde")]
#[test]
fn graph_serializes_to_json() {
    let f = platypus::record(&[1.0_f64, 2.0], |_, x| vec![x[0] * x[1] + x[0].sin()]);
    let g = f.to_graph();
    let json = serde_json::to_string(&g).unwrap();
    let g2: Graph<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(g, g2);

    let x = [0.3, -1.2];
    let out = f.workspace().forward0(&x);
    let out2 = g2.into_function().workspace().forward0(&x);
    assert_eq!(out, out2);
}
