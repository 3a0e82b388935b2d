//! Graph exchange form: a tape serialized as an operator graph.
//!
//! The graph numbers nodes from 1: first the independent dynamic parameters,
//! then the independent variables, then the constants, then one node per
//! operator result. Comparison operators produce no node. [`Function::to_graph`]
//! exports a sealed tape; [`Graph::into_function`] re-records a graph into a
//! fresh tape, re-applying operand folding along the way.

use crate::float::Float;
use crate::function::Function;
use crate::opcode::OpCode;
use crate::recorder::{Bop, Cmp, Recorder};
use crate::value::Value;

/// One graph operator. Arguments are node ids.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphOp {
    Add(usize, usize),
    Sub(usize, usize),
    Mul(usize, usize),
    Div(usize, usize),
    /// Sum of any number of nodes; imports as a chain of additions.
    Sum(Vec<usize>),
    Neg(usize),
    Abs(usize),
    Sign(usize),
    Recip(usize),
    Sqrt(usize),
    Exp(usize),
    Ln(usize),
    Sin(usize),
    Cos(usize),
    Tan(usize),
    Sinh(usize),
    Cosh(usize),
    Tanh(usize),
    Asin(usize),
    Acos(usize),
    Atan(usize),
    Asinh(usize),
    Acosh(usize),
    Atanh(usize),
    // Comparisons record the relation that held; no result node.
    CompLt(usize, usize),
    CompLe(usize, usize),
    CompEq(usize, usize),
    CompNe(usize, usize),
}

impl GraphOp {
    /// Number of result nodes this operator claims.
    pub fn n_res(&self) -> usize {
        match self {
            GraphOp::CompLt(..) | GraphOp::CompLe(..) | GraphOp::CompEq(..)
            | GraphOp::CompNe(..) => 0,
            _ => 1,
        }
    }
}

/// A function in graph exchange form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Graph<F> {
    pub function_name: String,
    pub n_dynamic_ind: usize,
    pub n_variable_ind: usize,
    pub constants: Vec<F>,
    pub operators: Vec<GraphOp>,
    /// Node ids of the dependent values, in output order.
    pub dependents: Vec<usize>,
}

impl<F: Float> Function<F> {
    /// Export this tape to graph form.
    ///
    /// # Panics
    /// If the tape contains atomic function calls; those have no graph
    /// representation.
    pub fn to_graph(&self) -> Graph<F> {
        assert!(
            self.calls.is_empty(),
            "graph form cannot represent atomic function calls"
        );
        let nd = self.ind_dyn.len();
        let nvi = self.n_ind;

        // Constants are the non-dynamic parameter-table entries, in table
        // order; `con_ord[p]` is the ordinal of parameter `p` among them.
        let mut constants = Vec::new();
        let mut con_ord = vec![0usize; self.params.len()];
        for (p, (&v, &is_dyn)) in self.params.iter().zip(self.dyn_flag.iter()).enumerate() {
            if !is_dyn {
                con_ord[p] = constants.len();
                constants.push(v);
            }
        }
        let op_base = 1 + nd + nvi + constants.len();

        // Node id for each parameter-table entry. Dynamic results are filled
        // in as the dynamic sub-tape is emitted below.
        let mut par_node = vec![0usize; self.params.len()];
        for (pos, &p) in self.ind_dyn.iter().enumerate() {
            par_node[p as usize] = 1 + pos;
        }
        for p in 0..self.params.len() {
            if !self.dyn_flag[p] {
                par_node[p] = 1 + nd + nvi + con_ord[p];
            }
        }

        let mut operators = Vec::new();
        let mut next_node = op_base;
        for ((&op, &args), &res) in self
            .dyn_ops
            .iter()
            .zip(self.dyn_args.iter())
            .zip(self.dyn_res.iter())
        {
            let a = par_node[args[0] as usize];
            let g = if op.is_binary() {
                let b = par_node[args[1] as usize];
                binary_graph_op(op, a, b)
            } else {
                unary_graph_op(op, a)
            };
            operators.push(g);
            par_node[res as usize] = next_node;
            next_node += 1;
        }

        let mut var_node = vec![0usize; self.n_var];
        let mut i_var = 0usize;
        for (&op, &args) in self.ops.iter().zip(self.args.iter()) {
            match op {
                OpCode::Inv => {
                    var_node[i_var] = 1 + nd + i_var;
                    i_var += 1;
                }
                // A materialized parameter aliases the parameter's node.
                OpCode::Par => {
                    var_node[i_var] = par_node[args[0] as usize];
                    i_var += 1;
                }
                op if op.is_compare() => {
                    let (a, b) = compare_nodes(op, args, &par_node, &var_node);
                    operators.push(match op {
                        OpCode::LtPv | OpCode::LtVp | OpCode::LtVv => GraphOp::CompLt(a, b),
                        OpCode::LePv | OpCode::LeVp | OpCode::LeVv => GraphOp::CompLe(a, b),
                        OpCode::EqPv | OpCode::EqVv => GraphOp::CompEq(a, b),
                        _ => GraphOp::CompNe(a, b),
                    });
                }
                op if op.is_binary() => {
                    let (a, b) = binary_nodes(op, args, &par_node, &var_node);
                    operators.push(binary_graph_op(op, a, b));
                    var_node[i_var] = next_node;
                    next_node += 1;
                    i_var += 1;
                }
                OpCode::Call => unreachable!(),
                _ => {
                    operators.push(unary_graph_op(op, var_node[args[0] as usize]));
                    var_node[i_var] = next_node;
                    next_node += 1;
                    i_var += 1;
                }
            }
        }
        debug_assert_eq!(i_var, self.n_var);

        Graph {
            function_name: self.name().to_string(),
            n_dynamic_ind: nd,
            n_variable_ind: nvi,
            constants,
            operators,
            dependents: self.dependents.iter().map(|&d| var_node[d as usize]).collect(),
        }
    }

    /// Re-record a graph into a sealed tape; see [`Graph::into_function`].
    pub fn from_graph(graph: Graph<F>) -> Self {
        graph.into_function()
    }
}

/// Operand node ids of a binary op, respecting the variant's operand kinds.
fn binary_nodes(op: OpCode, args: [u32; 2], par_node: &[usize], var_node: &[usize]) -> (usize, usize) {
    match op {
        OpCode::AddPv | OpCode::SubPv | OpCode::MulPv | OpCode::DivPv => {
            (par_node[args[0] as usize], var_node[args[1] as usize])
        }
        OpCode::SubVp | OpCode::DivVp => {
            (var_node[args[0] as usize], par_node[args[1] as usize])
        }
        _ => (var_node[args[0] as usize], var_node[args[1] as usize]),
    }
}

fn compare_nodes(op: OpCode, args: [u32; 2], par_node: &[usize], var_node: &[usize]) -> (usize, usize) {
    match op {
        OpCode::LtPv | OpCode::LePv | OpCode::EqPv | OpCode::NePv => {
            (par_node[args[0] as usize], var_node[args[1] as usize])
        }
        OpCode::LtVp | OpCode::LeVp => (var_node[args[0] as usize], par_node[args[1] as usize]),
        _ => (var_node[args[0] as usize], var_node[args[1] as usize]),
    }
}

fn binary_graph_op(op: OpCode, a: usize, b: usize) -> GraphOp {
    match op {
        OpCode::AddPv | OpCode::AddVv => GraphOp::Add(a, b),
        OpCode::SubPv | OpCode::SubVp | OpCode::SubVv => GraphOp::Sub(a, b),
        OpCode::MulPv | OpCode::MulVv => GraphOp::Mul(a, b),
        _ => GraphOp::Div(a, b),
    }
}

fn unary_graph_op(op: OpCode, a: usize) -> GraphOp {
    match op {
        OpCode::Neg => GraphOp::Neg(a),
        OpCode::Abs => GraphOp::Abs(a),
        OpCode::Sign => GraphOp::Sign(a),
        OpCode::Recip => GraphOp::Recip(a),
        OpCode::Sqrt => GraphOp::Sqrt(a),
        OpCode::Exp => GraphOp::Exp(a),
        OpCode::Ln => GraphOp::Ln(a),
        OpCode::Sin => GraphOp::Sin(a),
        OpCode::Cos => GraphOp::Cos(a),
        OpCode::Tan => GraphOp::Tan(a),
        OpCode::Sinh => GraphOp::Sinh(a),
        OpCode::Cosh => GraphOp::Cosh(a),
        OpCode::Tanh => GraphOp::Tanh(a),
        OpCode::Asin => GraphOp::Asin(a),
        OpCode::Acos => GraphOp::Acos(a),
        OpCode::Atan => GraphOp::Atan(a),
        OpCode::Asinh => GraphOp::Asinh(a),
        OpCode::Acosh => GraphOp::Acosh(a),
        OpCode::Atanh => GraphOp::Atanh(a),
        other => unreachable!("unary_graph_op: {:?}", other),
    }
}

impl<F: Float> Graph<F> {
    /// Re-record this graph into a sealed tape.
    ///
    /// Record-time values are placeholders (zero for every independent node);
    /// run a forward sweep to evaluate at real inputs. Operand folding is
    /// re-applied, so the resulting tape may be shorter than the exported one
    /// when constants fold away.
    pub fn into_function(self) -> Function<F> {
        let rec = Recorder::new();
        let dyn_vals = vec![F::zero(); self.n_dynamic_ind];
        let ind_vals = vec![F::zero(); self.n_variable_ind];

        // nodes[0] is unused; ids in operators are 1-based.
        let mut nodes: Vec<Value<'_, F>> = Vec::with_capacity(
            1 + self.n_dynamic_ind + self.n_variable_ind + self.constants.len(),
        );
        nodes.push(rec.constant(F::zero()));
        nodes.extend(rec.dynamic(&dyn_vals));
        nodes.extend(rec.independent(&ind_vals));
        for &c in &self.constants {
            nodes.push(rec.constant(c));
        }

        for op in &self.operators {
            let res = match *op {
                GraphOp::Add(a, b) => rec.record_binary(Bop::Add, nodes[a], nodes[b]),
                GraphOp::Sub(a, b) => rec.record_binary(Bop::Sub, nodes[a], nodes[b]),
                GraphOp::Mul(a, b) => rec.record_binary(Bop::Mul, nodes[a], nodes[b]),
                GraphOp::Div(a, b) => rec.record_binary(Bop::Div, nodes[a], nodes[b]),
                GraphOp::Sum(ref terms) => {
                    assert!(!terms.is_empty(), "sum operator needs at least one term");
                    let mut acc = nodes[terms[0]];
                    for &t in &terms[1..] {
                        acc = rec.record_binary(Bop::Add, acc, nodes[t]);
                    }
                    acc
                }
                GraphOp::CompLt(a, b) => {
                    rec.record_compare_direct(Cmp::Lt, nodes[a], nodes[b]);
                    continue;
                }
                GraphOp::CompLe(a, b) => {
                    rec.record_compare_direct(Cmp::Le, nodes[a], nodes[b]);
                    continue;
                }
                GraphOp::CompEq(a, b) => {
                    rec.record_compare_direct(Cmp::Eq, nodes[a], nodes[b]);
                    continue;
                }
                GraphOp::CompNe(a, b) => {
                    rec.record_compare_direct(Cmp::Ne, nodes[a], nodes[b]);
                    continue;
                }
                GraphOp::Neg(a) => rec.record_unary(OpCode::Neg, nodes[a]),
                GraphOp::Abs(a) => rec.record_unary(OpCode::Abs, nodes[a]),
                GraphOp::Sign(a) => rec.record_unary(OpCode::Sign, nodes[a]),
                GraphOp::Recip(a) => rec.record_unary(OpCode::Recip, nodes[a]),
                GraphOp::Sqrt(a) => rec.record_unary(OpCode::Sqrt, nodes[a]),
                GraphOp::Exp(a) => rec.record_unary(OpCode::Exp, nodes[a]),
                GraphOp::Ln(a) => rec.record_unary(OpCode::Ln, nodes[a]),
                GraphOp::Sin(a) => rec.record_unary(OpCode::Sin, nodes[a]),
                GraphOp::Cos(a) => rec.record_unary(OpCode::Cos, nodes[a]),
                GraphOp::Tan(a) => rec.record_unary(OpCode::Tan, nodes[a]),
                GraphOp::Sinh(a) => rec.record_unary(OpCode::Sinh, nodes[a]),
                GraphOp::Cosh(a) => rec.record_unary(OpCode::Cosh, nodes[a]),
                GraphOp::Tanh(a) => rec.record_unary(OpCode::Tanh, nodes[a]),
                GraphOp::Asin(a) => rec.record_unary(OpCode::Asin, nodes[a]),
                GraphOp::Acos(a) => rec.record_unary(OpCode::Acos, nodes[a]),
                GraphOp::Atan(a) => rec.record_unary(OpCode::Atan, nodes[a]),
                GraphOp::Asinh(a) => rec.record_unary(OpCode::Asinh, nodes[a]),
                GraphOp::Acosh(a) => rec.record_unary(OpCode::Acosh, nodes[a]),
                GraphOp::Atanh(a) => rec.record_unary(OpCode::Atanh, nodes[a]),
            };
            nodes.push(res);
        }

        let deps: Vec<Value<'_, F>> = self.dependents.iter().map(|&d| nodes[d]).collect();
        let mut fun = rec.seal(&deps);
        fun.set_name(self.function_name);
        fun
    }
}
