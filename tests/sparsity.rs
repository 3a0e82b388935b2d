use platypus::{ListSetVec, PackSetVec, SetVec, SparsityPattern};

// ── Vector-of-sets laws ──

fn setvec_basics<S: SetVec>() {
    let mut s = S::with_sets(3, 10);
    assert_eq!(s.n_set(), 3);
    assert_eq!(s.end(), 10);
    assert_eq!(s.number_elements(0), 0);

    s.add_element(0, 4);
    s.add_element(0, 1);
    s.add_element(0, 4);
    assert_eq!(s.number_elements(0), 2);
    assert!(s.is_element(0, 1));
    assert!(s.is_element(0, 4));
    assert!(!s.is_element(0, 2));
    assert_eq!(s.iter(0).collect::<Vec<_>>(), vec![1, 4]);

    s.assignment(1, 0);
    assert_eq!(s.iter(1).collect::<Vec<_>>(), vec![1, 4]);
    // Mutating the target must not touch the source.
    s.add_element(1, 7);
    assert_eq!(s.iter(0).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(s.iter(1).collect::<Vec<_>>(), vec![1, 4, 7]);

    s.clear(1);
    assert_eq!(s.number_elements(1), 0);
    assert_eq!(s.number_elements(0), 2);
}

fn setvec_unions<S: SetVec>() {
    let mut s = S::with_sets(4, 8);
    for e in [0, 2, 5] {
        s.add_element(0, e);
    }
    for e in [2, 3] {
        s.add_element(1, e);
    }
    s.binary_union(2, 0, 1);
    assert_eq!(s.iter(2).collect::<Vec<_>>(), vec![0, 2, 3, 5]);
    // Union into one of its own operands.
    s.binary_union(0, 0, 1);
    assert_eq!(s.iter(0).collect::<Vec<_>>(), vec![0, 2, 3, 5]);

    let mut other = S::with_sets(1, 8);
    other.add_element(0, 7);
    s.union_from(3, 1, &other, 0);
    assert_eq!(s.iter(3).collect::<Vec<_>>(), vec![2, 3, 7]);
}

fn setvec_union_associativity<S: SetVec>() {
    let mut s = S::with_sets(5, 12);
    for e in [0, 3, 7] {
        s.add_element(0, e);
    }
    for e in [3, 4] {
        s.add_element(1, e);
    }
    for e in [4, 11] {
        s.add_element(2, e);
    }
    // (A union B) union C.
    s.binary_union(3, 0, 1);
    s.binary_union(3, 3, 2);
    // A union (B union C).
    s.binary_union(4, 1, 2);
    s.binary_union(4, 0, 4);
    assert_eq!(s.iter(3).collect::<Vec<_>>(), vec![0, 3, 4, 7, 11]);
    assert_eq!(
        s.iter(3).collect::<Vec<_>>(),
        s.iter(4).collect::<Vec<_>>()
    );
}

fn setvec_assign_from_matches_source<S: SetVec>() {
    let mut v = S::with_sets(2, 9);
    for e in [1, 4, 8] {
        v.add_element(0, e);
    }
    let mut t = S::with_sets(3, 9);
    t.add_element(1, 2);
    t.assign_from(1, &v, 0);
    // Element for element, the target now mirrors the source set; its old
    // contents are gone.
    for e in 0..9 {
        assert_eq!(t.is_element(1, e), v.is_element(0, e));
    }
    assert_eq!(t.iter(1).collect::<Vec<_>>(), vec![1, 4, 8]);
}

fn setvec_posting<S: SetVec>() {
    let mut s = S::with_sets(2, 6);
    s.add_element(0, 3);
    s.post_element(0, 1);
    s.post_element(0, 5);
    s.post_element(0, 1);
    s.process_post(0);
    assert_eq!(s.iter(0).collect::<Vec<_>>(), vec![1, 3, 5]);
}

#[test]
fn list_setvec_basics() {
    setvec_basics::<ListSetVec>();
    setvec_unions::<ListSetVec>();
    setvec_union_associativity::<ListSetVec>();
    setvec_assign_from_matches_source::<ListSetVec>();
    setvec_posting::<ListSetVec>();
}

#[test]
fn pack_setvec_basics() {
    setvec_basics::<PackSetVec>();
    setvec_unions::<PackSetVec>();
    setvec_union_associativity::<PackSetVec>();
    setvec_assign_from_matches_source::<PackSetVec>();
    setvec_posting::<PackSetVec>();
}

#[test]
fn list_setvec_intersection_iterated_past_the_end() {
    let mut s = ListSetVec::with_sets(3, 5);
    s.add_element(0, 1);
    s.add_element(0, 2);
    s.add_element(1, 2);
    s.add_element(1, 3);
    s.binary_intersection(2, 0, 1);
    let mut it = s.iter(2);
    assert_eq!(it.next_or_end(), 2);
    // Exhausted iterators keep returning the end marker.
    assert_eq!(it.next_or_end(), 5);
    assert_eq!(it.next_or_end(), 5);
}

#[test]
fn list_setvec_shares_until_written() {
    let mut s = ListSetVec::with_sets(3, 10);
    s.add_element(0, 2);
    s.add_element(0, 6);
    s.assignment(1, 0);
    s.assignment(2, 0);
    assert_eq!(s.reference_count(0), 3);

    // Writing one alias splits it off; the others keep sharing.
    s.add_element(1, 9);
    assert_eq!(s.reference_count(0), 2);
    assert_eq!(s.iter(0).collect::<Vec<_>>(), vec![2, 6]);
    assert_eq!(s.iter(1).collect::<Vec<_>>(), vec![2, 6, 9]);

    // A union whose result equals one operand may share again.
    s.binary_union(2, 0, 0);
    assert_eq!(s.iter(2).collect::<Vec<_>>(), vec![2, 6]);
}

#[test]
fn list_setvec_posting_defers_insertion() {
    let mut s = ListSetVec::with_sets(2, 6);
    s.add_element(0, 3);
    s.post_element(0, 1);
    // Posted elements are invisible until processed.
    assert!(!s.is_element(0, 1));
    assert_eq!(s.number_elements(0), 1);
    s.process_post(0);
    assert!(s.is_element(0, 1));
}

#[test]
fn list_setvec_reuses_freed_nodes() {
    let mut s = ListSetVec::with_sets(2, 100);
    for e in 0..10 {
        s.add_element(0, e);
    }
    assert_eq!(s.number_not_used(), 0);
    // Dropping the last reference frees the 10 element nodes plus the
    // header.
    s.clear(0);
    assert_eq!(s.number_not_used(), 11);

    // New allocations pop from the free list instead of growing the arena.
    s.add_element(1, 7);
    assert_eq!(s.number_not_used(), 9);
    for e in 0..10 {
        s.add_element(1, e);
    }
    assert_eq!(s.number_not_used(), 0);
    assert_eq!(s.iter(1).collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
}

// ── Jacobian patterns ──

fn pattern_pairs(p: &SparsityPattern) -> Vec<(usize, usize)> {
    let mut v: Vec<_> = p.iter().collect();
    v.sort_unstable();
    v.dedup();
    v
}

#[test]
fn jacobian_sparsity_forward_and_reverse_agree() {
    // y0 = x0 * x1, y1 = x2, y2 = sin(x1) + x3
    let f = platypus::record(&[1.0_f64, 2.0, 3.0, 4.0], |_, x| {
        vec![x[0] * x[1], x[2], x[1].sin() + x[3]]
    });
    let expected = vec![(0, 0), (0, 1), (1, 2), (2, 1), (2, 3)];
    let fwd = f.jac_sparsity_forward();
    let rev = f.jac_sparsity_reverse();
    assert_eq!(fwd.n_rows(), 3);
    assert_eq!(fwd.n_cols(), 4);
    assert_eq!(pattern_pairs(&fwd), expected);
    assert_eq!(pattern_pairs(&rev), expected);
}

#[test]
fn jacobian_sparsity_sees_through_parameters() {
    // y = 3 * x0 + x1 / 2: parameters contribute no columns.
    let f = platypus::record(&[1.0_f64, 2.0], |_, x| vec![3.0 * x[0] + x[1] / 2.0]);
    let fwd = f.jac_sparsity_forward();
    assert_eq!(pattern_pairs(&fwd), vec![(0, 0), (0, 1)]);
}

#[test]
fn jacobian_sparsity_with_pack_backend() {
    let f = platypus::record(&[1.0_f64, 2.0, 3.0], |_, x| {
        vec![x[0].exp(), x[1] * x[2]]
    });
    let list = f.jac_sparsity_forward();
    let pack = f.jac_sparsity_forward_with::<PackSetVec>();
    assert_eq!(pattern_pairs(&list), pattern_pairs(&pack));
}

// ── Hessian patterns ──

#[test]
fn hessian_sparsity_of_product_and_square() {
    // f = x0 * x1 + x2^2: nonzeros (0,1), (1,0), (2,2).
    let f = platypus::record(&[1.0_f64, 2.0, 3.0], |_, x| {
        vec![x[0] * x[1] + x[2] * x[2]]
    });
    let hes = f.hes_sparsity(&[true]);
    assert_eq!(hes.n_rows(), 3);
    assert_eq!(pattern_pairs(&hes), vec![(0, 1), (1, 0), (2, 2)]);
}

#[test]
fn hessian_sparsity_linear_terms_vanish() {
    // f = 3 x0 + x1 - x2: no second derivatives at all.
    let f = platypus::record(&[1.0_f64, 2.0, 3.0], |_, x| {
        vec![3.0 * x[0] + x[1] - x[2]]
    });
    let hes = f.hes_sparsity(&[true]);
    assert_eq!(hes.nnz(), 0);
}

#[test]
fn hessian_sparsity_of_unary_chain() {
    // f = exp(x0 + x1): dense 2x2 block, x2 untouched.
    let f = platypus::record(&[0.1_f64, 0.2, 0.3], |_, x| vec![(x[0] + x[1]).exp()]);
    let hes = f.hes_sparsity(&[true]);
    assert_eq!(pattern_pairs(&hes), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
}

#[test]
fn hessian_sparsity_of_division() {
    // f = x0 / x1: couplings (0,1), (1,0), (1,1).
    let f = platypus::record(&[1.0_f64, 2.0], |_, x| vec![x[0] / x[1]]);
    let hes = f.hes_sparsity(&[true]);
    assert_eq!(pattern_pairs(&hes), vec![(0, 1), (1, 0), (1, 1)]);
}

#[test]
fn hessian_sparsity_respects_output_selection() {
    // y0 = x0^2 (nonlinear), y1 = x1 (linear).
    let f = platypus::record(&[1.0_f64, 2.0], |_, x| vec![x[0] * x[0], x[1]]);
    let both = f.hes_sparsity(&[true, true]);
    assert_eq!(pattern_pairs(&both), vec![(0, 0)]);
    let second_only = f.hes_sparsity(&[false, true]);
    assert_eq!(second_only.nnz(), 0);
}
