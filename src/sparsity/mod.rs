//! Sparsity patterns and the vector-of-sets representations that the
//! sparsity sweeps propagate.
//!
//! A vector of sets holds `n_set` sets of indices drawn from `0..end`. The
//! sweeps only touch sets through the [`SetVec`] trait, so the backing
//! representation can be swapped: [`ListSetVec`] shares equal sets through
//! reference-counted linked lists, [`PackSetVec`] packs each set into a bit
//! vector.

mod list_setvec;
mod pack_setvec;
mod sweep;

pub use list_setvec::{ListSetVec, ListSetVecIter};
pub use pack_setvec::{PackSetVec, PackSetVecIter};

/// A vector of sets of indices in `0..end`.
///
/// `post_element` defers an insertion: posted elements are invisible until
/// `process_post` folds them in, which lets a sweep batch insertions into a
/// set that other sets currently share. `assignment` (same-object) may share
/// representation between target and source; a shared set must be privately
/// copied before any mutation of either alias (copy-on-write).
pub trait SetVec: Sized {
    type Iter<'a>: Iterator<Item = usize>
    where
        Self: 'a;

    /// A fresh vector of `n_set` empty sets over `0..end`.
    fn with_sets(n_set: usize, end: usize) -> Self;

    /// Drop all sets and start over with `n_set` empty sets over `0..end`.
    fn resize(&mut self, n_set: usize, end: usize);

    fn n_set(&self) -> usize;

    fn end(&self) -> usize;

    /// Make set `i` empty.
    fn clear(&mut self, i: usize);

    /// Insert `e` into set `i`.
    fn add_element(&mut self, i: usize, e: usize);

    /// Defer insertion of `e` into set `i` until `process_post(i)`.
    fn post_element(&mut self, i: usize, e: usize);

    /// Fold all posted elements into set `i`.
    fn process_post(&mut self, i: usize);

    fn is_element(&self, i: usize, e: usize) -> bool;

    fn number_elements(&self, i: usize) -> usize;

    /// `self[target] = self[source]`; may share representation.
    fn assignment(&mut self, target: usize, source: usize);

    /// `self[target] = other[source]` (deep copy).
    fn assign_from(&mut self, target: usize, other: &Self, source: usize);

    /// `self[target] = self[left] ∪ self[right]`.
    fn binary_union(&mut self, target: usize, left: usize, right: usize);

    /// `self[target] = self[left] ∪ other[right]`.
    fn union_from(&mut self, target: usize, left: usize, other: &Self, right: usize);

    /// `self[target] = self[left] ∩ self[right]`.
    fn binary_intersection(&mut self, target: usize, left: usize, right: usize);

    /// Iterate set `i` in increasing order.
    fn iter(&self, i: usize) -> Self::Iter<'_>;
}

/// Jacobian or Hessian sparsity pattern in coordinate form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparsityPattern {
    nr: usize,
    nc: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
}

impl SparsityPattern {
    pub fn new(nr: usize, nc: usize) -> Self {
        SparsityPattern {
            nr,
            nc,
            rows: Vec::new(),
            cols: Vec::new(),
        }
    }

    pub fn add(&mut self, r: usize, c: usize) {
        debug_assert!(r < self.nr && c < self.nc);
        self.rows.push(r);
        self.cols.push(c);
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.nr
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.nc
    }

    /// Number of structurally nonzero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, r: usize, c: usize) -> bool {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .any(|(&ri, &ci)| ri == r && ci == c)
    }

    /// Iterate the `(row, col)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }
}
