//! Atomic functions: opaque user operations that participate in recording,
//! Taylor sweeps, and sparsity analysis through their own callbacks.
//!
//! An implementation of [`Atomic`] is registered with a [`Recorder`] and
//! invoked through [`Recorder::call`]; the registration returns a stable
//! [`AtomicId`] that the tape stores. The registry travels with the sealed
//! [`Function`], and a registered implementation can be deleted while tapes
//! still reference its id — any later sweep over such a tape aborts with a
//! named error instead of dereferencing a dead callback.
//!
//! [`Recorder`]: crate::recorder::Recorder
//! [`Recorder::call`]: crate::recorder::Recorder::call
//! [`Function`]: crate::function::Function

use crate::float::Float;

/// Classification of a tape quantity at recording time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Fixed at recording time.
    Constant,
    /// A dynamic parameter; changes via `new_dynamic` without re-recording.
    Dynamic,
    /// A tape variable.
    Variable,
}

/// Callback interface for an atomic function `y = g(x)`.
///
/// Taylor buffers are row-major: argument (or result) ordinal first, then
/// coefficient order. `forward` sees `order_up + 1` coefficients per row;
/// `reverse` sees `order_up` coefficients per row. Each capability may
/// decline by returning `false` or `None`; the dispatching sweep reports
/// that as a fatal error carrying the registered name.
pub trait Atomic<F: Float> {
    /// Registered name, used in error messages and diagnostics.
    fn name(&self) -> &str;

    /// Classify each result given the classification of each argument.
    /// The returned length fixes the number of results.
    fn for_type(&self, type_x: &[ValueType]) -> Vec<ValueType>;

    /// Compute result Taylor coefficients for orders `order_low..=order_up`.
    ///
    /// `parameter_x[i]` is the value of argument `i` when it is a parameter
    /// (its current order-0 value otherwise). Rows `0..order_low` of
    /// `taylor_y` may already be filled from earlier sweeps and must be
    /// preserved. Return `false` to decline the requested orders.
    fn forward(
        &self,
        parameter_x: &[F],
        type_x: &[ValueType],
        order_low: usize,
        order_up: usize,
        taylor_x: &[F],
        taylor_y: &mut [F],
    ) -> bool;

    /// Fold result-coefficient adjoints `partial_y` into argument-coefficient
    /// adjoints `partial_x` (accumulate, do not overwrite). Coefficient rows
    /// cover orders `0..order_up`. Return `false` to decline.
    fn reverse(
        &self,
        order_up: usize,
        taylor_x: &[F],
        taylor_y: &[F],
        partial_y: &[F],
        partial_x: &mut [F],
    ) -> bool {
        let _ = (order_up, taylor_x, taylor_y, partial_y, partial_x);
        false
    }

    /// Jacobian dependency pairs `(result ordinal, argument ordinal)` in the
    /// call's local coordinates. `None` declines.
    fn jac_sparsity(&self, n_arg: usize) -> Option<Vec<(usize, usize)>> {
        let _ = n_arg;
        None
    }

    /// Hessian coupling pairs `(argument ordinal, argument ordinal)` whose
    /// mixed second derivative is nonzero for some result. Include `(i, i)`
    /// for arguments entering nonlinearly on their own. `None` declines.
    fn hes_sparsity(&self, n_arg: usize) -> Option<Vec<(usize, usize)>> {
        let _ = n_arg;
        None
    }
}

/// Stable handle for a registered atomic function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomicId(pub(crate) u32);

enum Slot<F: Float> {
    Active {
        name: String,
        imp: Box<dyn Atomic<F> + Send>,
    },
    /// Deleted while possibly still referenced by a tape. The name survives
    /// so the error can say which function is gone.
    Absent { name: String },
}

/// Registry mapping [`AtomicId`]s to callback objects.
pub struct AtomicRegistry<F: Float> {
    slots: Vec<Slot<F>>,
}

impl<F: Float> Default for AtomicRegistry<F> {
    fn default() -> Self {
        AtomicRegistry { slots: Vec::new() }
    }
}

impl<F: Float> AtomicRegistry<F> {
    /// Register a callback object; the returned id is stable for the life of
    /// the registry.
    pub fn register(&mut self, imp: Box<dyn Atomic<F> + Send>) -> AtomicId {
        let id = AtomicId(self.slots.len() as u32);
        let name = imp.name().to_string();
        self.slots.push(Slot::Active { name, imp });
        id
    }

    /// Delete a registered callback. Tapes referencing `id` stay valid until
    /// the next sweep touches the call, which then aborts with a named error.
    pub fn delete(&mut self, id: AtomicId) {
        let slot = &mut self.slots[id.0 as usize];
        let name = match slot {
            Slot::Active { name, .. } | Slot::Absent { name } => name.clone(),
        };
        *slot = Slot::Absent { name };
    }

    /// Registered name for `id`, whether or not the callback still exists.
    pub fn name(&self, id: AtomicId) -> &str {
        match &self.slots[id.0 as usize] {
            Slot::Active { name, .. } | Slot::Absent { name } => name,
        }
    }

    /// Look up the callback for `id`.
    ///
    /// # Panics
    /// If the callback was deleted.
    pub fn fetch(&self, id: AtomicId) -> &dyn Atomic<F> {
        match &self.slots[id.0 as usize] {
            Slot::Active { imp, .. } => imp.as_ref(),
            Slot::Absent { name } => {
                panic!("atomic function '{}' has been deleted", name)
            }
        }
    }

    /// Number of slots ever registered, deleted ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if nothing was ever registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
