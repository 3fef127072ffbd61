//! Unlock state resolution.
//!
//! [`resolve`] is pure: given a scope, an optional caller override and the
//! store, it returns the effective boolean. [`UnlockLatch`] adds the
//! per-mount monotonicity that observers layer on top of it.

use crate::scope::Scope;
use crate::store::UnlockStore;

/// Compute whether `scope` is unlocked.
///
/// - An explicit override wins unconditionally, in both directions.
/// - An isolated named scope reads only its own flag.
/// - Any other scope is unlocked if any of its read keys is set.
/// - Flags never written read as `false`.
pub fn resolve<S>(scope: &Scope, override_state: Option<bool>, store: &S) -> bool
where
    S: UnlockStore + ?Sized,
{
    if let Some(forced) = override_state {
        return forced;
    }
    if !store.is_available() {
        return false;
    }
    scope.read_keys().iter().any(|key| store.get(key))
}

/// One-way latch over resolved values.
///
/// Once `true` has been observed it keeps reporting `true`, so a stale read
/// racing a fresh one can never flip a mount back to locked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnlockLatch {
    unlocked: bool,
}

impl UnlockLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a freshly resolved value; returns the latched value.
    pub fn observe(&mut self, resolved: bool) -> bool {
        self.unlocked |= resolved;
        self.unlocked
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }
}
