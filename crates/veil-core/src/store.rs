//! Persistent unlock store.
//!
//! The store is the only source of truth for unlock state. Flags are
//! monotonic: there is a `set` but no `unset`, so a flag that was observed
//! `true` stays `true` until the session ends.

use crate::error::{Error, Result};
use crate::scope::StorageKey;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Session-scoped storage of unlock flags.
///
/// Implementations must never panic on read: unavailable storage reads as
/// "flag absent".
pub trait UnlockStore {
    /// Read a flag. Absent keys and unavailable storage yield `false`.
    fn get(&self, key: &StorageKey) -> bool;

    /// Set a flag to `true`. Idempotent.
    fn set(&self, key: &StorageKey) -> Result<()>;

    /// Whether the backing storage can currently be read.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: UnlockStore + ?Sized> UnlockStore for &T {
    fn get(&self, key: &StorageKey) -> bool {
        (**self).get(key)
    }

    fn set(&self, key: &StorageKey) -> Result<()> {
        (**self).set(key)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<T: UnlockStore + ?Sized> UnlockStore for Arc<T> {
    fn get(&self, key: &StorageKey) -> bool {
        (**self).get(key)
    }

    fn set(&self, key: &StorageKey) -> Result<()> {
        (**self).set(key)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// In-memory store, used in tests and native simulations in place of
/// browser session storage.
#[derive(Debug)]
pub struct MemoryStore {
    flags: RwLock<BTreeSet<StorageKey>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self {
            flags: RwLock::new(BTreeSet::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Create a store that behaves like storage before the page is
    /// interactive: reads yield `false`, writes fail.
    pub fn unavailable() -> Self {
        Self {
            flags: RwLock::new(BTreeSet::new()),
            available: AtomicBool::new(false),
        }
    }

    /// Make the store readable and writable.
    pub fn make_available(&self) {
        self.available.store(true, Ordering::SeqCst);
    }

    /// Load a flag persisted earlier in the session, regardless of
    /// availability. Models state left behind by a previous page.
    pub fn restore(&self, key: StorageKey) {
        if let Ok(mut flags) = self.flags.write() {
            flags.insert(key);
        }
    }

    /// Number of flags set.
    pub fn len(&self) -> usize {
        self.flags.read().map(|flags| flags.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys currently set.
    pub fn keys(&self) -> Vec<StorageKey> {
        self.flags
            .read()
            .map(|flags| flags.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl UnlockStore for MemoryStore {
    fn get(&self, key: &StorageKey) -> bool {
        if !self.is_available() {
            return false;
        }
        self.flags
            .read()
            .map(|flags| flags.contains(key))
            .unwrap_or(false)
    }

    fn set(&self, key: &StorageKey) -> Result<()> {
        if !self.is_available() {
            return Err(Error::StorageUnavailable);
        }
        let mut flags = self.flags.write().map_err(|_| Error::StorageUnavailable)?;
        flags.insert(key.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
