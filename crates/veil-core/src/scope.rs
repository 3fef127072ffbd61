//! Scopes and the storage keys derived from them.
//!
//! A scope partitions gated content. The global scope carries one site-wide
//! flag; a named scope (usually a case-study slug) carries its own flag and
//! may additionally honour the global one unless it is isolated.
//!
//! ```text
//! Global                    reads: [veil:unlocked]
//! Named(id)                 reads: [veil:unlocked, veil:unlocked:<id>]
//! Named(id, isolated)       reads: [veil:unlocked:<id>]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the site-wide flag.
pub const GLOBAL_KEY: &str = "veil:unlocked";

/// Identifier of a named scope (a content-collection slug).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ScopeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A storage key under which one unlock flag is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key of the global flag.
    pub fn global() -> Self {
        Self(GLOBAL_KEY.to_string())
    }

    /// Key of a named scope's own flag.
    pub fn named(id: &ScopeId) -> Self {
        Self(format!("{}:{}", GLOBAL_KEY, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_KEY
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which flags an unlock writes.
///
/// Both modes exist because some unlock paths for a named scope deliberately
/// leave the global flag alone while others set it too; the call site
/// decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Write only the named scope's flag.
    NamedOnly,
    /// Write the named scope's flag and the global flag.
    NamedAndGlobal,
}

/// A partition of gated content governed by one unlock flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Site-wide scope.
    Global,
    /// A content collection, optionally isolated from the global flag.
    Named { id: ScopeId, isolated: bool },
}

impl Scope {
    pub fn global() -> Self {
        Scope::Global
    }

    /// A named scope that also honours the global flag.
    pub fn named(id: impl Into<ScopeId>) -> Self {
        Scope::Named {
            id: id.into(),
            isolated: false,
        }
    }

    /// A named scope that ignores the global flag.
    pub fn isolated(id: impl Into<ScopeId>) -> Self {
        Scope::Named {
            id: id.into(),
            isolated: true,
        }
    }

    pub fn id(&self) -> Option<&ScopeId> {
        match self {
            Scope::Global => None,
            Scope::Named { id, .. } => Some(id),
        }
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self, Scope::Named { isolated: true, .. })
    }

    /// Keys whose flags can unlock this scope. Any one of them being set
    /// is sufficient.
    pub fn read_keys(&self) -> Vec<StorageKey> {
        match self {
            Scope::Global => vec![StorageKey::global()],
            Scope::Named { id, isolated: true } => vec![StorageKey::named(id)],
            Scope::Named { id, isolated: false } => {
                vec![StorageKey::global(), StorageKey::named(id)]
            }
        }
    }

    /// Whether a write to `key` can change this scope's resolution.
    pub fn reads(&self, key: &StorageKey) -> bool {
        self.read_keys().iter().any(|k| k == key)
    }

    /// Keys written by an unlock of this scope in the given mode.
    ///
    /// The global scope ignores the mode.
    pub fn write_keys(&self, mode: WriteMode) -> Vec<StorageKey> {
        match (self, mode) {
            (Scope::Global, _) => vec![StorageKey::global()],
            (Scope::Named { id, .. }, WriteMode::NamedOnly) => vec![StorageKey::named(id)],
            (Scope::Named { id, .. }, WriteMode::NamedAndGlobal) => {
                vec![StorageKey::named(id), StorageKey::global()]
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Named { id, isolated: true } => write!(f, "{} (isolated)", id),
            Scope::Named { id, isolated: false } => write!(f, "{}", id),
        }
    }
}
