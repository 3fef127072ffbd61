//! Scope catalog: which scopes exist, how they are isolated, and the
//! secret each one is opened with.
//!
//! The catalog is a JSON document:
//!
//! ```json
//! {
//!   "global_secret": "open sesame",
//!   "scopes": [
//!     { "id": "nimbus" },
//!     { "id": "iq-plugin", "isolated": true, "secret": "iq", "prompt": "Enter the IQ password" }
//!   ]
//! }
//! ```
//!
//! Unknown scope ids resolve to shared (non-isolated) named scopes.

use crate::error::{Error, Result};
use crate::scope::{Scope, ScopeId, WriteMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Prompt shown when a scope does not configure its own.
pub const DEFAULT_PROMPT: &str = "This content is password protected.";

/// Environment variable naming a catalog file.
pub const CATALOG_ENV: &str = "VEIL_CATALOG";

/// One named scope in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeEntry {
    pub id: ScopeId,

    /// Ignore the global flag entirely.
    #[serde(default)]
    pub isolated: bool,

    /// Secret for this scope. Shared scopes fall back to the global secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Unlock prompt shown with the obscured content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Flags written when this scope's gate is opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_mode: Option<WriteMode>,
}

impl ScopeEntry {
    pub fn scope(&self) -> Scope {
        Scope::Named {
            id: self.id.clone(),
            isolated: self.isolated,
        }
    }
}

/// Catalog of gated scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCatalog {
    /// Secret for the global scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_secret: Option<String>,

    #[serde(default)]
    pub scopes: Vec<ScopeEntry>,
}

impl ScopeCatalog {
    /// Parse a catalog from JSON, rejecting duplicate scope ids.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: ScopeCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the catalog named by `VEIL_CATALOG`, or an empty catalog if the
    /// variable is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CATALOG_ENV) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.scopes {
            if entry.id.as_str().is_empty() {
                return Err(Error::Config("scope id must not be empty".into()));
            }
            if !seen.insert(&entry.id) {
                return Err(Error::Config(format!("duplicate scope id: {}", entry.id)));
            }
        }
        Ok(())
    }

    /// Add or replace an entry.
    pub fn with_scope(mut self, entry: ScopeEntry) -> Self {
        self.scopes.retain(|e| e.id != entry.id);
        self.scopes.push(entry);
        self
    }

    pub fn entry(&self, id: &ScopeId) -> Option<&ScopeEntry> {
        self.scopes.iter().find(|e| &e.id == id)
    }

    /// Scope descriptor for an id. Unknown ids are shared named scopes.
    pub fn scope(&self, id: &str) -> Scope {
        let id = ScopeId::new(id);
        match self.entry(&id) {
            Some(entry) => entry.scope(),
            None => Scope::named(id),
        }
    }

    /// Secret that opens `scope`.
    ///
    /// Isolated scopes only accept their own secret; shared scopes fall back
    /// to the global one.
    pub fn secret_for(&self, scope: &Scope) -> Option<&str> {
        match scope {
            Scope::Global => self.global_secret.as_deref(),
            Scope::Named { id, isolated } => {
                let own = self.entry(id).and_then(|e| e.secret.as_deref());
                if own.is_some() || *isolated {
                    own
                } else {
                    self.global_secret.as_deref()
                }
            }
        }
    }

    /// Flags written when `scope` is opened through its own gate.
    ///
    /// Isolated scopes default to writing only their own flag; shared scopes
    /// default to also setting the global flag.
    pub fn write_mode_for(&self, scope: &Scope) -> WriteMode {
        match scope {
            Scope::Global => WriteMode::NamedAndGlobal,
            Scope::Named { id, isolated } => self
                .entry(id)
                .and_then(|e| e.write_mode)
                .unwrap_or(if *isolated {
                    WriteMode::NamedOnly
                } else {
                    WriteMode::NamedAndGlobal
                }),
        }
    }

    /// Unlock prompt for `scope`.
    pub fn prompt_for(&self, scope: &Scope) -> String {
        scope
            .id()
            .and_then(|id| self.entry(id))
            .and_then(|e| e.prompt.clone())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
    }
}
