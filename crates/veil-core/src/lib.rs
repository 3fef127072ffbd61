//! Veil Core - Unlock State for Gated Content
//!
//! Case-study pages mix public and password-gated material. This crate holds
//! the synchronous, runtime-free half of deciding whether a gated element
//! renders locked or unlocked:
//!
//! - **Scopes**: the global flag, named scopes and isolated named scopes,
//!   and the storage keys each one reads and writes
//! - **Store**: the [`UnlockStore`] trait over session-scoped storage, with
//!   an in-memory implementation
//! - **Resolver**: the pure [`resolve`] rule and the per-mount
//!   [`UnlockLatch`]
//! - **Credentials**: case- and whitespace-insensitive [`verify`]
//! - **Catalog/Config**: which scopes exist, their secrets, poll interval
//!
//! This is a UI-consistency mechanism, not a security boundary.
//!
//! # Example
//!
//! ```
//! use veil_core::{resolve, MemoryStore, Scope, StorageKey, UnlockStore};
//!
//! let store = MemoryStore::new();
//! assert!(!resolve(&Scope::named("nimbus"), None, &store));
//!
//! store.set(&StorageKey::global()).unwrap();
//! assert!(resolve(&Scope::named("nimbus"), None, &store));
//! assert!(!resolve(&Scope::isolated("iq-plugin"), None, &store));
//! ```

pub mod catalog;
pub mod config;
pub mod credential;
pub mod error;
pub mod resolver;
pub mod scope;
pub mod signal;
pub mod store;

pub use catalog::{ScopeCatalog, ScopeEntry};
pub use config::GateConfig;
pub use credential::{normalize, verify, Rejection, UnlockRequest};
pub use error::{Error, Result};
pub use resolver::{resolve, UnlockLatch};
pub use scope::{Scope, ScopeId, StorageKey, WriteMode};
pub use store::{MemoryStore, UnlockStore};
