//! Veil Gate - Unlock State Synchronization
//!
//! Keeps dozens of independently mounted gated elements agreeing on one
//! boolean per scope, within a tab and across tabs, with no central runtime
//! store. The session's [`UnlockStore`](veil_core::UnlockStore) is the only
//! source of truth; every [`GateController`] holds a cached copy reconciled
//! from three channels:
//!
//! - **Event bus**: in-page signals, immediate, same context only
//! - **Storage changes**: native notifications, other contexts only
//! - **Polling**: coarse fallback bounding convergence time
//!
//! Everything runs cooperatively on one thread per context; controllers are
//! tokio tasks torn down when their handle drops.
//!
//! # Example
//!
//! ```no_run
//! use veil_core::{GateConfig, Scope, ScopeCatalog};
//! use veil_gate::{GateController, GatedElement, Session};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = ScopeCatalog::from_json(r#"{ "global_secret": "open sesame" }"#)?;
//!     let session = Session::in_memory(catalog);
//!     let tab = session.open_context(true);
//!
//!     let gate = GateController::mount(
//!         &tab,
//!         GatedElement::new(Scope::named("nimbus"), "Enter the password"),
//!         &GateConfig::default(),
//!     );
//!     gate.submit("Open Sesame")?;
//!     assert!(gate.is_unlocked());
//!     Ok(())
//! }
//! ```

pub mod bus;
pub mod gate;
pub mod poll;
pub mod session;

pub use bus::{EventBus, Interest, Signal};
pub use gate::{GateController, GateView, GatedElement};
pub use poll::{PollHandle, PollTimer};
pub use session::{Context, ContextId, Session, StorageChange};
