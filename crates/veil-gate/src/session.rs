//! Sessions and contexts.
//!
//! A [`Session`] is one browser session: the shared unlock store plus the
//! native storage-change channel. A [`Context`] is one tab inside it, with
//! its own in-page [`EventBus`].
//!
//! ```text
//!              Session (store + storage-change channel)
//!             /                |                    \
//!       Context A         Context B             Context C
//!       bus ── gates      bus ── gates          bus ── gates
//! ```
//!
//! A write in A reaches A's gates through A's bus and the gates of B and C
//! through the storage-change channel. Polling covers anything missed.

use crate::bus::{EventBus, Signal};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use veil_core::{
    resolve, MemoryStore, Result, Scope, ScopeCatalog, StorageKey, UnlockStore, WriteMode,
};

const CHANGE_CAPACITY: usize = 64;

/// Identifies a context within its session.
pub type ContextId = u64;

/// Native storage-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: StorageKey,
    /// Context that wrote. Never delivered back to it.
    pub origin: ContextId,
}

/// Shared store handle.
pub type SharedStore = Arc<dyn UnlockStore + Send + Sync>;

/// One browser session.
pub struct Session {
    store: SharedStore,
    catalog: Arc<ScopeCatalog>,
    changes: broadcast::Sender<StorageChange>,
    native_events: AtomicBool,
    next_context: AtomicU64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("catalog", &self.catalog)
            .field("native_events", &self.native_events.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: SharedStore, catalog: ScopeCatalog) -> Arc<Self> {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Arc::new(Self {
            store,
            catalog: Arc::new(catalog),
            changes,
            native_events: AtomicBool::new(true),
            next_context: AtomicU64::new(0),
        })
    }

    /// Session backed by a fresh [`MemoryStore`].
    pub fn in_memory(catalog: ScopeCatalog) -> Arc<Self> {
        Self::new(Arc::new(MemoryStore::new()), catalog)
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn catalog(&self) -> &ScopeCatalog {
        &self.catalog
    }

    /// Open a new context (tab). A context that is not yet interactive
    /// reads every flag as absent until [`Context::become_interactive`].
    pub fn open_context(self: &Arc<Self>, interactive: bool) -> Context {
        let id = self.next_context.fetch_add(1, Ordering::SeqCst);
        debug!(context = id, interactive, "open context");
        Context {
            inner: Arc::new(ContextInner {
                id,
                session: Arc::clone(self),
                bus: EventBus::new(),
                interactive: AtomicBool::new(interactive),
                live_gates: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Enable or disable native storage-change delivery. Disabled delivery
    /// leaves polling as the only cross-context channel.
    pub fn set_native_events(&self, enabled: bool) {
        self.native_events.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn subscribe_changes(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    /// Live storage-change listeners across all contexts.
    pub fn change_listeners(&self) -> usize {
        self.changes.receiver_count()
    }

    fn publish_change(&self, key: StorageKey, origin: ContextId) {
        if !self.native_events.load(Ordering::SeqCst) {
            debug!(%key, origin, "native storage event suppressed");
            return;
        }
        let _ = self.changes.send(StorageChange { key, origin });
    }
}

struct ContextInner {
    id: ContextId,
    session: Arc<Session>,
    bus: EventBus,
    interactive: AtomicBool,
    live_gates: Arc<AtomicUsize>,
}

/// One execution context (tab). Cheap to clone.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("interactive", &self.is_interactive())
            .field("live_gates", &self.live_gates())
            .finish()
    }
}

impl Context {
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn is_interactive(&self) -> bool {
        self.inner.interactive.load(Ordering::SeqCst)
    }

    /// Mark the context interactive and ask every mounted gate to re-read
    /// storage.
    pub fn become_interactive(&self) {
        if !self.inner.interactive.swap(true, Ordering::SeqCst) {
            debug!(context = self.id(), "context interactive");
            self.inner.bus.emit(Signal::Interactive);
        }
    }

    /// Resolve `scope` against storage as this context currently sees it.
    pub fn resolve(&self, scope: &Scope, override_state: Option<bool>) -> bool {
        if override_state.is_none() && !self.is_interactive() {
            return false;
        }
        resolve(scope, override_state, &self.inner.session.store)
    }

    /// Unlock `scope`, writing only its own flag.
    pub fn write_named_only(&self, scope: &Scope) -> Result<()> {
        self.write(scope, WriteMode::NamedOnly)
    }

    /// Unlock `scope`, writing its own flag and the global flag.
    pub fn write_named_and_global(&self, scope: &Scope) -> Result<()> {
        self.write(scope, WriteMode::NamedAndGlobal)
    }

    /// Persist the flags for `scope` and notify every observer.
    ///
    /// Stops at the first failed write; flags already written are still
    /// announced.
    pub fn write(&self, scope: &Scope, mode: WriteMode) -> Result<()> {
        let mut written = Vec::new();
        let mut outcome = Ok(());
        for key in scope.write_keys(mode) {
            if let Err(e) = self.inner.session.store.set(&key) {
                outcome = Err(e);
                break;
            }
            written.push(key);
        }
        if !written.is_empty() {
            info!(context = self.id(), %scope, ?mode, "unlocked");
            self.notify(scope, written);
        }
        outcome
    }

    /// Fan a write out to both channels: other contexts through the
    /// storage-change channel, this context through its bus.
    fn notify(&self, scope: &Scope, keys: Vec<StorageKey>) {
        for key in keys {
            self.inner.session.publish_change(key, self.id());
        }
        self.inner.bus.emit(Signal::Unlocked);
        if let Some(id) = scope.id() {
            self.inner.bus.emit(Signal::ScopeUnlocked(id.clone()));
        }
    }

    /// Gates currently mounted in this context.
    pub fn live_gates(&self) -> usize {
        self.inner.live_gates.load(Ordering::SeqCst)
    }

    pub(crate) fn live_guard(&self) -> LiveGuard {
        LiveGuard::new(Arc::clone(&self.inner.live_gates))
    }
}

/// Counts a mounted gate for as long as it lives.
pub(crate) struct LiveGuard {
    counter: Arc<AtomicUsize>,
}

impl LiveGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Interest;

    fn session() -> Arc<Session> {
        Session::in_memory(ScopeCatalog::default())
    }

    #[test]
    fn contexts_get_distinct_ids() {
        let session = session();
        let a = session.open_context(true);
        let b = session.open_context(true);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn pre_interactive_context_reads_locked() {
        let session = session();
        session.store().set(&StorageKey::global()).unwrap();

        let ctx = session.open_context(false);
        assert!(!ctx.resolve(&Scope::global(), None));
        assert!(ctx.resolve(&Scope::global(), Some(true)));

        ctx.become_interactive();
        assert!(ctx.resolve(&Scope::global(), None));
    }

    #[test]
    fn write_modes_touch_expected_flags() {
        let session = session();
        let ctx = session.open_context(true);
        let iq = Scope::isolated("iq-plugin");

        ctx.write_named_only(&iq).unwrap();
        assert!(ctx.resolve(&iq, None));
        assert!(!ctx.resolve(&Scope::global(), None));

        ctx.write_named_and_global(&iq).unwrap();
        assert!(ctx.resolve(&Scope::global(), None));
        assert!(ctx.resolve(&Scope::named("nimbus"), None));
    }

    #[tokio::test]
    async fn write_notifies_own_bus_and_other_contexts() {
        let session = session();
        let a = session.open_context(true);
        let b = session.open_context(true);

        let mut a_bus = a.bus().subscribe(Interest::Scope("nimbus".into()));
        let mut changes = session.subscribe_changes();

        a.write_named_only(&Scope::named("nimbus")).unwrap();

        assert_eq!(
            a_bus.recv().await,
            Some(Signal::ScopeUnlocked("nimbus".into()))
        );
        let change = changes.recv().await.unwrap();
        assert_eq!(change.origin, a.id());
        assert_ne!(change.origin, b.id());
        assert_eq!(change.key, StorageKey::named(&"nimbus".into()));
    }

    #[test]
    fn suppressed_native_events_still_persist() {
        let session = session();
        session.set_native_events(false);
        let mut changes = session.subscribe_changes();
        let ctx = session.open_context(true);

        ctx.write_named_and_global(&Scope::global()).unwrap();
        assert!(changes.try_recv().is_err());
        assert!(session.store().get(&StorageKey::global()));
    }

    #[test]
    fn failed_write_is_reported_and_not_announced() {
        let session = Session::new(Arc::new(MemoryStore::unavailable()), ScopeCatalog::default());
        let ctx = session.open_context(true);
        let mut changes = session.subscribe_changes();

        assert!(ctx.write_named_only(&Scope::named("nimbus")).is_err());
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn live_guard_counts() {
        let ctx = session().open_context(true);
        let first = ctx.live_guard();
        let second = ctx.live_guard();
        assert_eq!(ctx.live_gates(), 2);
        drop(first);
        drop(second);
        assert_eq!(ctx.live_gates(), 0);
    }
}
