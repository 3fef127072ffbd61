//! Gate controller.
//!
//! Every gated element owns one [`GateController`]. It resolves the
//! element's state synchronously on mount, then keeps it current from three
//! sources: its context's bus, the session's storage-change channel, and a
//! poll timer. Resolution is latched per mount, so the state only ever moves
//! from locked to unlocked unless the caller overrides it.

use crate::bus::{BusSubscription, Interest};
use crate::poll::{PollHandle, PollTimer};
use crate::session::{Context, LiveGuard, StorageChange};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use veil_core::{GateConfig, Rejection, Scope, UnlockLatch, UnlockRequest};

/// A gated content subtree as declared by its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedElement {
    pub scope: Scope,
    /// Force locked or unlocked regardless of storage.
    pub override_state: Option<bool>,
    /// Shown next to the obscured content.
    pub prompt: String,
}

impl GatedElement {
    pub fn new(scope: Scope, prompt: impl Into<String>) -> Self {
        Self {
            scope,
            override_state: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_override(mut self, unlocked: bool) -> Self {
        self.override_state = Some(unlocked);
        self
    }
}

/// What the element should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// Obscured content plus an unlock affordance.
    Locked { prompt: String },
    /// Content unobscured.
    Unlocked,
}

/// State shared between the controller handle and its task.
struct GateCore {
    ctx: Context,
    scope: Scope,
    prompt: String,
    override_state: Mutex<Option<bool>>,
    latch: Mutex<UnlockLatch>,
    state: watch::Sender<bool>,
}

impl GateCore {
    /// Re-resolve from storage and publish the effective state.
    fn refresh(&self) -> bool {
        let observed = self.ctx.resolve(&self.scope, None);
        let latched = self
            .latch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(observed);
        self.publish(latched)
    }

    /// Latch `true` without consulting storage.
    fn unlock_locally(&self) -> bool {
        self.latch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(true);
        self.publish(true)
    }

    fn publish(&self, latched: bool) -> bool {
        let override_state = *self
            .override_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let effective = override_state.unwrap_or(latched);
        let changed = self.state.send_if_modified(|current| {
            if *current == effective {
                false
            } else {
                *current = effective;
                true
            }
        });
        if changed {
            debug!(context = self.ctx.id(), scope = %self.scope, unlocked = effective, "gate changed");
        }
        effective
    }
}

/// Per-element controller. Dropping it unmounts the element and cancels its
/// subscriptions and timer.
pub struct GateController {
    core: Arc<GateCore>,
    poll: PollHandle,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for GateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateController")
            .field("context", &self.core.ctx.id())
            .field("scope", &self.core.scope)
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}

impl GateController {
    /// Mount a gated element in `ctx`.
    ///
    /// The initial state is resolved synchronously; a context that is not
    /// yet interactive starts locked. Must be called within a tokio runtime.
    pub fn mount(ctx: &Context, element: GatedElement, config: &GateConfig) -> Self {
        let GatedElement {
            scope,
            override_state,
            prompt,
        } = element;

        let (state, _) = watch::channel(false);
        let core = Arc::new(GateCore {
            ctx: ctx.clone(),
            scope,
            prompt,
            override_state: Mutex::new(override_state),
            latch: Mutex::new(UnlockLatch::new()),
            state,
        });
        core.refresh();

        let bus = ctx.bus().subscribe(Interest::for_scope(&core.scope));
        let changes = ctx.session().subscribe_changes();
        let (timer, poll) = PollTimer::new(config.poll_interval);
        let guard = ctx.live_guard();

        debug!(context = ctx.id(), scope = %core.scope, "gate mounted");
        let task = tokio::spawn(run(Arc::clone(&core), bus, changes, timer, guard));

        Self { core, poll, task }
    }

    pub fn scope(&self) -> &Scope {
        &self.core.scope
    }

    pub fn is_unlocked(&self) -> bool {
        *self.core.state.borrow()
    }

    pub fn view(&self) -> GateView {
        if self.is_unlocked() {
            GateView::Unlocked
        } else {
            GateView::Locked {
                prompt: self.core.prompt.clone(),
            }
        }
    }

    /// Receive every change of the effective state.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.core.state.subscribe()
    }

    /// Replace the caller override and re-resolve.
    pub fn set_override(&self, override_state: Option<bool>) -> bool {
        *self
            .core
            .override_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = override_state;
        self.core.refresh()
    }

    /// Re-resolve now, on the caller's stack.
    pub fn refresh(&self) -> bool {
        self.core.refresh()
    }

    /// Ask the gate task to run a poll tick without waiting for the timer.
    pub fn force_tick(&self) {
        self.poll.force_tick();
    }

    /// Attempt to unlock with submitted text.
    ///
    /// On success the scope's flags are written and announced, and this gate
    /// flips to unlocked immediately. A failed write is logged; the local
    /// flip still happens.
    pub fn submit(&self, submitted: &str) -> Result<(), Rejection> {
        let scope = &self.core.scope;
        let catalog = self.core.ctx.session().catalog();

        UnlockRequest::new(scope.clone(), submitted).check(catalog.secret_for(scope))?;

        let mode = catalog.write_mode_for(scope);
        if let Err(e) = self.core.ctx.write(scope, mode) {
            warn!(scope = %scope, "failed to persist unlock: {}", e);
        }
        self.core.unlock_locally();
        Ok(())
    }

    /// Unmount explicitly. Equivalent to dropping.
    pub fn unmount(self) {}
}

impl Drop for GateController {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    core: Arc<GateCore>,
    mut bus: BusSubscription,
    mut changes: broadcast::Receiver<StorageChange>,
    mut timer: PollTimer,
    _guard: LiveGuard,
) {
    let own = core.ctx.id();
    loop {
        tokio::select! {
            signal = bus.recv() => match signal {
                Some(signal) => {
                    debug!(context = own, scope = %core.scope, signal = %signal.name(), "bus signal");
                    core.refresh();
                }
                None => break,
            },
            change = changes.recv() => match change {
                Ok(change) if change.origin != own && core.scope.reads(&change.key) => {
                    debug!(context = own, scope = %core.scope, key = %change.key, "storage change");
                    core.refresh();
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    core.refresh();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = timer.tick() => {
                core.refresh();
            }
        }
    }
}
