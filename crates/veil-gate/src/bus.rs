//! In-page unlock event bus.
//!
//! One bus per context. Storage-change notifications never reach the
//! context that wrote, so same-context observers learn about unlocks here.

use tokio::sync::broadcast;
use tracing::debug;
use veil_core::{signal, Scope, ScopeId};

/// Buffered signals per subscriber. A lagging subscriber re-resolves anyway.
const BUS_CAPACITY: usize = 64;

/// Signals carried on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Something was unlocked.
    Unlocked,
    /// A specific named scope was unlocked.
    ScopeUnlocked(ScopeId),
    /// The context became interactive; storage is now readable.
    Interactive,
}

impl Signal {
    /// Event name as seen by browser listeners.
    pub fn name(&self) -> String {
        match self {
            Signal::Unlocked => signal::UNLOCKED.to_string(),
            Signal::ScopeUnlocked(id) => signal::scoped(id),
            Signal::Interactive => signal::INTERACTIVE.to_string(),
        }
    }
}

/// Which unlock signals a subscriber reacts to. `Interactive` always counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    /// Every unlock.
    All,
    /// Only unlocks of one named scope.
    Scope(ScopeId),
}

impl Interest {
    /// The narrowest interest that still sees every unlock able to change
    /// `scope`. Isolated scopes can only be opened by their own flag.
    pub fn for_scope(scope: &Scope) -> Self {
        match scope {
            Scope::Named { id, isolated: true } => Interest::Scope(id.clone()),
            _ => Interest::All,
        }
    }

    pub fn matches(&self, signal: &Signal) -> bool {
        match (self, signal) {
            (_, Signal::Interactive) => true,
            (Interest::All, Signal::Unlocked) => true,
            (Interest::All, Signal::ScopeUnlocked(_)) => false,
            (Interest::Scope(_), Signal::Unlocked) => false,
            (Interest::Scope(want), Signal::ScopeUnlocked(id)) => want == id,
        }
    }
}

/// Broadcast bus for one context.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Signal>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Emit a signal; returns how many subscribers were listening.
    pub fn emit(&self, signal: Signal) -> usize {
        debug!(signal = %signal.name(), "emit");
        // No listeners is fine: nothing is mounted yet.
        self.tx.send(signal).unwrap_or(0)
    }

    pub fn subscribe(&self, interest: Interest) -> BusSubscription {
        BusSubscription {
            rx: self.tx.subscribe(),
            interest,
        }
    }

    /// Live subscriptions. Used to detect leaked listeners.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A filtered subscription to an [`EventBus`].
#[derive(Debug)]
pub struct BusSubscription {
    rx: broadcast::Receiver<Signal>,
    interest: Interest,
}

impl BusSubscription {
    /// Wait for the next relevant signal.
    ///
    /// Lagging yields [`Signal::Unlocked`]: some signals were dropped, so
    /// the caller should re-check. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Signal> {
        loop {
            match self.rx.recv().await {
                Ok(signal) if self.interest.matches(&signal) => return Some(signal),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "bus subscriber lagged");
                    return Some(Signal::Unlocked);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
