//! Poll fallback timer.
//!
//! A coarse recurring re-check that bounds how long a missed notification
//! can delay convergence. Ticks can also be forced through a [`PollHandle`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Recurring timer owned by one gate task. Dropping it cancels it.
#[derive(Debug)]
pub struct PollTimer {
    interval: Interval,
    forced: Arc<Notify>,
}

/// Forces an immediate tick of a [`PollTimer`].
#[derive(Debug, Clone)]
pub struct PollHandle {
    forced: Arc<Notify>,
}

impl PollHandle {
    pub fn force_tick(&self) {
        self.forced.notify_one();
    }
}

/// Why the timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Scheduled,
    Forced,
}

impl PollTimer {
    /// Create a timer with the given period. The first scheduled tick
    /// completes immediately and serves as the post-mount corrective read.
    ///
    /// Must be called within a tokio runtime. `period` must be non-zero.
    pub fn new(period: Duration) -> (Self, PollHandle) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let forced = Arc::new(Notify::new());
        let handle = PollHandle {
            forced: Arc::clone(&forced),
        };
        (Self { interval, forced }, handle)
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    pub async fn tick(&mut self) -> Tick {
        tokio::select! {
            _ = self.interval.tick() => Tick::Scheduled,
            _ = self.forced.notified() => Tick::Forced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_on_schedule() {
        let (mut timer, _handle) = PollTimer::new(Duration::from_millis(1500));
        assert_eq!(timer.period(), Duration::from_millis(1500));

        let start = time::Instant::now();
        assert_eq!(timer.tick().await, Tick::Scheduled);
        assert_eq!(timer.tick().await, Tick::Scheduled);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn forced_tick_does_not_wait() {
        let (mut timer, handle) = PollTimer::new(Duration::from_secs(3600));
        timer.tick().await;

        let start = time::Instant::now();
        handle.force_tick();
        assert_eq!(timer.tick().await, Tick::Forced);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
