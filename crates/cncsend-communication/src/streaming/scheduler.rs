//! Tick scheduling
//!
//! The engine is a plain `tick()` state machine. [`TickScheduler`] calls it
//! at a fixed cadence on a tokio interval; tests call `tick()` directly and
//! move a [`ManualClock`] by hand.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// One step of cooperative work
pub trait Tick {
    /// Run one step. Must finish in bounded time.
    fn tick(&mut self);
}

/// Source of the current instant
pub trait Clock: Send {
    /// Now
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Start at the current instant
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// Fixed-cadence driver for a [`Tick`]
#[derive(Debug, Clone, Copy)]
pub struct TickScheduler {
    period: Duration,
}

impl TickScheduler {
    /// Create a scheduler ticking every `period`
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Tick period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick `target` until `shutdown` becomes true or its sender is dropped
    ///
    /// Ticks run back to back on this task, so they never overlap. Late
    /// ticks are skipped rather than bunched up.
    pub async fn run<T: Tick + ?Sized>(&self, target: &mut T, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!("Tick scheduler started ({:?} period)", self.period);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => target.tick(),
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Tick scheduler stopped");
    }
}
