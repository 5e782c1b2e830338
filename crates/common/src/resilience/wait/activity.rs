//! In-flight activity tracking for quiet-period waits.
//!
//! An [`ActivityMonitor`] is fed by whatever observes outgoing requests (a
//! network hook in the browser layer, for instance) and answers one question:
//! has nothing been in flight, and nothing started or finished, for at least
//! a given period?

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct ActivityState {
    origin: Instant,
    in_flight: AtomicUsize,
    /// Nanoseconds since `origin` of the last start or finish
    last_activity: AtomicU64,
}

/// Cloneable handle to shared activity counters.
#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    state: Arc<ActivityState>,
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityMonitor {
    /// New monitor; creation counts as the last activity
    pub fn new() -> Self {
        Self {
            state: Arc::new(ActivityState {
                origin: Instant::now(),
                in_flight: AtomicUsize::new(0),
                last_activity: AtomicU64::new(0),
            }),
        }
    }

    /// Record that an operation started
    pub fn started(&self) {
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
    }

    /// Record that an operation finished. Extra calls never drive the count
    /// below zero.
    pub fn finished(&self) {
        let _ = self.state.in_flight.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            Some(n.saturating_sub(1))
        });
        self.touch();
    }

    /// Record a start now and the matching finish when the guard drops
    pub fn track(&self) -> ActivityGuard {
        self.started();
        ActivityGuard { monitor: self.clone() }
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Time since the last start or finish
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_nanos(self.state.last_activity.load(Ordering::SeqCst));
        self.state.origin.elapsed().saturating_sub(last)
    }

    /// Nothing in flight and no activity for at least `quiet_period`
    pub fn is_quiet(&self, quiet_period: Duration) -> bool {
        self.in_flight() == 0 && self.idle_for() >= quiet_period
    }

    fn touch(&self) {
        let now = u64::try_from(self.state.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.state.last_activity.fetch_max(now, Ordering::SeqCst);
    }
}

/// Marks one in-flight operation; finishes it on drop.
#[derive(Debug)]
pub struct ActivityGuard {
    monitor: ActivityMonitor,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.monitor.finished();
    }
}
