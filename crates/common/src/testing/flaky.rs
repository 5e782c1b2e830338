//! Scripted operations and conditions for exercising retry and wait loops.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Failure produced by [`FlakyOperation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlakyError {
    /// Worth retrying
    #[error("transient failure on call {call}")]
    Transient { call: u32 },
    /// Never worth retrying
    #[error("permanent failure on call {call}")]
    Permanent { call: u32 },
}

impl FlakyError {
    /// Matcher for `FailureKind::new` selecting transient failures
    pub fn is_transient(error: &(dyn std::error::Error + 'static)) -> bool {
        matches!(error.downcast_ref::<FlakyError>(), Some(FlakyError::Transient { .. }))
    }
}

#[derive(Debug, Clone, Copy)]
enum Script {
    /// Fail transiently for the first `n` calls, then succeed
    FailTimes(u32),
    AlwaysTransient,
    AlwaysPermanent,
}

#[derive(Debug)]
struct FlakyState {
    script: Script,
    calls: AtomicU32,
    origin: Instant,
    call_times: Mutex<Vec<Duration>>,
}

/// Operation that follows a fixed success/failure script and records when
/// it was called.
///
/// Clones share the same call log.
#[derive(Debug, Clone)]
pub struct FlakyOperation {
    state: Arc<FlakyState>,
}

impl FlakyOperation {
    fn with_script(script: Script) -> Self {
        Self {
            state: Arc::new(FlakyState {
                script,
                calls: AtomicU32::new(0),
                origin: Instant::now(),
                call_times: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fails transiently `failures` times, then returns the call number
    pub fn failing(failures: u32) -> Self {
        Self::with_script(Script::FailTimes(failures))
    }

    pub fn always_transient() -> Self {
        Self::with_script(Script::AlwaysTransient)
    }

    pub fn always_permanent() -> Self {
        Self::with_script(Script::AlwaysPermanent)
    }

    /// Invoke the operation
    pub async fn call(&self) -> Result<u32, FlakyError> {
        let call = self.state.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .call_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.state.origin.elapsed());

        match self.state.script {
            Script::FailTimes(failures) if call <= failures => Err(FlakyError::Transient { call }),
            Script::FailTimes(_) => Ok(call),
            Script::AlwaysTransient => Err(FlakyError::Transient { call }),
            Script::AlwaysPermanent => Err(FlakyError::Permanent { call }),
        }
    }

    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Offsets from creation at which each call happened
    pub fn call_times(&self) -> Vec<Duration> {
        self.state.call_times.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Gaps between consecutive calls
    pub fn gaps(&self) -> Vec<Duration> {
        self.call_times().windows(2).map(|pair| pair[1].saturating_sub(pair[0])).collect()
    }
}

/// Condition that becomes true once `after` has elapsed since creation.
#[derive(Debug, Clone, Copy)]
pub struct FlipAfter {
    origin: Instant,
    after: Duration,
}

impl FlipAfter {
    pub fn new(after: Duration) -> Self {
        Self { origin: Instant::now(), after }
    }

    pub fn is_set(&self) -> bool {
        self.origin.elapsed() >= self.after
    }
}
