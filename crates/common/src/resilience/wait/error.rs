// Error types for the wait module
use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`super::Poller`] waits.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The deadline passed without the condition holding
    #[error("timed out waiting for {description} after {elapsed:?} (timeout {timeout:?}, {polls} polls)")]
    Timeout { description: String, timeout: Duration, elapsed: Duration, polls: u32 },

    /// Cancellation was observed before the condition held
    #[error("wait for {description} cancelled after {elapsed:?}")]
    Cancelled { description: String, elapsed: Duration },

    /// The signal sender went away before the signal fired
    #[error("signal for {description} closed before it fired")]
    SignalClosed { description: String },

    /// A wait failed and was relabelled with a caller-supplied message
    #[error("{message}")]
    Failed { message: String, source: Box<WaitError> },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Failed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::Failed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Number of condition evaluations before a timeout
    pub fn polls(&self) -> Option<u32> {
        match self {
            Self::Timeout { polls, .. } => Some(*polls),
            Self::Failed { source, .. } => source.polls(),
            _ => None,
        }
    }
}

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;
