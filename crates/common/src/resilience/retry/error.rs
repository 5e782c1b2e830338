// Error types for the retry module
use std::time::Duration;

use thiserror::Error;

/// Errors that end a retry sequence.
///
/// Generic over the operation's own error type so the last underlying failure
/// is handed back unchanged.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The attempt budget or time budget was spent without success
    #[error("{description}: failed after {attempts} attempts in {elapsed:?}: {source}")]
    Exhausted { description: String, attempts: u32, elapsed: Duration, source: E },

    /// The operation failed with an error the policy does not retry
    #[error("{description}: non-retryable failure on attempt {attempts}: {source}")]
    NonRetryable { description: String, attempts: u32, source: E },

    /// Cancellation was observed during a sleep or an attempt
    #[error("{description}: cancelled after {attempts} attempts")]
    Cancelled { description: String, attempts: u32 },
}

impl<E> RetryError<E> {
    /// Number of times the operation was invoked
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::NonRetryable { attempts, .. }
            | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// Human-readable label of the retried operation
    pub fn description(&self) -> &str {
        match self {
            Self::Exhausted { description, .. }
            | Self::NonRetryable { description, .. }
            | Self::Cancelled { description, .. } => description,
        }
    }

    /// The last underlying failure, if any
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    /// Unwrap the last underlying failure
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, Self::NonRetryable { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;
