//! Cooperative cancellation shared by the retry and wait loops.
//!
//! Both loops accept an optional [`CancellationToken`]. The token is raced
//! against every sleep and every operation/condition future, so a cancelled
//! caller is released at the next suspension point rather than after the
//! remaining budget runs out.

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Marker error signalling cooperative cancellation.
///
/// Operations and conditions may return this (directly or anywhere in their
/// `source()` chain) to stop a retry or wait sequence immediately. It is
/// never retried and never reported as a timeout or exhaustion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Returns `true` when `error` or any of its sources is [`Cancelled`].
pub fn is_cancellation(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if err.is::<Cancelled>() {
            return true;
        }
        current = err.source();
    }
    false
}

/// Sleep for `delay` unless `token` fires first.
pub(crate) async fn sleep_or_cancel(
    token: Option<&CancellationToken>,
    delay: Duration,
) -> Result<(), Cancelled> {
    if delay.is_zero() {
        return check(token);
    }

    match token {
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(Cancelled),
                () = tokio::time::sleep(delay) => Ok(()),
            }
        }
    }
}

/// Drive `fut` to completion unless `token` fires first.
pub(crate) async fn run_or_cancel<F>(
    token: Option<&CancellationToken>,
    fut: F,
) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    match token {
        None => Ok(fut.await),
        Some(token) => {
            tokio::select! {
                biased;
                () = token.cancelled() => Err(Cancelled),
                output = fut => Ok(output),
            }
        }
    }
}

/// Fail fast when the token has already fired.
pub(crate) fn check(token: Option<&CancellationToken>) -> Result<(), Cancelled> {
    match token {
        Some(token) if token.is_cancelled() => Err(Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::cancel.
    use std::fmt;

    use super::*;

    #[derive(Debug)]
    struct Wrapper(Cancelled);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped")
        }
    }

    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    /// Validates cancellation detection through a source chain.
    ///
    /// Assertions:
    /// - Confirms a bare `Cancelled` is recognised.
    /// - Confirms a wrapper whose source is `Cancelled` is recognised.
    /// - Confirms an unrelated I/O error is not recognised.
    #[test]
    fn test_is_cancellation_walks_sources() {
        assert!(is_cancellation(&Cancelled));
        assert!(is_cancellation(&Wrapper(Cancelled)));
        assert!(!is_cancellation(&std::io::Error::other("boom")));
    }

    /// Tests that a fired token interrupts a long sleep without waiting it out.
    #[tokio::test(start_paused = true)]
    async fn test_sleep_or_cancel_interrupted() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = tokio::time::Instant::now();
        let result = sleep_or_cancel(Some(&token), Duration::from_secs(60)).await;

        assert_eq!(result, Err(Cancelled));
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    /// Tests that a zero delay only checks the token and never yields.
    #[tokio::test]
    async fn test_zero_sleep_checks_token() {
        let token = CancellationToken::new();
        assert_eq!(sleep_or_cancel(Some(&token), Duration::ZERO).await, Ok(()));

        token.cancel();
        assert_eq!(sleep_or_cancel(Some(&token), Duration::ZERO).await, Err(Cancelled));
    }

    /// Tests that an operation future is abandoned once the token fires.
    #[tokio::test(start_paused = true)]
    async fn test_run_or_cancel_abandons_future() {
        let token = CancellationToken::new();
        token.cancel();

        let result = run_or_cancel(Some(&token), async { 7 }).await;
        assert_eq!(result, Err(Cancelled));

        let result = run_or_cancel(None, async { 7 }).await;
        assert_eq!(result, Ok(7));
    }
}
