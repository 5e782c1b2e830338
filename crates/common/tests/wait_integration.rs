//! Integration tests for the polling loop
//!
//! All tests run on paused tokio time; elapsed times are exact.

#![cfg(feature = "test-utils")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use elitea_common::resilience::{ActivityMonitor, Poller, WaitError, WaitSpec};
use elitea_common::testing::{FlipAfter, RecordedEvent, RecordingObserver};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn spec(timeout_ms: u64, interval_ms: u64, description: &str) -> WaitSpec {
    WaitSpec::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .poll_interval(Duration::from_millis(interval_ms))
        .description(description)
        .build()
        .expect("valid spec")
}

/// Validates a condition that turns true after three polls.
///
/// # Test Steps
/// 1. Flip the condition at 1500ms; poll every 500ms with a 5s timeout
/// 2. Verify success at exactly 1500ms after four evaluations
#[tokio::test(start_paused = true)]
async fn test_condition_true_after_three_polls() {
    let flip = FlipAfter::new(Duration::from_millis(1500));
    let recorder = RecordingObserver::new();
    let start = Instant::now();

    Poller::new()
        .with_observer(recorder.shared())
        .wait_until(&spec(5000, 500, "reply visible"), || flip.is_set())
        .await
        .expect("condition holds");

    assert_eq!(start.elapsed(), Duration::from_millis(1500));
    assert!(recorder.events().contains(&RecordedEvent::Satisfied {
        description: "reply visible".to_string(),
        polls: 4,
        elapsed: Duration::from_millis(1500),
    }));
}

/// Validates a condition that never holds times out on the deadline.
///
/// # Test Steps
/// 1. Timeout 1000ms, poll 200ms, condition always false
/// 2. Verify `Timeout` after exactly 1000ms
/// 3. Verify 6 evaluations (5 sleeps)
#[tokio::test(start_paused = true)]
async fn test_never_true_times_out() {
    let evaluations = AtomicUsize::new(0);
    let start = Instant::now();

    let err = Poller::new()
        .wait_until(&spec(1000, 200, "spinner gone"), || {
            evaluations.fetch_add(1, Ordering::SeqCst);
            false
        })
        .await
        .unwrap_err();

    assert_eq!(start.elapsed(), Duration::from_millis(1000));
    assert_eq!(evaluations.load(Ordering::SeqCst), 6);
    match err {
        WaitError::Timeout { description, timeout, elapsed, polls } => {
            assert_eq!(description, "spinner gone");
            assert_eq!(timeout, Duration::from_millis(1000));
            assert_eq!(elapsed, Duration::from_millis(1000));
            assert_eq!(polls, 6);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

/// Validates a flip at `t` is observed at the first poll at or after `t`.
#[tokio::test(start_paused = true)]
async fn test_flip_observed_at_next_poll() {
    let flip = FlipAfter::new(Duration::from_millis(730));
    let start = Instant::now();
    Poller::new()
        .wait_until(&spec(5000, 250, "badge updated"), || flip.is_set())
        .await
        .expect("condition holds");
    assert_eq!(start.elapsed(), Duration::from_millis(750));
}

/// Validates a zero timeout evaluates once and never sleeps.
#[tokio::test(start_paused = true)]
async fn test_zero_timeout() {
    let start = Instant::now();
    let err = Poller::new().wait_until(&spec(0, 500, "instant"), || false).await.unwrap_err();
    assert_eq!(err.polls(), Some(1));
    assert_eq!(start.elapsed(), Duration::ZERO);

    Poller::new().wait_until(&spec(0, 500, "instant"), || true).await.expect("holds");
}

/// Validates async conditions and reported evaluation errors.
#[tokio::test(start_paused = true)]
async fn test_fallible_condition_reports_errors() {
    let recorder = RecordingObserver::new();
    let flip = FlipAfter::new(Duration::from_millis(300));

    Poller::new()
        .with_observer(recorder.shared())
        .try_wait_until(&spec(2000, 100, "message rendered"), || async move {
            if flip.is_set() {
                Ok(true)
            } else {
                Err(std::io::Error::other("element detached"))
            }
        })
        .await
        .expect("condition holds");

    assert_eq!(recorder.count(|e| matches!(e, RecordedEvent::ConditionError { .. })), 3);

    Poller::new()
        .wait_until_async(&spec(2000, 100, "async flip"), || async move { flip.is_set() })
        .await
        .expect("condition holds");
}

/// Validates value and count equality waits.
#[tokio::test(start_paused = true)]
async fn test_value_and_count_waits() {
    let count = AtomicUsize::new(0);
    let count = &count;
    let start = Instant::now();
    Poller::new()
        .wait_for_count(&spec(5000, 100, "three messages"), 3, || async move {
            Ok::<_, std::io::Error>(count.fetch_add(1, Ordering::SeqCst))
        })
        .await
        .expect("count reaches 3");
    assert_eq!(start.elapsed(), Duration::from_millis(300));

    let flip = FlipAfter::new(Duration::from_millis(200));
    Poller::new()
        .wait_for_value(&spec(1000, 100, "aria-busy"), "false".to_string(), || async move {
            Ok::<_, std::io::Error>(if flip.is_set() { "false" } else { "true" }.to_string())
        })
        .await
        .expect("attribute settles");
}

/// Validates absence waits.
///
/// # Test Steps
/// 1. Element present until 400ms, then gone
/// 2. Verify the wait returns at 400ms
/// 3. Verify a probe error counts as gone
#[tokio::test(start_paused = true)]
async fn test_wait_for_absence() {
    let gone = FlipAfter::new(Duration::from_millis(400));
    let start = Instant::now();
    Poller::new()
        .wait_for_absence(&spec(2000, 100, "typing indicator gone"), || async move {
            Ok::<_, std::io::Error>(!gone.is_set())
        })
        .await
        .expect("indicator disappears");
    assert_eq!(start.elapsed(), Duration::from_millis(400));

    Poller::new()
        .wait_for_absence(&spec(2000, 100, "toast gone"), || async {
            Err::<bool, _>(std::io::Error::other("target closed"))
        })
        .await
        .expect("errors count as gone");
}

/// Validates stability waits settle after the value stops moving.
#[tokio::test(start_paused = true)]
async fn test_wait_for_stable() {
    let moving_until = FlipAfter::new(Duration::from_millis(500));
    let start = Instant::now();
    Poller::new()
        .wait_for_stable(
            &WaitSpec::stability("chat bubble position", Duration::from_secs(2)),
            3,
            || async move {
                let y = if moving_until.is_set() { 500 } else { start.elapsed().as_millis() as u64 };
                Ok::<_, std::io::Error>(y)
            },
        )
        .await
        .expect("position settles");
    assert_eq!(start.elapsed(), Duration::from_millis(800));
}

/// Validates quiet-period waits on an activity monitor.
///
/// # Test Steps
/// 1. Keep one request in flight until 300ms
/// 2. Require 1s of quiet
/// 3. Verify the wait returns at the first poll 1s after the finish
#[tokio::test(start_paused = true)]
async fn test_wait_for_quiet() {
    let monitor = ActivityMonitor::new();
    let guard = monitor.track();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        drop(guard);
    });

    let start = Instant::now();
    Poller::new()
        .wait_for_quiet(&spec(5000, 200, "network idle"), &monitor, Duration::from_secs(1))
        .await
        .expect("network goes quiet");
    assert_eq!(start.elapsed(), Duration::from_millis(1400));
}

/// Validates event-signal waits.
#[tokio::test(start_paused = true)]
async fn test_wait_for_signal() {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        let _ = tx.send(true);
    });
    let start = Instant::now();
    Poller::new()
        .wait_for_signal(&spec(1000, 500, "socket connected"), rx)
        .await
        .expect("socket connects");
    assert_eq!(start.elapsed(), Duration::from_millis(120));

    let (tx, rx) = watch::channel(true);
    drop(tx);
    Poller::new()
        .wait_for_signal(&spec(0, 500, "already connected"), rx)
        .await
        .expect("already set");
}

/// Validates cancellation releases a waiter promptly.
#[tokio::test(start_paused = true)]
async fn test_cancelled_wait() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        trigger.cancel();
    });
    let start = Instant::now();
    let err = Poller::new()
        .with_cancellation(token)
        .wait_until(&spec(30_000, 500, "never"), || false)
        .await
        .unwrap_err();
    assert!(matches!(err, WaitError::Cancelled { .. }));
    assert_eq!(start.elapsed(), Duration::from_millis(600));
}

/// Validates the custom error message.
#[tokio::test(start_paused = true)]
async fn test_wait_with_message() {
    let result = Poller::new()
        .wait_with_message(&spec(200, 100, "sidebar"), "sidebar never opened", || false)
        .await;
    elitea_common::assert_error_contains!(result, "sidebar never opened");
}
