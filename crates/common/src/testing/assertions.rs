//! Assertion macros for wait and retry tests.

/// Assert that a result is an error whose message contains a substring
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// let result: Result<(), String> = Err("timed out waiting for reply".to_string());
/// elitea_common::assert_error_contains!(result, "timed out");
/// # }
/// ```
#[macro_export]
macro_rules! assert_error_contains {
    ($result:expr, $substring:expr) => {
        match &$result {
            Ok(_) => panic!("Expected error but got Ok"),
            Err(e) => {
                let error_msg = format!("{}", e);
                assert!(
                    error_msg.contains($substring),
                    "Error message '{}' does not contain '{}'",
                    error_msg,
                    $substring
                );
            }
        }
    };
}

/// Assert the virtual time elapsed since `$start` (a `tokio::time::Instant`)
///
/// Only meaningful under `#[tokio::test(start_paused = true)]`, where sleeps
/// advance the clock by exactly their duration.
#[macro_export]
macro_rules! assert_elapsed {
    ($start:expr, $expected:expr) => {{
        let elapsed = $start.elapsed();
        let expected: std::time::Duration = $expected;
        assert_eq!(elapsed, expected, "Expected {:?} of virtual time, got {:?}", expected, elapsed);
    }};
}
