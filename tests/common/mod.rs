//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use convert_studio::{StudioBridge, StudioEvent};
use std::time::{Duration, Instant};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Receive events until `pred` matches one, returning everything seen
/// including the match. Panics on timeout.
pub fn wait_for_event<F>(bridge: &StudioBridge, mut pred: F) -> Vec<StudioEvent>
where
    F: FnMut(&StudioEvent) -> bool,
{
    let deadline = Instant::now() + test_timeout();
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = bridge.recv_timeout(Duration::from_millis(20)) {
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }
    panic!("Timed out waiting for event; saw {:?}", seen);
}
