//! # Bounded Backoff Retry
//!
//! External confirmation signals (payment succeeded, delivery completed)
//! can arrive before the local record they reference has committed. The
//! consuming side retries a handful of times with doubling delays before
//! giving up and logging for manual reconciliation. Nothing blocks
//! indefinitely and nothing is silently dropped.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

// =============================================================================
// Policy
// =============================================================================

/// Retry policy for not-yet-visible records.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub initial_delay: Duration,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

// =============================================================================
// Retry Loop
// =============================================================================

/// Polls `operation` until it yields a value or attempts are exhausted.
///
/// `operation` returns:
/// - `Ok(Some(v))` - found, returned immediately
/// - `Ok(None)`    - not visible yet, retried after a backoff sleep
/// - `Err(e)`      - hard failure, returned immediately (not retried)
///
/// Exhaustion returns `Ok(None)`; the caller decides how to log it.
pub async fn retry_until_some<T, E, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_attempts {
        match operation().await? {
            Some(value) => {
                if attempt > 1 {
                    debug!(what, attempt, "record became visible after retry");
                }
                return Ok(Some(value));
            }
            None if attempt < policy.max_attempts => {
                debug!(what, attempt, delay_ms = delay.as_millis() as u64, "not visible yet, backing off");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
            }
            None => {}
        }
    }

    warn!(
        what,
        attempts = policy.max_attempts,
        "record never became visible; flagging for manual reconciliation"
    );
    Ok(None)
}

// =============================================================================
// Unit Tests
// =============================================================================
