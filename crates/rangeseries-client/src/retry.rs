//! Retry Policy with Exponential Backoff
//!
//! Bulk writes resubmit records the store rejected (throttling, capacity) and
//! requests that failed transiently. This module decides how long to wait
//! between attempts and which failures are worth another attempt.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  write_all(...)  │ Batch Writer
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────────────────┐
//! │  RetryPolicy                 │
//! │  - max_retries: 5            │
//! │  - initial_backoff: 50ms     │
//! │  - max_backoff: 5s           │
//! │  - backoff_multiplier: 2.0   │
//! └────────┬─────────────────────┘
//!          │
//!          ├─→ Attempt 1: Immediate
//!          ├─→ Attempt 2: Wait 50ms
//!          ├─→ Attempt 3: Wait 100ms
//!          ├─→ Attempt 4: Wait 200ms
//!          ├─→ Attempt 5: Wait 400ms
//!          └─→ Attempt 6: Wait 800ms, then give up
//! ```
//!
//! ## Retryable vs Non-Retryable Errors
//!
//! **Retryable** (transient):
//! - `Throttled`: request rate or capacity exceeded
//! - `Unavailable`: store temporarily unreachable
//!
//! **Non-Retryable** (permanent):
//! - `Credentials`, `AccessDenied`: won't succeed on retry
//! - `ResourceNotFound`: table missing
//! - `Validation`: request malformed
//! - `Other`
//!
//! ## Examples
//!
//! ```ignore
//! use rangeseries_client::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! for attempt in 0..=policy.max_retries {
//!     // ... submit ...
//!     tokio::time::sleep(policy.jittered_backoff(attempt)).await;
//! }
//! ```

use crate::error::StoreErrorKind;
use std::time::Duration;

/// Retry policy configuration for exponential backoff.
///
/// # Backoff Calculation
///
/// ```text
/// backoff = min(initial_backoff * multiplier^attempt, max_backoff)
/// ```
///
/// # Examples
///
/// ```ignore
/// // Fast retries for tests
/// let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(10), 2.0);
///
/// // Patient retries for heavily throttled tables
/// let policy = RetryPolicy {
///     max_retries: 10,
///     initial_backoff: Duration::from_millis(200),
///     max_backoff: Duration::from_secs(20),
///     backoff_multiplier: 2.0,
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: usize,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier for exponential growth
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    /// 5 retries, 50ms initial backoff doubling up to 5s.
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: usize,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// Calculate backoff duration for a given attempt number (0-indexed).
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(0), Duration::from_millis(50));
    /// assert_eq!(policy.backoff(1), Duration::from_millis(100));
    /// ```
    pub fn backoff(&self, attempt: usize) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.min(i32::MAX as usize) as i32);
        let backoff = Duration::from_millis(backoff_ms.min(u64::MAX as f64) as u64);
        backoff.min(self.max_backoff)
    }

    /// Backoff with ±25% random jitter, still capped at `max_backoff`.
    ///
    /// ```text
    /// jittered_backoff = backoff * (0.75 + random(0.0, 0.5))
    /// ```
    pub fn jittered_backoff(&self, attempt: usize) -> Duration {
        let base = self.backoff(attempt);
        let jitter = 0.75 + (rand::random::<f64>() * 0.5); // 0.75-1.25x
        Duration::from_millis((base.as_millis() as f64 * jitter) as u64).min(self.max_backoff)
    }

    /// Check if a store failure is worth retrying.
    pub fn is_retryable(&self, kind: StoreErrorKind) -> bool {
        match kind {
            // Retryable: transient failures
            StoreErrorKind::Throttled => true,
            StoreErrorKind::Unavailable => true,

            // Non-retryable: permanent failures
            StoreErrorKind::Credentials => false,
            StoreErrorKind::AccessDenied => false,
            StoreErrorKind::ResourceNotFound => false,
            StoreErrorKind::Validation => false,
            StoreErrorKind::Other => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // RetryPolicy - default values
    // ========================================================================

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(50));
        assert_eq!(policy.max_backoff, Duration::from_secs(5));
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_retry_policy_new_custom() {
        let policy = RetryPolicy::new(
            10,
            Duration::from_millis(50),
            Duration::from_secs(60),
            3.0,
        );
        assert_eq!(policy.max_retries, 10);
        assert_eq!(policy.initial_backoff, Duration::from_millis(50));
        assert_eq!(policy.max_backoff, Duration::from_secs(60));
        assert_eq!(policy.backoff_multiplier, 3.0);
    }

    // ========================================================================
    // RetryPolicy - backoff calculation
    // ========================================================================

    #[test]
    fn test_backoff_exponential_growth_default() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(0), Duration::from_millis(50));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_max_cap() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        };

        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(4), Duration::from_secs(10)); // Capped
        assert_eq!(policy.backoff(100), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_with_multiplier_1_no_growth() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(500),
            Duration::from_secs(60),
            1.0,
        );

        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(3), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_very_large_attempt_stays_capped() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(usize::MAX) <= policy.max_backoff);
    }

    #[test]
    fn test_jittered_backoff_within_bounds() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_secs(60),
            2.0,
        );

        for _ in 0..100 {
            let jittered = policy.jittered_backoff(1);
            assert!(jittered >= Duration::from_millis(150));
            assert!(jittered <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_jittered_backoff_respects_cap() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_millis(100),
            2.0,
        );
        for _ in 0..100 {
            assert!(policy.jittered_backoff(3) <= Duration::from_millis(100));
        }
    }

    // ========================================================================
    // RetryPolicy - is_retryable
    // ========================================================================

    #[test]
    fn test_is_retryable_transient() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(StoreErrorKind::Throttled));
        assert!(policy.is_retryable(StoreErrorKind::Unavailable));
    }

    #[test]
    fn test_not_retryable_permanent() {
        let policy = RetryPolicy::default();
        for kind in [
            StoreErrorKind::Credentials,
            StoreErrorKind::AccessDenied,
            StoreErrorKind::ResourceNotFound,
            StoreErrorKind::Validation,
            StoreErrorKind::Other,
        ] {
            assert!(!policy.is_retryable(kind), "{kind} should not be retryable");
        }
    }
}
