//! Fixed-delay retry for storage writes.
//!
//! Uses the `backon` crate with a constant backoff: no growth, no jitter.

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::{debug, error, warn};
use vitrine_shared::UploadSettings;

use super::error::StorageError;

/// Retry policy for a single storage write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Default attempts: one write plus two retries.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Default pause between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Create a retry policy.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Build the policy from upload settings.
    #[must_use]
    pub const fn from_settings(settings: &UploadSettings) -> Self {
        Self::new(
            settings.retry_attempts,
            Duration::from_millis(settings.retry_delay_ms),
        )
    }

    /// Attempts actually made; a zero setting still writes once.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    fn build_backoff(&self) -> ConstantBuilder {
        let retries = usize::try_from(self.attempts() - 1).unwrap_or(usize::MAX);
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(retries)
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// The last error is returned once every attempt has failed.
    pub async fn run<F, Fut, T>(&self, operation: &str, op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let max_attempts = self.attempts();

        let mut attempt = 0u32;
        let notify = |err: &StorageError, dur: Duration| {
            attempt += 1;
            warn!(
                operation = %operation,
                attempt = attempt,
                max_attempts = max_attempts,
                next_delay_ms = u64::try_from(dur.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Storage write failed, will retry"
            );
        };

        let result = op.retry(self.build_backoff()).notify(notify).await;

        match &result {
            Ok(_) => debug!(operation = %operation, "Storage write succeeded"),
            Err(e) => error!(
                operation = %operation,
                attempts = max_attempts,
                error = %e,
                "Storage write failed after all attempts"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing_until(
        calls: &Arc<AtomicU32>,
        succeed_on: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, StorageError>> {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n >= succeed_on {
                Ok(n)
            } else {
                Err(StorageError::operation(format!("attempt {n} failed")))
            })
        }
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = RetryPolicy::from_settings(&UploadSettings {
            max_file_size: 1024,
            retry_attempts: 5,
            retry_delay_ms: 250,
        });
        assert_eq!(policy, RetryPolicy::new(5, Duration::from_millis(250)));
    }

    #[test]
    fn test_zero_attempts_still_writes_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result = policy.run("put", failing_until(&calls, 1)).await;

        assert_eq!(result.expect("should succeed"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fails_twice_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result = policy.run("put", failing_until(&calls, 3)).await;

        assert_eq!(result.expect("should succeed"), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let err = policy
            .run("put", failing_until(&calls, u32::MAX))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.to_string(), "storage operation failed: attempt 3 failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();

        let started = tokio::time::Instant::now();
        let result = policy.run("put", failing_until(&calls, u32::MAX)).await;
        let elapsed = started.elapsed();

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two pauses of one second each, no growth.
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }
}
