//! Retry logic with exponential backoff
//!
//! Every data adapter sends its requests through one [`RetryPolicy`], so the
//! whole crew retries the same failures the same way.

use crate::error::{Result, StockError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(16),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    /// Backoff before the given retry (1 = first retry)
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::from_secs(0);
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((retry - 1) as i32);

        Duration::from_millis(backoff_ms as u64).min(self.max_backoff)
    }

    /// Execute an async operation, retrying transient failures
    ///
    /// Only errors for which [`StockError::is_retryable`] holds are retried;
    /// the last error is returned once all attempts are used.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                max_attempts = attempts,
                "Sending request"
            );

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(operation = operation_name, retries = attempt, "Succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    debug!(operation = operation_name, error = %e, "Non-retryable failure");
                    return Err(e);
                }
                Err(e) => {
                    if attempt + 1 < attempts {
                        let backoff = self.backoff_duration(attempt + 1);
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max_attempts = attempts,
                            error = %e,
                            backoff_ms = backoff.as_millis() as u64,
                            "Request failed, retrying"
                        );
                        sleep(backoff).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| StockError::Other("Retry failed with no error".to_string()));
        warn!(operation = operation_name, attempts, error = %error, "Giving up");
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(2));
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_duration(0), Duration::from_secs(0));
        assert_eq!(policy.backoff_duration(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_duration(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_duration(3), Duration::from_secs(8));
        assert_eq!(policy.backoff_duration(10), Duration::from_secs(16));
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = RetryPolicy::fast()
            .execute("flaky", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(StockError::Timeout {
                            provider: "test".to_string(),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = RetryPolicy::fast()
            .execute("bad key", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StockError::HttpStatus {
                        provider: "serper".to_string(),
                        status: 403,
                        body: "forbidden".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(StockError::HttpStatus { status: 403, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = RetryPolicy::fast()
            .execute("down", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StockError::HttpStatus {
                        provider: "sec".to_string(),
                        status: 503,
                        body: String::new(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
