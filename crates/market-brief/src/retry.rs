//! Retry logic with exponential backoff
//!
//! Only rate-limit failures are retried; any other error ends the loop at
//! once so the caller can degrade immediately.

use crate::config::BriefConfig;
use crate::error::{BriefError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each later one
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn from_config(config: &BriefConfig) -> Self {
        Self::new(config.max_retries, config.retry_backoff_base)
    }

    /// Back-off after the zero-based failed `attempt`: `base * 2^attempt`
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        self.backoff_base * 2_u32.saturating_pow(attempt)
    }

    /// Execute an async operation, retrying it while it reports a rate limit
    ///
    /// # Returns
    ///
    /// Result of the operation, or the last error if all attempts fail
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                "attempting operation"
            );

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(operation = operation_name, retries = attempt, "operation succeeded after retries");
                    }
                    return Ok(result);
                },
                Err(e) if e.is_rate_limited() => {
                    last_error = Some(e);

                    if attempt + 1 < self.max_attempts {
                        let backoff = self.backoff_duration(attempt);
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            ?backoff,
                            "rate limited, retrying"
                        );
                        sleep(backoff).await;
                    }
                },
                Err(e) => {
                    debug!(operation = operation_name, error = %e, "non-retryable failure");
                    return Err(e);
                },
            }
        }

        let error = last_error
            .unwrap_or_else(|| BriefError::Other("Retry failed with no error".to_string()));

        warn!(
            operation = operation_name,
            attempts = self.max_attempts,
            error = %error,
            "operation failed after all attempts"
        );

        Err(error)
    }
}
