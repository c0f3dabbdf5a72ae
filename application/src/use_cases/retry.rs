//! Bounded retry around provider calls

use crate::config::RetryPolicy;
use crate::ports::llm_gateway::GatewayError;
use conclave_domain::FailureClass;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// The last error after the retry budget was spent (or a permanent error)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryExhausted {
    pub error: GatewayError,
    pub attempts: u32,
}

impl RetryExhausted {
    pub fn failure_class(&self) -> FailureClass {
        if self.error.is_transient() {
            FailureClass::ProviderTransient
        } else {
            FailureClass::ProviderPermanent
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy runs out.
///
/// Each attempt is bounded by `timeout`; an elapsed attempt counts as a
/// transient [`GatewayError::Timeout`]. `op` receives the 1-indexed attempt
/// number.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    mut op: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let error = match tokio::time::timeout(timeout, op(attempt)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => GatewayError::Timeout,
        };

        if !error.is_transient() {
            warn!(attempt, error = %error, "Provider call failed permanently");
            return Err(RetryExhausted {
                error,
                attempts: attempt,
            });
        }
        if attempt >= max_attempts {
            warn!(attempt, error = %error, "Provider call failed, retries exhausted");
            return Err(RetryExhausted {
                error,
                attempts: attempt,
            });
        }

        let delay = policy.backoff_for(attempt);
        debug!(attempt, ?delay, error = %error, "Transient provider failure, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = with_retry(&RetryPolicy::default(), Duration::from_secs(1), |_| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(GatewayError::RateLimited("429".into()))
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhaustion() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> =
            with_retry(&RetryPolicy::default(), Duration::from_secs(1), |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(GatewayError::Timeout) }
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.failure_class(), FailureClass::ProviderTransient);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> =
            with_retry(&RetryPolicy::default(), Duration::from_secs(1), |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(GatewayError::Unauthorized("bad key".into())) }
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(err.failure_class(), FailureClass::ProviderPermanent);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_transient() {
        let result: Result<(), _> = with_retry(
            &RetryPolicy::default(),
            Duration::from_millis(50),
            |_| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            },
        )
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.error, GatewayError::Timeout);
        assert_eq!(err.attempts, 3);
    }
}
