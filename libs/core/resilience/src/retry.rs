// [libs/core/resilience/src/retry.rs]
/*!
 * =================================================================
 * APARATO: RETRY CON BACKOFF EXPONENCIAL
 * CLASIFICACIÓN: RESILIENCE PRIMITIVE (ESTRATO L1-CORE)
 * RESPONSABILIDAD: ABSORCIÓN DE FALLOS TRANSITORIOS
 *
 * Composition order for an external call: circuit breaker wraps retry wraps
 * rate limiter. The breaker's check happens once per logical call, not once
 * per attempt, so a breaker trip during the retry loop aborts immediately
 * rather than burning the remaining attempt budget.
 * =================================================================
 */

use crate::errors::ResilienceError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponential = self.min_wait.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
        let capped = exponential.min(self.max_wait.as_secs_f64());
        let jittered = rand::thread_rng().gen_range(0.0..=capped);
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Retries `operation` up to `policy.max_attempts` times, classifying each
/// error with `is_retryable`. A `CircuitOpen` error (or anything
/// `is_retryable` rejects) is returned to the caller immediately instead of
/// being retried.
pub async fn retry_async<T, E, F, Fut, R>(
    operation_name: &str,
    policy: RetryPolicy,
    is_retryable: R,
    mut operation: F,
) -> Result<T, ResilienceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    let mut last_error = String::new();

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_error = err.to_string();
                if !is_retryable(&err) || attempt >= policy.max_attempts {
                    break;
                }
                let wait = policy.backoff_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %last_error,
                    "retrying after transient failure"
                );
                tokio::time::sleep(wait).await;
            }
        }
    }

    Err(ResilienceError::RetryExhausted {
        operation: operation_name.to_string(),
        attempts: attempt,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, ResilienceError> = retry_async(
            "probe",
            RetryPolicy {
                max_attempts: 3,
                min_wait: Duration::from_millis(1),
                max_wait: Duration::from_millis(2),
            },
            |_: &&str| true,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<u32, &str>(42) }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, ResilienceError> = retry_async(
            "probe",
            RetryPolicy {
                max_attempts: 3,
                min_wait: Duration::from_millis(1),
                max_wait: Duration::from_millis(2),
            },
            |_: &&str| true,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, &str>("upstream timeout") }
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(ResilienceError::RetryExhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_after_first_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, ResilienceError> = retry_async(
            "probe",
            RetryPolicy::default(),
            |_: &&str| false,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, &str>("permanent: 404 not found") }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
