// [libs/core/resilience/src/rate_limiter.rs]
/*!
 * =================================================================
 * APARATO: TOKEN BUCKET RATE LIMITER
 * CLASIFICACIÓN: RESILIENCE PRIMITIVE (ESTRATO L1-CORE)
 * RESPONSABILIDAD: CONTROL DE RÁFAGA HACIA SERVICIOS EXTERNOS
 *
 * Mutual exclusion covers only the refill/decrement inspection; the actual
 * sleep happens outside the critical section so one slow waiter never blocks
 * another caller from observing a fresh refill.
 * =================================================================
 */

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::sleep;
use tracing::instrument;

/// An async token-bucket rate limiter. `rate` is tokens added per second;
/// `max_tokens` is the burst capacity the bucket never exceeds.
pub struct RateLimiter {
    rate: f64,
    max_tokens: f64,
    state: AsyncMutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(rate: f64, max_tokens: f64) -> Self {
        Self {
            rate,
            max_tokens,
            state: AsyncMutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Blocks until `tokens` are available, then subtracts them and returns.
    #[instrument(skip(self), fields(rate = self.rate, max_tokens = self.max_tokens))]
    pub async fn acquire(&self, tokens: f64) {
        loop {
            let wait = {
                let mut guard = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(guard.last_refill).as_secs_f64();
                guard.tokens = refill(guard.tokens, elapsed, self.rate, self.max_tokens);
                guard.last_refill = now;

                if guard.tokens >= tokens {
                    guard.tokens -= tokens;
                    None
                } else {
                    let deficit = tokens - guard.tokens;
                    Some(Duration::from_secs_f64(deficit / self.rate))
                }
            };

            match wait {
                None => return,
                Some(duration) => sleep(duration).await,
            }
        }
    }
}

/// Process-wide registry of named rate limiters, one per external service.
/// Looking up an unseen service creates a default `rate=1, max_tokens=5`
/// limiter on first mention.
pub struct RateLimiterRegistry {
    limiters: Mutex<HashMap<String, &'static RateLimiter>>,
}

impl RateLimiterRegistry {
    fn new() -> Self {
        Self {
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared limiter for `service`, creating and leaking a
    /// default one on first mention. Pre-seeded services mirror common
    /// upstreams the discovery sources call.
    pub fn get(&self, service: &str) -> &'static RateLimiter {
        let mut guard = self.limiters.lock().expect("rate limiter registry lock poisoned");
        if let Some(existing) = guard.get(service) {
            return existing;
        }

        let (rate, max_tokens) = default_parameters_for(service);
        let limiter: &'static RateLimiter = Box::leak(Box::new(RateLimiter::new(rate, max_tokens)));
        guard.insert(service.to_string(), limiter);
        limiter
    }
}

/// Adds `elapsed * rate` tokens to `tokens`, clamped to `max_tokens`. Split
/// out of `acquire` so the arithmetic can be property-tested without a tokio
/// runtime or real clock.
fn refill(tokens: f64, elapsed: f64, rate: f64, max_tokens: f64) -> f64 {
    (tokens + elapsed * rate).min(max_tokens)
}

fn default_parameters_for(service: &str) -> (f64, f64) {
    match service {
        "tineye" => (2.0, 10.0),
        "hive" => (5.0, 20.0),
        "civitai" => (5.0, 20.0),
        "deviantart" => (10.0, 20.0),
        "reddit" => (1.0, 5.0),
        _ => (1.0, 5.0),
    }
}

pub static RATE_LIMITERS: Lazy<RateLimiterRegistry> = Lazy::new(RateLimiterRegistry::new);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Instant;

    #[tokio::test]
    async fn burst_then_block_takes_roughly_one_over_rate_seconds() {
        let limiter = RateLimiter::new(10.0, 3.0);

        // Drain the burst capacity without blocking.
        limiter.acquire(1.0).await;
        limiter.acquire(1.0).await;
        limiter.acquire(1.0).await;

        let started = Instant::now();
        limiter.acquire(1.0).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(50), "expected a throttling wait, got {:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(250), "wait was much longer than 1/rate, got {:?}", elapsed);
    }

    #[test]
    fn unseen_service_gets_default_parameters() {
        assert_eq!(default_parameters_for("some_new_upstream"), (1.0, 5.0));
        assert_eq!(default_parameters_for("civitai"), (5.0, 20.0));
    }

    #[tokio::test]
    async fn registry_returns_same_limiter_for_repeated_lookups() {
        let registry = RateLimiterRegistry::new();
        let first = registry.get("example_service_unique_name");
        let second = registry.get("example_service_unique_name");
        assert!(std::ptr::eq(first, second));
    }

    proptest::proptest! {
        #[test]
        fn refill_never_exceeds_burst_capacity(
            tokens in 0.0f64..1000.0,
            elapsed in 0.0f64..10_000.0,
            rate in 0.01f64..1000.0,
            max_tokens in 0.01f64..1000.0,
        ) {
            let refilled = refill(tokens, elapsed, rate, max_tokens);
            prop_assert!(refilled <= max_tokens);
            prop_assert!(refilled >= tokens.min(max_tokens));
        }

        #[test]
        fn refill_with_zero_elapsed_is_a_no_op(tokens in 0.0f64..1000.0, rate in 0.01f64..1000.0, max_tokens in 0.01f64..1000.0) {
            prop_assert_eq!(refill(tokens.min(max_tokens), 0.0, rate, max_tokens), tokens.min(max_tokens));
        }
    }
}
