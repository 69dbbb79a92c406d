// [libs/core/resilience/src/lib.rs]
/*!
 * Resilience primitives shared by every discovery source and provider that
 * calls out to a third-party platform: a token-bucket rate limiter, a
 * circuit breaker, and a retry policy with exponential backoff.
 *
 * Composition order for a single external call:
 *
 * ```text
 * circuit_breaker.check()  -> reject fast if the upstream is known-bad
 *   retry_async(..)         -> absorb transient failures, bounded attempts
 *     rate_limiter.acquire() -> pace the actual network calls
 * ```
 */

pub mod circuit_breaker;
pub mod errors;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry, CIRCUIT_BREAKERS};
pub use errors::ResilienceError;
pub use rate_limiter::{RateLimiter, RateLimiterRegistry, RATE_LIMITERS};
pub use retry::{retry_async, RetryPolicy};
