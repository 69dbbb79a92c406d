// [libs/core/resilience/src/circuit_breaker.rs]
/*!
 * =================================================================
 * APARATO: CIRCUIT BREAKER
 * CLASIFICACIÓN: RESILIENCE PRIMITIVE (ESTRATO L1-CORE)
 * RESPONSABILIDAD: AISLAMIENTO DE SERVICIOS EXTERNOS DEGRADADOS
 *
 * Mathematical Proof: once `failure_count >= failure_threshold` the breaker
 * trips open and every call is rejected without reaching the upstream until
 * `recovery_timeout` has elapsed since the last failure. The first call past
 * that deadline is allowed through as a trial; its outcome alone decides
 * whether the circuit re-closes or stays open for another timeout window.
 * There is no separate half-open state counting multiple trial calls.
 * =================================================================
 */

use crate::errors::ResilienceError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
}

pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<Inner>,
}

struct Inner {
    state: State,
    failure_count: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(Inner {
                state: State::Closed,
                failure_count: 0,
                opened_at: None,
            }),
        }
    }

    /// Returns `Err(CircuitOpen)` if the circuit should reject the call
    /// outright; otherwise the caller is clear to attempt the operation.
    pub fn check(&self, service: &str) -> Result<(), ResilienceError> {
        let mut guard = self.inner.lock().expect("circuit breaker lock poisoned");
        match guard.state {
            State::Closed => Ok(()),
            State::Open => {
                let opened_at = guard.opened_at.expect("open state always carries opened_at");
                if opened_at.elapsed() >= self.recovery_timeout {
                    info!(service, "circuit recovery timeout elapsed, allowing trial call");
                    Ok(())
                } else {
                    Err(ResilienceError::CircuitOpen {
                        service: service.to_string(),
                    })
                }
            }
        }
    }

    pub fn record_success(&self, service: &str) {
        let mut guard = self.inner.lock().expect("circuit breaker lock poisoned");
        if guard.state != State::Closed {
            info!(service, "circuit closing after successful trial call");
        }
        guard.state = State::Closed;
        guard.failure_count = 0;
        guard.opened_at = None;
    }

    pub fn record_failure(&self, service: &str) {
        let mut guard = self.inner.lock().expect("circuit breaker lock poisoned");
        guard.failure_count += 1;
        if guard.failure_count >= self.failure_threshold {
            guard.state = State::Open;
            guard.opened_at = Some(Instant::now());
            warn!(service, failure_count = guard.failure_count, "circuit opened");
        }
    }

    /// Non-mutating snapshot of whether the circuit is currently tripped,
    /// for the health endpoint's best-effort metrics. Does not consider
    /// whether the recovery timeout has elapsed — that decision is `check`'s
    /// alone, since it has the side effect of admitting a trial call.
    pub fn is_open(&self) -> bool {
        self.inner.lock().expect("circuit breaker lock poisoned").state == State::Open
    }
}

pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, &'static CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    fn new() -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared breaker for `service`, creating a default
    /// `failure_threshold=5, recovery_timeout=300s` breaker on first mention.
    pub fn get(&self, service: &str) -> &'static CircuitBreaker {
        let mut guard = self.breakers.lock().expect("circuit breaker registry lock poisoned");
        if let Some(existing) = guard.get(service) {
            return existing;
        }

        let breaker: &'static CircuitBreaker =
            Box::leak(Box::new(CircuitBreaker::new(5, Duration::from_secs(300))));
        guard.insert(service.to_string(), breaker);
        breaker
    }

    /// Service names whose circuit is currently open, for the health
    /// endpoint's metrics snapshot.
    pub fn open_service_names(&self) -> Vec<String> {
        let guard = self.breakers.lock().expect("circuit breaker registry lock poisoned");
        guard.iter().filter(|(_, breaker)| breaker.is_open()).map(|(name, _)| name.clone()).collect()
    }
}

pub static CIRCUIT_BREAKERS: Lazy<CircuitBreakerRegistry> = Lazy::new(CircuitBreakerRegistry::new);
