// [libs/core/resilience/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResilienceError {
    #[error("[RESILIENCE_CIRCUIT_OPEN]: circuit for '{service}' is open")]
    CircuitOpen { service: String },

    #[error("[RESILIENCE_RETRY_EXHAUSTED]: '{operation}' failed after {attempts} attempts: {last_error}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}
