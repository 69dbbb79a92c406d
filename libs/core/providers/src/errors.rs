// [libs/core/providers/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("[PROVIDER_MODEL_NOT_INITIALIZED]: '{model}' has not been initialized")]
    ModelNotInitialized { model: String },

    #[error("[PROVIDER_DETECTION_FAILED]: face detection failed: {reason}")]
    DetectionFailed { reason: String },

    #[error("[PROVIDER_CLASSIFICATION_FAILED]: AI-generation classification failed: {reason}")]
    ClassificationFailed { reason: String },

    #[error("[PROVIDER_UPSTREAM_REJECTED]: upstream rejected the request with status {status}")]
    UpstreamRejected { status: u16 },
}
