// [apps/scanner/src/providers.rs]
/*!
 * Deploy-time plugin point. The face-detection model and the
 * AI-generated-image classifier are specified only at their interface
 * (`sentinel_core_providers::{FaceDetectionProvider, AiDetectionProvider}`);
 * no concrete ML backend or third-party classifier ships in this crate.
 * These "unconfigured" stand-ins let the binary assemble a complete
 * `ProviderRegistry` and run end-to-end with both stages reporting zero
 * faces / no verdict until a real backend is wired in at the deployment
 * that needs one, mirroring `sentinel_domain_pipeline::NullEvidenceSink`.
 */

use async_trait::async_trait;
use sentinel_core_providers::{
    AiDetectionProvider, AiDetectionVerdict, DetectedFace, FaceDetectionProvider, ProviderError, ThresholdSource,
};
use sentinel_domain_models::ml_model::MlModelState;
use sentinel_domain_pipeline::threshold_cache::CachedThresholdSource;
use std::sync::Arc;

pub struct UnconfiguredFaceDetectionProvider;

impl FaceDetectionProvider for UnconfiguredFaceDetectionProvider {
    fn init_model(&self, _model_name: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<DetectedFace>, ProviderError> {
        Err(ProviderError::ModelNotInitialized {
            model: self.model_name().to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "unconfigured"
    }
}

pub struct UnconfiguredAiDetectionProvider;

#[async_trait]
impl AiDetectionProvider for UnconfiguredAiDetectionProvider {
    async fn classify(&self, _image_url: &str) -> Result<Option<AiDetectionVerdict>, ProviderError> {
        Ok(None)
    }

    fn provider_name(&self) -> &str {
        "unconfigured"
    }
}

/// Lets a single `CachedThresholdSource` back both `MlMatchScorer` (which
/// owns its threshold source by value) and the periodic refresh loop
/// (which needs an `Arc` to spawn itself) without cloning the cache.
pub struct SharedThresholdSource(pub Arc<CachedThresholdSource>);

impl ThresholdSource for SharedThresholdSource {
    fn latest_threshold_optimizer_state(&self) -> Option<MlModelState> {
        self.0.latest_threshold_optimizer_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_face_provider_refuses_detection() {
        let provider = UnconfiguredFaceDetectionProvider;
        assert!(matches!(
            provider.detect(&[]),
            Err(ProviderError::ModelNotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn unconfigured_ai_provider_returns_no_verdict() {
        let provider = UnconfiguredAiDetectionProvider;
        let verdict = provider.classify("https://example.com/x.jpg").await.unwrap();
        assert!(verdict.is_none());
    }
}
