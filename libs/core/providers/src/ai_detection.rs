// [libs/core/providers/src/ai_detection.rs]
/*!
 * AI-generated-image classification is network-bound; implementations are
 * expected to wrap their HTTP call with the caller's rate limiter and
 * circuit breaker (see `sentinel_core_resilience`) rather than doing so
 * internally, so the same policy instance is shared across every provider.
 */

use crate::errors::ProviderError;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct AiDetectionVerdict {
    pub is_ai_generated: bool,
    pub score: f32,
    pub generator: Option<String>,
}

#[async_trait]
pub trait AiDetectionProvider: Send + Sync {
    async fn classify(&self, image_url: &str) -> Result<Option<AiDetectionVerdict>, ProviderError>;

    fn provider_name(&self) -> &str;
}

#[cfg(test)]
pub(crate) struct StubAiDetectionProvider {
    pub verdict: Option<AiDetectionVerdict>,
}

#[cfg(test)]
#[async_trait]
impl AiDetectionProvider for StubAiDetectionProvider {
    async fn classify(&self, _image_url: &str) -> Result<Option<AiDetectionVerdict>, ProviderError> {
        Ok(self.verdict.clone())
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}
