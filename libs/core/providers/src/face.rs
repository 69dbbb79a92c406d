// [libs/core/providers/src/face.rs]
/*!
 * Face detection is pure CPU/GPU work with no network suspension points, so
 * this trait stays synchronous; callers are expected to run it inside
 * `tokio::task::spawn_blocking`.
 */

use crate::errors::ProviderError;

pub const EMBEDDING_DIMENSIONS: usize = 512;

#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A face the model located in a frame, with its unit-norm 512-dim
/// embedding. This is the raw detector output, prior to being attached to a
/// `DiscoveredImage` and persisted as a `DiscoveredFaceEmbedding`.
#[derive(Debug, Clone)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub detection_score: f32,
    pub embedding: Vec<f32>,
}

/// Capability interface for the face-detection/embedding model. A backend
/// implements `init_model` once at startup and is then invoked concurrently
/// across worker tasks; if the underlying library is not reentrant the
/// implementation must wrap it in its own mutex.
pub trait FaceDetectionProvider: Send + Sync {
    fn init_model(&self, model_name: &str) -> Result<(), ProviderError>;

    fn detect(&self, image_bytes: &[u8]) -> Result<Vec<DetectedFace>, ProviderError>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
pub(crate) struct StubFaceDetectionProvider {
    pub faces_per_image: usize,
}

#[cfg(test)]
impl FaceDetectionProvider for StubFaceDetectionProvider {
    fn init_model(&self, _model_name: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<DetectedFace>, ProviderError> {
        let mut embedding = vec![0.0f32; EMBEDDING_DIMENSIONS];
        embedding[0] = 1.0;
        Ok((0..self.faces_per_image)
            .map(|_| DetectedFace {
                bbox: BoundingBox { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
                detection_score: 0.9,
                embedding: embedding.clone(),
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_provider_returns_requested_face_count() {
        let provider = StubFaceDetectionProvider { faces_per_image: 2 };
        let faces = provider.detect(&[]).unwrap();
        assert_eq!(faces.len(), 2);
    }
}
