// [libs/core/providers/src/lib.rs]
/*!
 * Capability interfaces the matching pipeline dispatches through: face
 * detection (CPU-bound, synchronous), AI-generated-image classification
 * (network-bound, async), and match scoring (pure computation, static or
 * ML-backed). Each is a narrow trait with a fixed method list rather than a
 * class hierarchy, matched one-to-one against the providers an operator can
 * configure.
 */

pub mod ai_detection;
pub mod errors;
pub mod face;
pub mod registry;
pub mod scorer;

pub use ai_detection::{AiDetectionProvider, AiDetectionVerdict};
pub use errors::ProviderError;
pub use face::{BoundingBox, DetectedFace, FaceDetectionProvider, EMBEDDING_DIMENSIONS};
pub use registry::ProviderRegistry;
pub use scorer::{MatchScorerProvider, MlMatchScorer, StaticMatchScorer, ThresholdSource};
