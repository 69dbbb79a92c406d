// [libs/core/providers/src/registry.rs]
/*!
 * The provider registry creates each capability once at startup and hands
 * out shared references. Adding a new provider means adding one field here,
 * not a new class hierarchy.
 */

use crate::ai_detection::AiDetectionProvider;
use crate::face::FaceDetectionProvider;
use crate::scorer::MatchScorerProvider;
use std::sync::Arc;

/// Process-wide handle to the three capability providers the matching
/// pipeline depends on. Constructed once during bootstrap and threaded
/// through the pipeline as a context object, per the ban on implicit
/// cross-module construction order.
#[derive(Clone)]
pub struct ProviderRegistry {
    pub face_detection: Arc<dyn FaceDetectionProvider>,
    pub ai_detection: Arc<dyn AiDetectionProvider>,
    pub match_scorer: Arc<dyn MatchScorerProvider>,
}

impl ProviderRegistry {
    pub fn new(
        face_detection: Arc<dyn FaceDetectionProvider>,
        ai_detection: Arc<dyn AiDetectionProvider>,
        match_scorer: Arc<dyn MatchScorerProvider>,
    ) -> Self {
        Self {
            face_detection,
            ai_detection,
            match_scorer,
        }
    }
}
