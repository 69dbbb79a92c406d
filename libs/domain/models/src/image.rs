// [libs/domain/models/src/image.rs]
/*!
 * A candidate image surfaced by a discovery source, and the face embedding
 * extracted from it by the ingestion stage. The status graph is monotonic
 * within one pipeline run: pending -> {no_face, has_face} -> embedded -> {matched, no_match}.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Pending,
    HasFace,
    NoFace,
    Embedded,
    Matched,
    NoMatch,
    Failed,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::HasFace => "has_face",
            Self::NoFace => "no_face",
            Self::Embedded => "embedded",
            Self::Matched => "matched",
            Self::NoMatch => "no_match",
            Self::Failed => "failed",
        }
    }

    pub fn from_str_or_pending(raw: &str) -> Self {
        match raw {
            "has_face" => Self::HasFace,
            "no_face" => Self::NoFace,
            "embedded" => Self::Embedded,
            "matched" => Self::Matched,
            "no_match" => Self::NoMatch,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredImage {
    pub id: Uuid,
    pub source_url: String,
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    pub platform: Option<String>,
    pub status: ImageStatus,
    /// Short machine-readable reason when `status == failed` or the `no_face`
    /// sub-reason `multiple_faces`.
    pub status_reason: Option<String>,
    pub discovered_at: DateTime<Utc>,
}

/// A 512-dim vector extracted from a `DiscoveredImage` by the face detector,
/// kept for a bounded retention window (see cleanup class thresholds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredFaceEmbedding {
    pub id: Uuid,
    pub discovered_image_id: Uuid,
    pub vector: Vec<f32>,
    pub detection_score: f32,
    pub created_at: DateTime<Utc>,
}
