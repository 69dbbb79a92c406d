// [libs/domain/models/src/matching.rs]
/*!
 * The link between a discovered face and a contributor: raw similarity,
 * the confidence tier it maps to, and the human review lifecycle.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    New,
    Confirmed,
    Rejected,
    Dismissed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Dismissed => "dismissed",
        }
    }

    /// Maps an admin review action to the feedback signal it emits, per the
    /// review-signal table. Unknown statuses are handled by the caller
    /// (logged and dropped), not here.
    pub fn to_feedback_signal_type(&self) -> Option<&'static str> {
        match self {
            Self::Confirmed => Some("match_confirmed"),
            Self::Rejected | Self::Dismissed => Some("match_dismissed"),
            Self::New => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub discovered_image_id: Uuid,
    pub discovered_face_embedding_id: Uuid,
    pub similarity: f32,
    pub confidence_tier: ConfidenceTier,
    pub known_account: bool,
    pub ai_generated: Option<bool>,
    pub ai_detection_score: Option<f32>,
    pub review_status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}
