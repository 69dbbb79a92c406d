// [libs/domain/models/src/contributor.rs]
/*!
 * Contributor identity, subscription tier, reference embeddings and the
 * known-account allowlist used to suppress self-matches downstream.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription class. Controls which pipeline stages run and at what cadence
/// (see `sentinel_domain_models::tier_config::TierConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorTier {
    Free,
    Protected,
    Premium,
}

impl ContributorTier {
    /// An unrecognized tier string falls back to `free` rather than erroring.
    pub fn parse_or_free(raw: &str) -> Self {
        match raw {
            "protected" => Self::Protected,
            "premium" => Self::Premium,
            "free" => Self::Free,
            _ => Self::Free,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub id: Uuid,
    pub display_name: String,
    pub tier: ContributorTier,
    pub created_at: DateTime<Utc>,
}

/// A unit-norm 512-dimensional reference face vector owned by a contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub vector: Vec<f32>,
    pub primary: bool,
    pub created_at: DateTime<Utc>,
}

impl Embedding {
    pub const DIMENSIONS: usize = 512;

    /// L2 norm of the stored vector; callers assert this is within 1e-3 of 1.0.
    pub fn l2_norm(&self) -> f32 {
        self.vector.iter().map(|component| component * component).sum::<f32>().sqrt()
    }
}

/// A platform account a contributor has declared as their own. Matches against
/// known accounts are persisted but never trigger AI detection, evidence
/// capture, or notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownAccount {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub platform: Option<String>,
    pub handle: Option<String>,
    pub domain: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tier_falls_back_to_free() {
        assert_eq!(ContributorTier::parse_or_free("enterprise"), ContributorTier::Free);
        assert_eq!(ContributorTier::parse_or_free("premium"), ContributorTier::Premium);
    }

    #[test]
    fn l2_norm_of_unit_vector_is_one() {
        let mut vector = vec![0.0_f32; Embedding::DIMENSIONS];
        vector[0] = 1.0;
        let embedding = Embedding {
            id: Uuid::new_v4(),
            contributor_id: Uuid::new_v4(),
            vector,
            primary: true,
            created_at: Utc::now(),
        };
        assert!((embedding.l2_norm() - 1.0).abs() < 1e-6);
    }
}
