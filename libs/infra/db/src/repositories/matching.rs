// [libs/infra/db/src/repositories/matching.rs]
/*!
 * Match rows: persisted unconditionally for every candidate the scorer
 * assigns a tier to (§4.E step 3), then mutated in place as the AI
 * detection verdict and review status arrive.
 */

use super::mapping::{parse_timestamp, parse_uuid};
use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::matching::{ConfidenceTier, Match, ReviewStatus};
use tracing::instrument;
use uuid::Uuid;

pub struct MatchRepository {
    connection: Connection,
}

impl MatchRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn insert(&self, candidate: &Match) -> Result<(), DbError> {
        self.connection
            .execute(
                "INSERT INTO matches (
                    id, contributor_id, discovered_image_id, discovered_face_embedding_id,
                    similarity, confidence_tier, known_account, ai_generated, ai_detection_score,
                    review_status, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    candidate.id.to_string(),
                    candidate.contributor_id.to_string(),
                    candidate.discovered_image_id.to_string(),
                    candidate.discovered_face_embedding_id.to_string(),
                    candidate.similarity,
                    candidate.confidence_tier.as_str(),
                    candidate.known_account as i64,
                    candidate.ai_generated.map(|v| v as i64),
                    candidate.ai_detection_score,
                    candidate.review_status.as_str(),
                    candidate.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn record_ai_detection_verdict(
        &self,
        match_id: Uuid,
        is_ai_generated: bool,
        score: f32,
    ) -> Result<(), DbError> {
        self.connection
            .execute(
                "UPDATE matches SET ai_generated = ?2, ai_detection_score = ?3 WHERE id = ?1",
                params![match_id.to_string(), is_ai_generated as i64, score],
            )
            .await?;
        Ok(())
    }

    /// Unknown `ReviewStatus` values never reach here because the enum is
    /// closed; the policy-drop case the spec describes applies at the admin
    /// surface's parsing boundary, before this call.
    #[instrument(skip(self))]
    pub async fn set_review_status(&self, match_id: Uuid, status: ReviewStatus) -> Result<(), DbError> {
        let affected = self
            .connection
            .execute(
                "UPDATE matches SET review_status = ?2 WHERE id = ?1",
                params![match_id.to_string(), status.as_str()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::NotFound { entity: "match", key: match_id.to_string() });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, match_id: Uuid) -> Result<Match, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, contributor_id, discovered_image_id, discovered_face_embedding_id,
                        similarity, confidence_tier, known_account, ai_generated, ai_detection_score,
                        review_status, created_at
                 FROM matches WHERE id = ?1",
                params![match_id.to_string()],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| DbError::NotFound { entity: "match", key: match_id.to_string() })?;
        map_row_to_match(&row)
    }

    #[instrument(skip(self))]
    pub async fn recent_for_contributor(&self, contributor_id: Uuid, limit: i64) -> Result<Vec<Match>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, contributor_id, discovered_image_id, discovered_face_embedding_id,
                        similarity, confidence_tier, known_account, ai_generated, ai_detection_score,
                        review_status, created_at
                 FROM matches WHERE contributor_id = ?1 ORDER BY created_at DESC LIMIT ?2",
                params![contributor_id.to_string(), limit],
            )
            .await?;

        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(map_row_to_match(&row)?);
        }
        Ok(matches)
    }
}

fn map_row_to_match(row: &libsql::Row) -> Result<Match, DbError> {
    let id: String = row.get(0)?;
    let contributor_id: String = row.get(1)?;
    let discovered_image_id: String = row.get(2)?;
    let discovered_face_embedding_id: String = row.get(3)?;
    let similarity: f32 = row.get::<f64>(4)? as f32;
    let confidence_tier_raw: String = row.get(5)?;
    let known_account: i64 = row.get(6)?;
    let ai_generated: Option<i64> = row.get(7)?;
    let ai_detection_score: Option<f32> = row.get::<Option<f64>>(8)?.map(|v| v as f32);
    let review_status_raw: String = row.get(9)?;
    let created_at: String = row.get(10)?;

    Ok(Match {
        id: parse_uuid(&id)?,
        contributor_id: parse_uuid(&contributor_id)?,
        discovered_image_id: parse_uuid(&discovered_image_id)?,
        discovered_face_embedding_id: parse_uuid(&discovered_face_embedding_id)?,
        similarity,
        confidence_tier: parse_confidence_tier(&confidence_tier_raw)?,
        known_account: known_account != 0,
        ai_generated: ai_generated.map(|v| v != 0),
        ai_detection_score,
        review_status: parse_review_status(&review_status_raw)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn parse_confidence_tier(raw: &str) -> Result<ConfidenceTier, DbError> {
    match raw {
        "low" => Ok(ConfidenceTier::Low),
        "medium" => Ok(ConfidenceTier::Medium),
        "high" => Ok(ConfidenceTier::High),
        other => Err(DbError::MappingError(format!("unknown confidence tier: {}", other))),
    }
}

fn parse_review_status(raw: &str) -> Result<ReviewStatus, DbError> {
    match raw {
        "new" => Ok(ReviewStatus::New),
        "confirmed" => Ok(ReviewStatus::Confirmed),
        "rejected" => Ok(ReviewStatus::Rejected),
        "dismissed" => Ok(ReviewStatus::Dismissed),
        other => Err(DbError::MappingError(format!("unknown review status: {}", other))),
    }
}
