// [libs/infra/db/src/repositories/takedown.rs]
/*!
 * Drafted takedown notices. Submission is a human-driven transition out of
 * scope for this repository; it only records the drafted body and flips
 * the status once told the notice went out.
 */

use super::mapping::{parse_timestamp, parse_uuid};
use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::takedown::{Takedown, TakedownStatus};
use tracing::instrument;
use uuid::Uuid;

pub struct TakedownRepository {
    connection: Connection,
}

impl TakedownRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, notice_body))]
    pub async fn insert_pending(&self, match_id: Uuid, notice_body: &str) -> Result<Takedown, DbError> {
        let takedown = Takedown {
            id: Uuid::new_v4(),
            match_id,
            notice_body: notice_body.to_string(),
            status: TakedownStatus::Pending,
            created_at: chrono::Utc::now(),
        };

        self.connection
            .execute(
                "INSERT INTO takedowns (id, match_id, notice_body, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    takedown.id.to_string(),
                    takedown.match_id.to_string(),
                    takedown.notice_body.clone(),
                    "pending",
                    takedown.created_at.to_rfc3339(),
                ],
            )
            .await?;

        Ok(takedown)
    }

    #[instrument(skip(self))]
    pub async fn mark_submitted(&self, takedown_id: Uuid) -> Result<(), DbError> {
        let affected = self
            .connection
            .execute(
                "UPDATE takedowns SET status = 'submitted' WHERE id = ?1",
                params![takedown_id.to_string()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::NotFound { entity: "takedown", key: takedown_id.to_string() });
        }
        Ok(())
    }

    /// Source URLs of a contributor's already-submitted takedowns, for the
    /// `url_check` source's re-check pass: a submitted notice doesn't
    /// guarantee the host actually removed the content.
    #[instrument(skip(self))]
    pub async fn submitted_source_urls_for_contributor(&self, contributor_id: Uuid) -> Result<Vec<String>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT di.source_url
                 FROM takedowns t
                 JOIN matches m ON m.id = t.match_id
                 JOIN discovered_images di ON di.id = m.discovered_image_id
                 WHERE t.status = 'submitted' AND m.contributor_id = ?1",
                params![contributor_id.to_string()],
            )
            .await?;

        let mut urls = Vec::new();
        while let Some(row) = rows.next().await? {
            urls.push(row.get::<String>(0)?);
        }
        Ok(urls)
    }

    #[instrument(skip(self))]
    pub async fn pending(&self, limit: i64) -> Result<Vec<Takedown>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, match_id, notice_body, status, created_at
                 FROM takedowns WHERE status = 'pending' ORDER BY created_at ASC LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut takedowns = Vec::new();
        while let Some(row) = rows.next().await? {
            takedowns.push(map_row_to_takedown(&row)?);
        }
        Ok(takedowns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TursoClient;

    async fn repository() -> TakedownRepository {
        let client = TursoClient::connect(":memory:", None).await.expect("in-memory connect");
        TakedownRepository::new(client.get_connection().expect("connection"))
    }

    /// Seeds the full chain a takedown hangs off: a discovered image + face
    /// embedding and a match against `contributor_id`, creating that
    /// contributor first if `None`. Returns `(contributor_id, match_id)`.
    async fn seed_match(takedowns: &TakedownRepository, contributor_id: Option<Uuid>, source_url: &str) -> (Uuid, Uuid) {
        let contributor_id = match contributor_id {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                takedowns
                    .connection
                    .execute(
                        "INSERT INTO contributors (id, display_name, tier) VALUES (?1, 'seed', 'free')",
                        params![id.to_string()],
                    )
                    .await
                    .unwrap();
                id
            }
        };

        let image_id = Uuid::new_v4();
        takedowns
            .connection
            .execute(
                "INSERT INTO discovered_images (id, source_url, status) VALUES (?1, ?2, 'matched')",
                params![image_id.to_string(), source_url],
            )
            .await
            .unwrap();

        let face_id = Uuid::new_v4();
        takedowns
            .connection
            .execute(
                "INSERT INTO discovered_face_embeddings (id, discovered_image_id, vector_json, detection_score)
                 VALUES (?1, ?2, '[]', 0.9)",
                params![face_id.to_string(), image_id.to_string()],
            )
            .await
            .unwrap();

        let match_id = Uuid::new_v4();
        takedowns
            .connection
            .execute(
                "INSERT INTO matches (id, contributor_id, discovered_image_id, discovered_face_embedding_id, similarity, confidence_tier)
                 VALUES (?1, ?2, ?3, ?4, 0.9, 'high')",
                params![match_id.to_string(), contributor_id.to_string(), image_id.to_string(), face_id.to_string()],
            )
            .await
            .unwrap();

        (contributor_id, match_id)
    }

    #[tokio::test]
    async fn insert_pending_then_mark_submitted_round_trips_status() {
        let takedowns = repository().await;
        let (_, match_id) = seed_match(&takedowns, None, "https://example.com/a.jpg").await;

        let takedown = takedowns.insert_pending(match_id, "notice body").await.unwrap();
        assert_eq!(takedown.status, TakedownStatus::Pending);

        takedowns.mark_submitted(takedown.id).await.unwrap();
        assert!(takedowns.pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submitted_source_urls_for_contributor_excludes_still_pending_notices() {
        let takedowns = repository().await;
        let (contributor_id, submitted_match) = seed_match(&takedowns, None, "https://example.com/submitted.jpg").await;
        let (_, pending_match) = seed_match(&takedowns, Some(contributor_id), "https://example.com/pending.jpg").await;

        let submitted = takedowns.insert_pending(submitted_match, "notice").await.unwrap();
        takedowns.mark_submitted(submitted.id).await.unwrap();
        takedowns.insert_pending(pending_match, "notice").await.unwrap();

        let urls = takedowns.submitted_source_urls_for_contributor(contributor_id).await.unwrap();
        assert_eq!(urls, vec!["https://example.com/submitted.jpg".to_string()]);
    }
}

fn map_row_to_takedown(row: &libsql::Row) -> Result<Takedown, DbError> {
    let id: String = row.get(0)?;
    let match_id: String = row.get(1)?;
    let notice_body: String = row.get(2)?;
    let status_raw: String = row.get(3)?;
    let created_at: String = row.get(4)?;

    let status = match status_raw.as_str() {
        "pending" => TakedownStatus::Pending,
        "submitted" => TakedownStatus::Submitted,
        other => return Err(DbError::MappingError(format!("unknown takedown status: {}", other))),
    };

    Ok(Takedown {
        id: parse_uuid(&id)?,
        match_id: parse_uuid(&match_id)?,
        notice_body,
        status,
        created_at: parse_timestamp(&created_at)?,
    })
}
