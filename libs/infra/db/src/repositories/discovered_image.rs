// [libs/infra/db/src/repositories/discovered_image.rs]
/*!
 * Candidate images surfaced by discovery sources, and the face embeddings
 * the ingestion stage extracts from them. Status writes here are exclusive
 * per §3: ingestion writes `{no_face, has_face, embedded, failed}`, matching
 * writes `{matched, no_match}`. `discovered_images.source_url` carries a
 * `UNIQUE` constraint; `insert_pending` relies on it to dedup at the
 * database rather than racing a check-then-insert across concurrent
 * discovery sources.
 */

use super::mapping::{parse_timestamp, parse_uuid};
use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::image::{DiscoveredFaceEmbedding, DiscoveredImage, ImageStatus};
use tracing::instrument;
use uuid::Uuid;

pub struct DiscoveredImageRepository {
    connection: Connection,
}

impl DiscoveredImageRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Inserts a candidate as `pending` unless its `source_url` is already
    /// on file, in which case the insert is a no-op. Returns whether a new
    /// row was actually inserted, so a caller tallying a discovery run's
    /// yield only counts genuinely new candidates.
    #[instrument(skip(self, page_title))]
    pub async fn insert_pending(
        &self,
        source_url: &str,
        page_url: Option<&str>,
        page_title: Option<&str>,
        platform: Option<&str>,
    ) -> Result<bool, DbError> {
        let id = Uuid::new_v4();
        let affected = self
            .connection
            .execute(
                "INSERT INTO discovered_images (id, source_url, page_url, page_title, platform, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending')
                 ON CONFLICT(source_url) DO NOTHING",
                params![id.to_string(), source_url, page_url, page_title, platform],
            )
            .await?;
        Ok(affected > 0)
    }

    #[instrument(skip(self))]
    pub async fn pending(&self, limit: i64) -> Result<Vec<DiscoveredImage>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, source_url, page_url, page_title, platform, status, status_reason, discovered_at
                 FROM discovered_images WHERE status = 'pending' ORDER BY discovered_at ASC LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut images = Vec::new();
        while let Some(row) = rows.next().await? {
            images.push(map_row_to_image(&row)?);
        }
        Ok(images)
    }

    #[instrument(skip(self, reason))]
    pub async fn set_status(
        &self,
        image_id: Uuid,
        status: ImageStatus,
        reason: Option<&str>,
    ) -> Result<(), DbError> {
        self.connection
            .execute(
                "UPDATE discovered_images SET status = ?2, status_reason = ?3 WHERE id = ?1",
                params![image_id.to_string(), status.as_str(), reason],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, vector))]
    pub async fn insert_face_embedding(
        &self,
        discovered_image_id: Uuid,
        vector: &[f32],
        detection_score: f32,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let vector_json = serde_json::to_string(vector)
            .map_err(|e| DbError::MappingError(format!("face embedding serialization failed: {}", e)))?;

        self.connection
            .execute(
                "INSERT INTO discovered_face_embeddings (id, discovered_image_id, vector_json, detection_score)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id.to_string(), discovered_image_id.to_string(), vector_json, detection_score],
            )
            .await?;
        Ok(id)
    }

    /// Distinct `page_url` values on file, for the link-harvest source's
    /// domain-mining pass. A `page_url` is `NULL` for sources (notably
    /// `url_check`) that never observed a referring page.
    #[instrument(skip(self))]
    pub async fn distinct_page_urls(&self, limit: i64) -> Result<Vec<String>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT DISTINCT page_url FROM discovered_images WHERE page_url IS NOT NULL LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut urls = Vec::new();
        while let Some(row) = rows.next().await? {
            urls.push(row.get::<String>(0)?);
        }
        Ok(urls)
    }

    #[instrument(skip(self))]
    pub async fn embedded(&self, limit: i64) -> Result<Vec<(DiscoveredImage, DiscoveredFaceEmbedding)>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT i.id, i.source_url, i.page_url, i.page_title, i.platform, i.status, i.status_reason, i.discovered_at,
                        f.id, f.discovered_image_id, f.vector_json, f.detection_score, f.created_at
                 FROM discovered_images i
                 JOIN discovered_face_embeddings f ON f.discovered_image_id = i.id
                 WHERE i.status = 'embedded'
                 ORDER BY i.discovered_at ASC
                 LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut pairs = Vec::new();
        while let Some(row) = rows.next().await? {
            let image = map_row_to_image(&row)?;

            let face_id: String = row.get(8)?;
            let face_image_id: String = row.get(9)?;
            let vector_json: String = row.get(10)?;
            let detection_score: f32 = row.get::<f64>(11)? as f32;
            let face_created_at: String = row.get(12)?;
            let vector: Vec<f32> = serde_json::from_str(&vector_json)
                .map_err(|e| DbError::MappingError(format!("face embedding deserialization failed: {}", e)))?;

            let face = DiscoveredFaceEmbedding {
                id: parse_uuid(&face_id)?,
                discovered_image_id: parse_uuid(&face_image_id)?,
                vector,
                detection_score,
                created_at: parse_timestamp(&face_created_at)?,
            };

            pairs.push((image, face));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TursoClient;

    async fn repository() -> DiscoveredImageRepository {
        let client = TursoClient::connect(":memory:", None).await.expect("in-memory connect");
        DiscoveredImageRepository::new(client.get_connection().expect("connection"))
    }

    #[tokio::test]
    async fn insert_pending_is_a_no_op_for_a_duplicate_source_url() {
        let images = repository().await;

        let first = images.insert_pending("https://example.com/a.jpg", None, None, None).await.unwrap();
        let second = images.insert_pending("https://example.com/a.jpg", Some("https://example.com/page"), None, None).await.unwrap();

        assert!(first);
        assert!(!second);

        let pending = images.pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].page_url.is_none(), "the first insert's row wins, the duplicate is dropped");
    }

    #[tokio::test]
    async fn distinct_page_urls_excludes_nulls_and_duplicates() {
        let images = repository().await;
        images.insert_pending("https://a.example/1.jpg", Some("https://host.example/p1"), None, None).await.unwrap();
        images.insert_pending("https://a.example/2.jpg", Some("https://host.example/p1"), None, None).await.unwrap();
        images.insert_pending("https://a.example/3.jpg", None, None, None).await.unwrap();

        let urls = images.distinct_page_urls(10).await.unwrap();
        assert_eq!(urls, vec!["https://host.example/p1".to_string()]);
    }
}

fn map_row_to_image(row: &libsql::Row) -> Result<DiscoveredImage, DbError> {
    let id: String = row.get(0)?;
    let source_url: String = row.get(1)?;
    let page_url: Option<String> = row.get(2)?;
    let page_title: Option<String> = row.get(3)?;
    let platform: Option<String> = row.get(4)?;
    let status_raw: String = row.get(5)?;
    let status_reason: Option<String> = row.get(6)?;
    let discovered_at: String = row.get(7)?;

    Ok(DiscoveredImage {
        id: parse_uuid(&id)?,
        source_url,
        page_url,
        page_title,
        platform,
        status: ImageStatus::from_str_or_pending(&status_raw),
        status_reason,
        discovered_at: parse_timestamp(&discovered_at)?,
    })
}
