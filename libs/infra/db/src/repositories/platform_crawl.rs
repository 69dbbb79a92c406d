// [libs/infra/db/src/repositories/platform_crawl.rs]
/*!
 * Resumption state for a platform crawl source: a single row per platform,
 * upserted in whole after every crawl tick so a restart resumes exactly
 * where the previous tick left off.
 */

use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::platform_crawl::PlatformCrawlSchedule;
use std::collections::HashMap;
use tracing::instrument;

pub struct PlatformCrawlRepository {
    connection: Connection,
}

impl PlatformCrawlRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self, schedule))]
    pub async fn upsert(&self, schedule: &PlatformCrawlSchedule) -> Result<(), DbError> {
        let search_cursors_json = serde_json::to_string(&schedule.search_cursors)
            .map_err(|e| DbError::MappingError(format!("search cursors serialization failed: {}", e)))?;
        let model_cursors_json = serde_json::to_string(&schedule.model_cursors)
            .map_err(|e| DbError::MappingError(format!("model cursors serialization failed: {}", e)))?;

        self.connection
            .execute(
                "INSERT INTO platform_crawl_schedule (
                    platform, interval_hours, cursor, search_cursors_json, model_cursors_json,
                    tags_total, tags_exhausted
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(platform) DO UPDATE SET
                    interval_hours = excluded.interval_hours,
                    cursor = excluded.cursor,
                    search_cursors_json = excluded.search_cursors_json,
                    model_cursors_json = excluded.model_cursors_json,
                    tags_total = excluded.tags_total,
                    tags_exhausted = excluded.tags_exhausted",
                params![
                    schedule.platform.clone(),
                    schedule.interval_hours,
                    schedule.cursor.clone(),
                    search_cursors_json,
                    model_cursors_json,
                    schedule.tags_total,
                    schedule.tags_exhausted,
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, platform: &str) -> Result<Option<PlatformCrawlSchedule>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT platform, interval_hours, cursor, search_cursors_json, model_cursors_json,
                        tags_total, tags_exhausted
                 FROM platform_crawl_schedule WHERE platform = ?1",
                params![platform],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let platform: String = row.get(0)?;
        let interval_hours: i64 = row.get(1)?;
        let cursor: Option<String> = row.get(2)?;
        let search_cursors_json: String = row.get(3)?;
        let model_cursors_json: String = row.get(4)?;
        let tags_total: i64 = row.get(5)?;
        let tags_exhausted: i64 = row.get(6)?;

        let search_cursors: HashMap<String, String> = serde_json::from_str(&search_cursors_json)
            .map_err(|e| DbError::MappingError(format!("search cursors deserialization failed: {}", e)))?;
        let model_cursors: HashMap<String, String> = serde_json::from_str(&model_cursors_json)
            .map_err(|e| DbError::MappingError(format!("model cursors deserialization failed: {}", e)))?;

        Ok(Some(PlatformCrawlSchedule {
            platform,
            interval_hours,
            cursor,
            search_cursors,
            model_cursors,
            tags_total: tags_total as u32,
            tags_exhausted: tags_exhausted as u32,
        }))
    }
}
