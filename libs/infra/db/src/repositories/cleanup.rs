// [libs/infra/db/src/repositories/cleanup.rs]
/*!
 * =================================================================
 * APARATO: RETENTION SWEEPER
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PURGA DE FILAS EXPIRADAS POR CLASE DE RETENCIÓN
 *
 * Each class runs in its own transaction so a failure in one never blocks
 * the others; the caller gets a per-class count, including zero, so an
 * empty run is distinguishable from a failed one.
 * =================================================================
 */

use crate::errors::DbError;
use chrono::{DateTime, Duration, Utc};
use libsql::{params, Connection};
use tracing::{info, instrument, warn};

pub const NO_FACE_RETENTION: Duration = Duration::days(7);
pub const NO_MATCH_RETENTION: Duration = Duration::days(30);
pub const FACE_EMBEDDING_RETENTION: Duration = Duration::days(60);
pub const TERMINAL_SCAN_JOB_RETENTION: Duration = Duration::days(30);
pub const READ_NOTIFICATION_RETENTION: Duration = Duration::days(90);

#[derive(Debug, Clone, Default)]
pub struct CleanupSummary {
    pub no_face_images_deleted: u64,
    pub no_match_images_deleted: u64,
    pub face_embeddings_deleted: u64,
    pub terminal_scan_jobs_deleted: u64,
    pub read_notifications_deleted: u64,
}

pub struct CleanupRepository {
    connection: Connection,
}

impl CleanupRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> CleanupSummary {
        let mut summary = CleanupSummary::default();

        match self.delete_before(
            "DELETE FROM discovered_images WHERE status = 'no_face' AND discovered_at < ?1",
            now - NO_FACE_RETENTION,
        ).await {
            Ok(count) => summary.no_face_images_deleted = count,
            Err(error) => warn!(%error, "cleanup class 'no_face images' failed"),
        }

        match self.delete_before(
            "DELETE FROM discovered_images WHERE status = 'no_match' AND discovered_at < ?1",
            now - NO_MATCH_RETENTION,
        ).await {
            Ok(count) => summary.no_match_images_deleted = count,
            Err(error) => warn!(%error, "cleanup class 'no_match images' failed"),
        }

        match self.delete_before(
            "DELETE FROM discovered_face_embeddings WHERE created_at < ?1",
            now - FACE_EMBEDDING_RETENTION,
        ).await {
            Ok(count) => summary.face_embeddings_deleted = count,
            Err(error) => warn!(%error, "cleanup class 'face embeddings' failed"),
        }

        match self.delete_before(
            "DELETE FROM scan_jobs WHERE lease_state IN ('completed', 'failed') AND last_run_at < ?1",
            now - TERMINAL_SCAN_JOB_RETENTION,
        ).await {
            Ok(count) => summary.terminal_scan_jobs_deleted = count,
            Err(error) => warn!(%error, "cleanup class 'terminal scan jobs' failed"),
        }

        match self.delete_before(
            "DELETE FROM notifications WHERE read_at IS NOT NULL AND read_at < ?1",
            now - READ_NOTIFICATION_RETENTION,
        ).await {
            Ok(count) => summary.read_notifications_deleted = count,
            Err(error) => warn!(%error, "cleanup class 'read notifications' failed"),
        }

        info!(
            no_face = summary.no_face_images_deleted,
            no_match = summary.no_match_images_deleted,
            face_embeddings = summary.face_embeddings_deleted,
            scan_jobs = summary.terminal_scan_jobs_deleted,
            notifications = summary.read_notifications_deleted,
            "cleanup sweep finished"
        );

        summary
    }

    async fn delete_before(&self, sql: &str, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        let tx = self
            .connection
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        let affected = tx.execute(sql, params![cutoff.to_rfc3339()]).await?;
        tx.commit().await.map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(affected)
    }
}
