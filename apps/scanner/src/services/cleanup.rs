// [apps/scanner/src/services/cleanup.rs]
/*!
 * =================================================================
 * APARATO: RETENTION CLEANUP SERVICE
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: PURGA PERIÓDICA DE REGISTROS EXPIRADOS
 *
 * Runs on its own hourly ticker rather than through the scan job lease
 * mechanism: `CleanupRepository::run` is a single-instance idempotent
 * sweep with no per-target state to resume, so the lease/heartbeat
 * machinery the scheduler provides for discovery and matching jobs would
 * add nothing here.
 * =================================================================
 */

use sentinel_infra_db::repositories::CleanupRepository;
use sentinel_infra_db::TursoClient;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[instrument(skip(database_client))]
pub fn spawn_cleanup_service(database_client: TursoClient) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            run_once(&database_client).await;
        }
    })
}

async fn run_once(database_client: &TursoClient) {
    let connection = match database_client.get_connection() {
        Ok(connection) => connection,
        Err(error) => {
            error!(%error, "cleanup sweep failed to acquire a connection");
            return;
        }
    };

    let repository = CleanupRepository::new(connection);
    let summary = repository.run(chrono::Utc::now()).await;
    info!(
        no_face_images_deleted = summary.no_face_images_deleted,
        no_match_images_deleted = summary.no_match_images_deleted,
        face_embeddings_deleted = summary.face_embeddings_deleted,
        terminal_scan_jobs_deleted = summary.terminal_scan_jobs_deleted,
        read_notifications_deleted = summary.read_notifications_deleted,
        "retention cleanup sweep complete"
    );
}
