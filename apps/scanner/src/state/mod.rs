// [apps/scanner/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SCANNER APPLICATION STATE
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: COMPOSITION ROOT PARA EL HEALTH ENDPOINT Y LOS DAEMONS
 * =================================================================
 */

use crate::config::ScannerConfig;
use crate::services::observer::Observer;
use chrono::{DateTime, Utc};
use sentinel_core_providers::ProviderRegistry;
use sentinel_core_resilience::CIRCUIT_BREAKERS;
use sentinel_infra_db::repositories::{DiscoveredImageRepository, JobRepository};
use sentinel_infra_db::TursoClient;
use sentinel_domain_models::job::JobKind;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Gates the health endpoint and (by extension) load balancers that key off
/// it. Does not stop the scheduler or observer, only the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

#[derive(Clone)]
pub struct AppState {
    pub database_client: TursoClient,
    pub config: Arc<ScannerConfig>,
    pub providers: ProviderRegistry,
    pub observer: Arc<Observer>,
    current_system_mode: Arc<RwLock<SystemMode>>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        database_client: TursoClient,
        config: Arc<ScannerConfig>,
        providers: ProviderRegistry,
        observer: Arc<Observer>,
    ) -> Self {
        Self {
            database_client,
            config,
            providers,
            observer,
            current_system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }

    pub fn set_mode(&self, mode: SystemMode) {
        match self.current_system_mode.write() {
            Ok(mut guard) => {
                info!(?mode, "system mode changed");
                *guard = mode;
            }
            Err(poisoned) => warn!(%poisoned, "system mode lock poisoned"),
        }
    }

    pub fn is_operational(&self) -> Result<(), String> {
        let guard = self
            .current_system_mode
            .read()
            .map_err(|e| format!("system mode lock poisoned: {}", e))?;
        match &*guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => Err(reason.clone()),
        }
    }

    /// Best-effort snapshot for `GET /health`. A database error degrades
    /// individual fields to `None` rather than failing the whole response.
    pub async fn health_metrics(&self) -> HealthMetrics {
        HealthMetrics {
            pending_image_count: self.count_pending_images().await,
            due_job_count: self.count_due_jobs().await,
            open_circuit_breakers: CIRCUIT_BREAKERS.open_service_names(),
        }
    }

    /// `pending()` returns the rows themselves rather than a count; a
    /// dedicated `COUNT(*)` query would be cheaper but the repository only
    /// exposes what the ingestion stage itself needs.
    async fn count_pending_images(&self) -> Option<u64> {
        let conn = self.database_client.get_connection().ok()?;
        let repository = DiscoveredImageRepository::new(conn);
        repository.pending(self.config.due_job_fetch_limit.max(1)).await.ok().map(|rows| rows.len() as u64)
    }

    async fn count_due_jobs(&self) -> Option<u64> {
        let conn = self.database_client.get_connection().ok()?;
        let repository = JobRepository::new(conn);
        let mut total = 0u64;
        for kind in [JobKind::ContributorScan, JobKind::PlatformCrawl] {
            match repository.due_jobs(kind, Utc::now(), self.config.due_job_fetch_limit).await {
                Ok(jobs) => total += jobs.len() as u64,
                Err(error) => {
                    warn!(%error, "failed to count due jobs for health snapshot");
                    return None;
                }
            }
        }
        Some(total)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthMetrics {
    pub pending_image_count: Option<u64>,
    pub due_job_count: Option<u64>,
    pub open_circuit_breakers: Vec<String>,
}
