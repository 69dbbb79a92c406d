// [libs/infra/db/src/repositories/job/mod.rs]
/*!
 * =================================================================
 * APARATO: JOB REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DEL CICLO DE VIDA DE SCAN JOBS
 *
 * # Mathematical Proof (Lease Exclusivity):
 * `lease()` is a single UPDATE guarded by `lease_state != 'running'`; the
 * row either transitions or the statement affects zero rows. There is no
 * read-then-write window in which two schedulers could observe the same
 * idle job and both believe they hold it.
 * =================================================================
 */

pub mod queries;

use crate::errors::DbError;
use crate::repositories::mapping::{parse_timestamp, parse_uuid};
use chrono::{DateTime, Duration, Utc};
use libsql::{params, Connection};
use sentinel_domain_models::job::{JobKind, LeaseState, ScanJob};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use self::queries as sql;

/// Default staleness window past which a `running` job is presumed dead.
pub const DEFAULT_STALE_HEARTBEAT_MINUTES: i64 = 30;

pub struct JobRepository {
    connection: Connection,
}

impl JobRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// Registers a job definition if absent, or refreshes its interval if
    /// present. Idempotent: safe to call on every scheduler startup.
    #[instrument(skip(self))]
    pub async fn upsert_definition(
        &self,
        kind: JobKind,
        target: &str,
        interval_hours: i64,
    ) -> Result<(), DbError> {
        self.connection
            .execute(
                sql::UPSERT_JOB_DEFINITION,
                params![Uuid::new_v4().to_string(), kind.as_str(), target, interval_hours],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn due_jobs(
        &self,
        kind: JobKind,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ScanJob>, DbError> {
        let mut rows = self
            .connection
            .query(sql::FIND_DUE_JOBS, params![kind.as_str(), now.to_rfc3339(), limit])
            .await?;

        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await? {
            jobs.push(map_row_to_scan_job(&row)?);
        }
        Ok(jobs)
    }

    /// Atomic CAS: flips `lease_state` to `running`, stamps owner and
    /// heartbeat, and returns a freshly minted run id. Fails with
    /// `LeaseConflict` if the job was already running.
    #[instrument(skip(self, owner))]
    pub async fn lease(&self, job_id: Uuid, owner: &str, now: DateTime<Utc>) -> Result<Uuid, DbError> {
        let run_id = Uuid::new_v4();
        let affected = self
            .connection
            .execute(
                sql::LEASE_JOB,
                params![job_id.to_string(), owner, now.to_rfc3339(), run_id.to_string()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::LeaseConflict { job_id: job_id.to_string() });
        }

        info!(%job_id, %run_id, owner, "job leased");
        Ok(run_id)
    }

    #[instrument(skip(self))]
    pub async fn heartbeat(&self, run_id: Uuid, now: DateTime<Utc>) -> Result<(), DbError> {
        self.connection
            .execute(sql::HEARTBEAT_JOB, params![run_id.to_string(), now.to_rfc3339()])
            .await?;
        Ok(())
    }

    #[instrument(skip(self, result_summary))]
    pub async fn complete(
        &self,
        run_id: Uuid,
        result_summary: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.connection
            .execute(
                sql::COMPLETE_JOB,
                params![run_id.to_string(), now.to_rfc3339(), result_summary],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, reason))]
    pub async fn fail(&self, run_id: Uuid, reason: &str) -> Result<(), DbError> {
        self.connection
            .execute(sql::FAIL_JOB, params![run_id.to_string(), reason])
            .await?;
        Ok(())
    }

    /// Reclaims jobs stuck `running` with a stale heartbeat. Returns the
    /// count of rows transitioned, so the scheduler can log a non-zero
    /// recovery event distinctly from a clean startup.
    #[instrument(skip(self))]
    pub async fn recover_stale(&self, max_age: Duration) -> Result<u64, DbError> {
        let cutoff = Utc::now() - max_age;
        let affected = self
            .connection
            .execute(sql::RECOVER_STALE_JOBS, params![cutoff.to_rfc3339()])
            .await?;

        if affected > 0 {
            warn!(recovered = affected, "reclaimed stale running jobs");
        }
        Ok(affected)
    }

    /// Marks every job this process owns as `interrupted`, so another
    /// instance can pick it up after a graceful shutdown.
    #[instrument(skip(self, owner))]
    pub async fn interrupt_running(&self, owner: &str) -> Result<u64, DbError> {
        let affected = self
            .connection
            .execute(sql::INTERRUPT_RUNNING_JOBS_FOR_OWNER, params![owner])
            .await?;
        Ok(affected)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, job_id: Uuid) -> Result<ScanJob, DbError> {
        let mut rows = self
            .connection
            .query(sql::SELECT_JOB_BY_ID, params![job_id.to_string()])
            .await?;

        match rows.next().await? {
            Some(row) => map_row_to_scan_job(&row),
            None => Err(DbError::NotFound { entity: "scan_job", key: job_id.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TursoClient;

    async fn repository() -> JobRepository {
        let client = TursoClient::connect(":memory:", None).await.expect("in-memory connect");
        JobRepository::new(client.get_connection().expect("connection"))
    }

    #[tokio::test]
    async fn lease_is_exclusive() {
        let jobs = repository().await;
        jobs.upsert_definition(JobKind::ContributorScan, "contributor-a", 168).await.unwrap();
        let due = jobs.due_jobs(JobKind::ContributorScan, Utc::now(), 10).await.unwrap();
        let job_id = due[0].id;

        let first = jobs.lease(job_id, "scanner-1", Utc::now()).await;
        assert!(first.is_ok());

        let second = jobs.lease(job_id, "scanner-2", Utc::now()).await;
        assert!(matches!(second, Err(DbError::LeaseConflict { .. })));
    }

    #[tokio::test]
    async fn recover_stale_reclaims_jobs_past_the_max_age() {
        let jobs = repository().await;
        jobs.upsert_definition(JobKind::PlatformCrawl, "civitai", 24).await.unwrap();
        let due = jobs.due_jobs(JobKind::PlatformCrawl, Utc::now(), 10).await.unwrap();
        let job_id = due[0].id;

        // Lease with a heartbeat far enough in the past to be stale.
        jobs.lease(job_id, "scanner-1", Utc::now() - Duration::minutes(60)).await.unwrap();

        let recovered = jobs.recover_stale(Duration::minutes(30)).await.unwrap();
        assert_eq!(recovered, 1);

        let reloaded = jobs.get(job_id).await.unwrap();
        assert_eq!(reloaded.lease_state, LeaseState::Interrupted);
    }

    #[tokio::test]
    async fn recover_stale_leaves_fresh_leases_alone() {
        let jobs = repository().await;
        jobs.upsert_definition(JobKind::ContributorScan, "contributor-b", 168).await.unwrap();
        let due = jobs.due_jobs(JobKind::ContributorScan, Utc::now(), 10).await.unwrap();
        let job_id = due[0].id;
        jobs.lease(job_id, "scanner-1", Utc::now()).await.unwrap();

        let recovered = jobs.recover_stale(Duration::minutes(30)).await.unwrap();
        assert_eq!(recovered, 0);
    }

    #[tokio::test]
    async fn interrupt_running_only_affects_the_given_owner() {
        let jobs = repository().await;
        jobs.upsert_definition(JobKind::ContributorScan, "contributor-a", 168).await.unwrap();
        jobs.upsert_definition(JobKind::PlatformCrawl, "civitai", 24).await.unwrap();

        let scan_due = jobs.due_jobs(JobKind::ContributorScan, Utc::now(), 10).await.unwrap();
        let crawl_due = jobs.due_jobs(JobKind::PlatformCrawl, Utc::now(), 10).await.unwrap();
        jobs.lease(scan_due[0].id, "scanner-1", Utc::now()).await.unwrap();
        jobs.lease(crawl_due[0].id, "scanner-2", Utc::now()).await.unwrap();

        let interrupted = jobs.interrupt_running("scanner-1").await.unwrap();
        assert_eq!(interrupted, 1);

        assert_eq!(jobs.get(scan_due[0].id).await.unwrap().lease_state, LeaseState::Interrupted);
        assert_eq!(jobs.get(crawl_due[0].id).await.unwrap().lease_state, LeaseState::Running);
    }

    #[tokio::test]
    async fn complete_releases_the_lease_and_records_the_summary() {
        let jobs = repository().await;
        jobs.upsert_definition(JobKind::ContributorScan, "contributor-a", 168).await.unwrap();
        let due = jobs.due_jobs(JobKind::ContributorScan, Utc::now(), 10).await.unwrap();
        let job_id = due[0].id;
        let run_id = jobs.lease(job_id, "scanner-1", Utc::now()).await.unwrap();

        jobs.complete(run_id, "discovered=3 matched=1", Utc::now()).await.unwrap();

        // `complete` releases the lease back to idle (not a distinct
        // "completed" state) so the job is immediately eligible for its next
        // scheduled run once the interval elapses again.
        let reloaded = jobs.get(job_id).await.unwrap();
        assert_eq!(reloaded.lease_state, LeaseState::Idle);
        assert_eq!(reloaded.last_result_summary.as_deref(), Some("discovered=3 matched=1"));
    }

    #[tokio::test]
    async fn fail_marks_the_job_failed_without_blocking_other_jobs() {
        let jobs = repository().await;
        jobs.upsert_definition(JobKind::ContributorScan, "contributor-a", 168).await.unwrap();
        jobs.upsert_definition(JobKind::ContributorScan, "contributor-b", 168).await.unwrap();
        let due = jobs.due_jobs(JobKind::ContributorScan, Utc::now(), 10).await.unwrap();

        let failing_run = jobs.lease(due[0].id, "scanner-1", Utc::now()).await.unwrap();
        let ok_run = jobs.lease(due[1].id, "scanner-1", Utc::now()).await.unwrap();

        jobs.fail(failing_run, "simulated failure").await.unwrap();
        jobs.complete(ok_run, "discovered=0", Utc::now()).await.unwrap();

        assert_eq!(jobs.get(due[0].id).await.unwrap().lease_state, LeaseState::Failed);
        assert_eq!(jobs.get(due[1].id).await.unwrap().lease_state, LeaseState::Idle);
    }
}

fn map_row_to_scan_job(row: &libsql::Row) -> Result<ScanJob, DbError> {
    let id: String = row.get(0)?;
    let kind_raw: String = row.get(1)?;
    let target: String = row.get(2)?;
    let interval_hours: i64 = row.get(3)?;
    let last_run_at: Option<String> = row.get(4)?;
    let lease_state_raw: String = row.get(5)?;
    let lease_owner: Option<String> = row.get(6)?;
    let heartbeat_at: Option<String> = row.get(7)?;
    let run_id: Option<String> = row.get(8)?;
    let last_result_summary: Option<String> = row.get(9)?;

    Ok(ScanJob {
        id: parse_uuid(&id)?,
        kind: JobKind::from_str(&kind_raw)
            .ok_or_else(|| DbError::MappingError(format!("unknown job kind: {}", kind_raw)))?,
        target,
        interval_hours,
        last_run_at: last_run_at.map(|raw| parse_timestamp(&raw)).transpose()?,
        lease_state: LeaseState::from_str_or_idle(&lease_state_raw),
        lease_owner,
        heartbeat_at: heartbeat_at.map(|raw| parse_timestamp(&raw)).transpose()?,
        run_id: run_id.map(|raw| parse_uuid(&raw)).transpose()?,
        last_result_summary,
    })
}
