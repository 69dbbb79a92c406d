// [libs/infra/db/src/repositories/job/queries.rs]
/*!
 * SQL text for the scan job ledger, split out from the repository logic so
 * the statements can be read and audited as a single block.
 */

pub const UPSERT_JOB_DEFINITION: &str = r#"
    INSERT INTO scan_jobs (id, kind, target, interval_hours, lease_state)
    VALUES (?1, ?2, ?3, ?4, 'idle')
    ON CONFLICT(kind, target) DO UPDATE SET interval_hours = excluded.interval_hours
"#;

/// Rows due for a run: not currently running, and either never run or past
/// their interval. Ordered oldest-due-first with NULL (never run) sorting
/// first.
pub const FIND_DUE_JOBS: &str = r#"
    SELECT id, kind, target, interval_hours, last_run_at, lease_state,
           lease_owner, heartbeat_at, run_id, last_result_summary
    FROM scan_jobs
    WHERE kind = ?1
      AND lease_state IN ('idle', 'failed', 'interrupted')
      AND (last_run_at IS NULL OR datetime(last_run_at, '+' || interval_hours || ' hours') <= ?2)
    ORDER BY last_run_at ASC NULLS FIRST
    LIMIT ?3
"#;

/// Atomic CAS: only succeeds if the job is not currently running.
pub const LEASE_JOB: &str = r#"
    UPDATE scan_jobs
    SET lease_state = 'running', lease_owner = ?2, heartbeat_at = ?3, run_id = ?4
    WHERE id = ?1 AND lease_state != 'running'
"#;

pub const HEARTBEAT_JOB: &str = r#"
    UPDATE scan_jobs
    SET heartbeat_at = ?2
    WHERE run_id = ?1 AND lease_state = 'running'
"#;

pub const COMPLETE_JOB: &str = r#"
    UPDATE scan_jobs
    SET lease_state = 'idle', last_run_at = ?2, last_result_summary = ?3,
        lease_owner = NULL, heartbeat_at = NULL, run_id = NULL
    WHERE run_id = ?1
"#;

pub const FAIL_JOB: &str = r#"
    UPDATE scan_jobs
    SET lease_state = 'failed', last_result_summary = ?2,
        lease_owner = NULL, heartbeat_at = NULL, run_id = NULL
    WHERE run_id = ?1
"#;

/// Jobs stuck `running` past the stale-heartbeat threshold are reclaimable.
pub const RECOVER_STALE_JOBS: &str = r#"
    UPDATE scan_jobs
    SET lease_state = 'interrupted'
    WHERE lease_state = 'running' AND (heartbeat_at IS NULL OR heartbeat_at < ?1)
"#;

pub const INTERRUPT_RUNNING_JOBS_FOR_OWNER: &str = r#"
    UPDATE scan_jobs
    SET lease_state = 'interrupted'
    WHERE lease_state = 'running' AND lease_owner = ?1
"#;

pub const SELECT_JOB_BY_ID: &str = r#"
    SELECT id, kind, target, interval_hours, last_run_at, lease_state,
           lease_owner, heartbeat_at, run_id, last_result_summary
    FROM scan_jobs
    WHERE id = ?1
"#;
