// [libs/domain/models/src/job.rs]
/*!
 * The durable unit the scheduler leases and drives: a scan job keyed by
 * `(kind, target)`, with lease/heartbeat state owned exclusively by the
 * scheduler.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ContributorScan,
    PlatformCrawl,
    Cleanup,
    /// Rebuilds a platform's section/tag taxonomy snapshot (see
    /// `sentinel_domain_models::platform_map::PlatformMap`). Not yet leased
    /// by the scheduler; see `DESIGN.md`.
    Mapper,
    /// Discovers candidate contributor pages outside the configured
    /// reverse-image and platform-crawl sources (e.g. link harvesting). Not
    /// yet leased by the scheduler; see `DESIGN.md`.
    Scout,
    /// Produces tuning recommendations from buffered feedback signals for
    /// human review; never auto-applies them. Not yet leased by the
    /// scheduler; see `DESIGN.md`.
    Analyzer,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContributorScan => "contributor_scan",
            Self::PlatformCrawl => "platform_crawl",
            Self::Cleanup => "cleanup",
            Self::Mapper => "mapper",
            Self::Scout => "scout",
            Self::Analyzer => "analyzer",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        Some(match raw {
            "contributor_scan" => Self::ContributorScan,
            "platform_crawl" => Self::PlatformCrawl,
            "cleanup" => Self::Cleanup,
            "mapper" => Self::Mapper,
            "scout" => Self::Scout,
            "analyzer" => Self::Analyzer,
            _ => return None,
        })
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseState {
    Idle,
    Running,
    Interrupted,
    Completed,
    Failed,
}

impl LeaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Interrupted => "interrupted",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str_or_idle(raw: &str) -> Self {
        match raw {
            "running" => Self::Running,
            "interrupted" => Self::Interrupted,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub target: String,
    pub interval_hours: i64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub lease_state: LeaseState,
    pub lease_owner: Option<String>,
    pub heartbeat_at: Option<DateTime<Utc>>,
    pub run_id: Option<Uuid>,
    pub last_result_summary: Option<String>,
}
