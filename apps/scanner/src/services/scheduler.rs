// [apps/scanner/src/services/scheduler.rs]
/*!
 * =================================================================
 * APARATO: SCAN JOB SCHEDULER
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: DISPATCH DE SCAN JOBS POR LEASE, EJECUCIÓN DEL PIPELINE
 *
 * One tick: reclaim stale leases (first tick only), fetch due jobs per
 * kind up to that kind's concurrency cap, lease and dispatch each as an
 * independent task, heartbeat each in-flight lease on its own timer, and
 * record completion or failure without letting one job's error touch
 * another. Shutdown is checked between jobs and between ticks; once
 * raised, in-flight tasks are drained up to a grace deadline and any
 * leases still held are marked interrupted before the loop exits.
 *
 * Fairness is oldest-due-first per `JobRepository::due_jobs`; there is no
 * priority lane beyond a tier's shorter scan interval (see
 * `sentinel_domain_models::tier_config::TierConfig`). Within one
 * contributor scan, discovery, ingestion, and matching run sequentially;
 * across contributors and platforms, no ordering is guaranteed.
 * =================================================================
 */

use crate::config::ScannerConfig;
use crate::discovery::DiscoverySources;
use crate::services::observer::Observer;
use chrono::{Duration as ChronoDuration, Utc};
use sentinel_core_providers::ProviderRegistry;
use sentinel_domain_discovery::{DiscoveryContext, DiscoverySource};
use sentinel_domain_models::job::{JobKind, ScanJob};
use sentinel_domain_models::platform_crawl::PlatformCrawlSchedule;
use sentinel_domain_models::signal::FeedbackSignal;
use sentinel_domain_models::tier_config::TierConfig;
use sentinel_domain_pipeline::{EvidenceSink, IngestionStage, MatchingStage};
use sentinel_infra_db::repositories::{
    ContributorRepository, DiscoveredImageRepository, JobRepository, MatchRepository,
    NotificationRepository, PlatformCrawlRepository, TakedownRepository,
};
use sentinel_infra_db::TursoClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(15);
/// Job kinds the scheduler leases and dispatches. `Cleanup` runs on its own
/// ticker (`services::cleanup`); the job-kind variants the lease mechanism
/// never uses are not listed here.
const DISPATCHED_KINDS: [JobKind; 2] = [JobKind::ContributorScan, JobKind::PlatformCrawl];

struct JobContext {
    database_client: TursoClient,
    providers: ProviderRegistry,
    discovery: Arc<DiscoverySources>,
    evidence: Arc<dyn EvidenceSink>,
    http: reqwest::Client,
    config: Arc<ScannerConfig>,
}

pub struct Scheduler {
    context: Arc<JobContext>,
    observer: Arc<Observer>,
    owner: String,
    shutdown: Arc<AtomicBool>,
    first_tick: AtomicBool,
}

impl Scheduler {
    pub fn new(
        database_client: TursoClient,
        config: Arc<ScannerConfig>,
        providers: ProviderRegistry,
        discovery: Arc<DiscoverySources>,
        evidence: Arc<dyn EvidenceSink>,
        observer: Arc<Observer>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let owner = format!("scanner-{}", Uuid::new_v4());
        Self {
            context: Arc::new(JobContext {
                database_client,
                providers,
                discovery,
                evidence,
                http: reqwest::Client::builder()
                    .user_agent("sentinel-scanner/1.0")
                    .build()
                    .expect("failed to initialize scheduler http client"),
                config,
            }),
            observer,
            owner,
            shutdown,
            first_tick: AtomicBool::new(true),
        }
    }

    pub fn spawn_tick_loop(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let tick_interval = Duration::from_secs(self.context.config.tick_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = interval(tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if self.shutdown.load(Ordering::SeqCst) {
                    self.drain_and_exit().await;
                    return;
                }
                self.tick().await;
            }
        })
    }

    #[instrument(skip(self))]
    async fn tick(&self) {
        if self.first_tick.swap(false, Ordering::SeqCst) {
            self.recover_stale().await;
        }

        for kind in DISPATCHED_KINDS {
            if self.shutdown.load(Ordering::SeqCst) {
                return;
            }
            self.dispatch_kind(kind).await;
        }
    }

    async fn recover_stale(&self) {
        let connection = match self.context.database_client.get_connection() {
            Ok(connection) => connection,
            Err(error) => {
                warn!(%error, "scheduler could not acquire a connection for stale-job recovery");
                return;
            }
        };
        let jobs = JobRepository::new(connection);
        let max_age = ChronoDuration::minutes(self.context.config.stale_job_max_age_minutes);
        match jobs.recover_stale(max_age).await {
            Ok(0) => {}
            Ok(recovered) => info!(recovered, "reclaimed stale running jobs on startup"),
            Err(error) => warn!(%error, "stale job recovery failed"),
        }
    }

    async fn dispatch_kind(&self, kind: JobKind) {
        let fetch_limit = self.context.config.due_job_fetch_limit;
        let connection = match self.context.database_client.get_connection() {
            Ok(connection) => connection,
            Err(error) => {
                warn!(%error, ?kind, "scheduler could not acquire a connection to fetch due jobs");
                return;
            }
        };
        let due = match JobRepository::new(connection).due_jobs(kind, Utc::now(), fetch_limit).await {
            Ok(due) => due,
            Err(error) => {
                warn!(%error, ?kind, "failed to fetch due jobs");
                return;
            }
        };
        if due.is_empty() {
            return;
        }

        let semaphore = Arc::new(Semaphore::new(self.context.config.concurrency_for(kind)));
        let mut handles = Vec::with_capacity(due.len());

        for job in due {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let permit = semaphore.clone().acquire_owned().await.expect("scheduler semaphore closed");
            let context = self.context.clone();
            let observer = self.observer.clone();
            let owner = self.owner.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                run_leased_job(context, observer, owner, job).await;
            }));
        }

        for handle in handles {
            if let Err(join_error) = handle.await {
                warn!(%join_error, "scan job task panicked");
            }
        }
    }

    /// Marks every lease this instance holds as interrupted so another
    /// instance can resume the work, then returns. Called once, from the
    /// tick loop, after the shutdown flag is observed.
    async fn drain_and_exit(&self) {
        info!("scheduler shutting down, draining in-flight leases");
        let grace = Duration::from_secs(self.context.config.shutdown_grace_seconds);
        tokio::time::sleep(grace.min(Duration::from_secs(5))).await;

        let connection = match self.context.database_client.get_connection() {
            Ok(connection) => connection,
            Err(error) => {
                warn!(%error, "shutdown could not acquire a connection to interrupt leases");
                return;
            }
        };
        match JobRepository::new(connection).interrupt_running(&self.owner).await {
            Ok(interrupted) if interrupted > 0 => info!(interrupted, "interrupted in-flight leases on shutdown"),
            Ok(_) => {}
            Err(error) => warn!(%error, "failed to interrupt in-flight leases on shutdown"),
        }
    }
}

#[instrument(skip(context, observer), fields(job_id = %job.id, kind = ?job.kind))]
async fn run_leased_job(context: Arc<JobContext>, observer: Arc<Observer>, owner: String, job: ScanJob) {
    let connection = match context.database_client.get_connection() {
        Ok(connection) => connection,
        Err(error) => {
            warn!(%error, "failed to acquire a connection to lease job");
            return;
        }
    };
    let run_id = match JobRepository::new(connection).lease(job.id, &owner, Utc::now()).await {
        Ok(run_id) => run_id,
        Err(sentinel_infra_db::DbError::LeaseConflict { .. }) => return,
        Err(error) => {
            warn!(%error, "failed to lease job");
            return;
        }
    };

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    let heartbeat_handle = spawn_heartbeat(context.database_client.clone(), run_id, stop_rx);

    let outcome = execute_job(&context, &observer, &job).await;

    let _ = stop_tx.send(());
    let _ = heartbeat_handle.await;

    let connection = match context.database_client.get_connection() {
        Ok(connection) => connection,
        Err(error) => {
            warn!(%error, "failed to acquire a connection to record job outcome");
            return;
        }
    };
    let jobs = JobRepository::new(connection);

    match outcome {
        Ok(summary) => {
            if let Err(error) = jobs.complete(run_id, &summary, Utc::now()).await {
                warn!(%error, "failed to record job completion");
            }
            observer
                .record(FeedbackSignal::new(
                    "job_completed",
                    "scan_job",
                    job.id.to_string(),
                    serde_json::json!({ "kind": job.kind.as_str(), "target": job.target, "summary": summary }),
                    owner.clone(),
                ))
                .await;
        }
        Err(reason) => {
            warn!(reason = %reason, "scan job failed");
            if let Err(error) = jobs.fail(run_id, &reason).await {
                warn!(%error, "failed to record job failure");
            }
        }
    }
}

fn spawn_heartbeat(
    database_client: TursoClient,
    run_id: Uuid,
    mut stop_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(HEARTBEAT_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Ok(connection) = database_client.get_connection() {
                        if let Err(error) = JobRepository::new(connection).heartbeat(run_id, Utc::now()).await {
                            warn!(%error, "heartbeat failed");
                        }
                    }
                }
                _ = &mut stop_rx => return,
            }
        }
    })
}

async fn execute_job(context: &JobContext, observer: &Observer, job: &ScanJob) -> Result<String, String> {
    match job.kind {
        JobKind::ContributorScan => {
            let contributor_id = Uuid::parse_str(&job.target).map_err(|e| format!("invalid contributor id: {}", e))?;
            run_contributor_scan(context, contributor_id).await
        }
        JobKind::PlatformCrawl => run_platform_crawl(context, observer, &job.target).await,
        other => Err(format!("scheduler does not dispatch job kind {:?}", other)),
    }
}

/// Inserts every candidate a discovery source returned, tallying only the
/// ones that were actually new (§8's dedup is enforced at the database, via
/// `discovered_images.source_url`'s `UNIQUE` constraint).
async fn insert_candidates(images: &DiscoveredImageRepository, candidates: &[sentinel_domain_discovery::DiscoveredImageCandidate]) -> u64 {
    let mut discovered = 0u64;
    for candidate in candidates {
        match images
            .insert_pending(
                &candidate.source_url,
                candidate.page_url.as_deref(),
                candidate.page_title.as_deref(),
                candidate.platform.as_deref(),
            )
            .await
        {
            Ok(true) => discovered += 1,
            Ok(false) => {}
            Err(error) => warn!(%error, source_url = %candidate.source_url, "failed to record discovered candidate"),
        }
    }
    discovered
}

/// Discovery, ingestion, and matching run sequentially for a single
/// contributor scan, per the ordering guarantee in the scheduling model.
async fn run_contributor_scan(context: &JobContext, contributor_id: Uuid) -> Result<String, String> {
    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let contributor = ContributorRepository::new(connection).get(contributor_id).await.map_err(|e| e.to_string())?;
    let tier_config = TierConfig::for_tier(contributor.tier);

    // priority_scanning is not a preemption lane; it only ever manifests as
    // a shorter scan interval for that tier, per the scheduling model's
    // fairness note.
    debug_assert!(
        !tier_config.priority_scanning
            || tier_config.reverse_image_interval_hours < TierConfig::for_tier(sentinel_domain_models::contributor::ContributorTier::Free).reverse_image_interval_hours,
        "priority_scanning must manifest as a shorter interval, not a separate dispatch path",
    );
    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    JobRepository::new(connection)
        .upsert_definition(JobKind::ContributorScan, &contributor_id.to_string(), tier_config.reverse_image_interval_hours)
        .await
        .map_err(|e| e.to_string())?;

    // Reference image storage for reverse-image search is a provisioning
    // concern outside this crate (see DESIGN.md); an empty list means the
    // source's upstream call is skipped rather than failed. When storage
    // keys are present, a free-tier contributor's scan is still bounded by
    // `reverse_image_max_photos`.
    let mut discovery_context = DiscoveryContext {
        contributor_id: Some(contributor_id),
        ..Default::default()
    };
    if let Some(max_photos) = tier_config.reverse_image_max_photos {
        discovery_context.reference_images.truncate(max_photos as usize);
    }

    let outcome = context
        .discovery
        .reverse_image
        .discover(&discovery_context)
        .await
        .map_err(|e| e.to_string())?;

    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let images = DiscoveredImageRepository::new(connection);
    let mut discovered = insert_candidates(&images, &outcome.images).await;

    if tier_config.url_check {
        let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
        let urls = TakedownRepository::new(connection)
            .submitted_source_urls_for_contributor(contributor_id)
            .await
            .map_err(|e| e.to_string())?;
        if !urls.is_empty() {
            let url_check_context = DiscoveryContext { urls, ..Default::default() };
            let url_check_outcome = context.discovery.url_check.discover(&url_check_context).await.map_err(|e| e.to_string())?;
            discovered += insert_candidates(&images, &url_check_outcome.images).await;
        }
    }

    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let ingestion = IngestionStage::new(
        context.http.clone(),
        context.providers.face_detection.clone(),
        DiscoveredImageRepository::new(connection),
    );
    let ingestion_summary = ingestion.run(context.config.due_job_fetch_limit).await;

    let contributor_connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let image_connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let match_connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let notification_connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let takedown_connection = context.database_client.get_connection().map_err(|e| e.to_string())?;

    let matching = MatchingStage::new(
        ContributorRepository::new(contributor_connection),
        DiscoveredImageRepository::new(image_connection),
        MatchRepository::new(match_connection),
        NotificationRepository::new(notification_connection),
        TakedownRepository::new(takedown_connection),
        context.providers.clone(),
        context.evidence.clone(),
    );
    let matching_summary = matching.run(context.config.due_job_fetch_limit).await;

    Ok(format!(
        "discovered={} embedded={} no_face={} failed={} matched={} no_match={} notifications={}",
        discovered,
        ingestion_summary.embedded,
        ingestion_summary.no_face,
        ingestion_summary.failed,
        matching_summary.images_matched,
        matching_summary.images_no_match,
        matching_summary.notifications_sent,
    ))
}

async fn run_platform_crawl(context: &JobContext, observer: &Observer, platform: &str) -> Result<String, String> {
    let source = context
        .discovery
        .platform_source(platform)
        .ok_or_else(|| format!("no discovery source configured for platform '{}'", platform))?;

    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let schedule_repository = PlatformCrawlRepository::new(connection);
    let existing = schedule_repository.get(platform).await.map_err(|e| e.to_string())?;

    let discovery_context = DiscoveryContext {
        platform: Some(platform.to_string()),
        search_terms: existing.as_ref().map(|s| s.search_cursors.keys().cloned().collect()).unwrap_or_default(),
        search_cursors: existing.as_ref().map(|s| s.search_cursors.clone()).unwrap_or_default(),
        model_cursors: existing.as_ref().map(|s| s.model_cursors.clone()).unwrap_or_default(),
        ..Default::default()
    };

    let outcome = source.discover(&discovery_context).await.map_err(|e| e.to_string())?;

    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    let images = DiscoveredImageRepository::new(connection);
    let mut discovered = insert_candidates(&images, &outcome.images).await;

    // link_harvest never feeds straight into discovered_images: a mined
    // domain is a lead on a platform that isn't configured yet, not a
    // candidate image, so it surfaces as a signal for a human to act on.
    let page_urls = images.distinct_page_urls(200).await.map_err(|e| e.to_string())?;
    let link_harvest_context = DiscoveryContext {
        known_page_urls: page_urls,
        known_platforms: context.discovery.configured_platforms().map(str::to_string).collect(),
        ..Default::default()
    };
    let link_harvest_outcome = context.discovery.link_harvest.discover(&link_harvest_context).await.map_err(|e| e.to_string())?;
    for candidate in &link_harvest_outcome.images {
        observer
            .record(FeedbackSignal::new(
                "link_harvest_candidate",
                "platform_crawl",
                platform.to_string(),
                serde_json::json!({ "candidate_domain": candidate.source_url }),
                "scheduler",
            ))
            .await;
    }

    let schedule = PlatformCrawlSchedule {
        platform: platform.to_string(),
        interval_hours: existing.map(|s| s.interval_hours).unwrap_or(24),
        cursor: outcome.next_cursor.clone(),
        search_cursors: outcome.search_cursors.clone(),
        model_cursors: outcome.model_cursors.clone(),
        tags_total: outcome.tags_total,
        tags_exhausted: outcome.tags_exhausted,
    };
    let connection = context.database_client.get_connection().map_err(|e| e.to_string())?;
    PlatformCrawlRepository::new(connection).upsert(&schedule).await.map_err(|e| e.to_string())?;

    Ok(format!("discovered={}", discovered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchScorerVariant;
    use sentinel_core_providers::{ProviderRegistry, StaticMatchScorer};
    use sentinel_domain_models::job::LeaseState;

    fn test_config(platform_crawl_targets: Vec<(String, String)>) -> Arc<ScannerConfig> {
        Arc::new(ScannerConfig {
            database_url: ":memory:".to_string(),
            database_auth_token: None,
            http_port: 0,
            tick_interval_seconds: 1,
            stale_job_max_age_minutes: 30,
            shutdown_grace_seconds: 0,
            contributor_scan_concurrency: 4,
            platform_crawl_concurrency: 4,
            due_job_fetch_limit: 20,
            match_scorer_variant: MatchScorerVariant::Static,
            reverse_image_service_name: "reverse_image_search",
            reverse_image_search_endpoint: "https://example.invalid/search".to_string(),
            platform_crawl_targets,
        })
    }

    async fn test_scheduler(platform_crawl_targets: Vec<(String, String)>) -> (Scheduler, TursoClient) {
        let database_client = TursoClient::connect(":memory:", None).await.unwrap();
        let config = test_config(platform_crawl_targets);
        let providers = ProviderRegistry::new(
            Arc::new(crate::providers::UnconfiguredFaceDetectionProvider),
            Arc::new(crate::providers::UnconfiguredAiDetectionProvider),
            Arc::new(StaticMatchScorer::default()),
        );
        let discovery = Arc::new(DiscoverySources::from_config(&config));
        let observer = Arc::new(Observer::new(database_client.clone()));
        let scheduler = Scheduler::new(
            database_client.clone(),
            config,
            providers,
            discovery,
            Arc::new(sentinel_domain_pipeline::NullEvidenceSink),
            observer,
            Arc::new(AtomicBool::new(false)),
        );
        (scheduler, database_client)
    }

    async fn jobs_repo(client: &TursoClient) -> JobRepository {
        JobRepository::new(client.get_connection().unwrap())
    }

    /// A contributor scan with no reference images configured skips the
    /// upstream call entirely (see `run_contributor_scan`), so it always
    /// succeeds; a platform crawl for a platform with no configured source
    /// fails synchronously. Mixing both kinds in one dispatch proves one
    /// job's failure never stops the rest of the batch from running.
    #[tokio::test]
    async fn dispatch_kind_runs_every_due_job_even_when_one_fails() {
        let (scheduler, client) = test_scheduler(vec![
            ("configured-a".to_string(), "https://example.invalid/a".to_string()),
            ("configured-b".to_string(), "https://example.invalid/b".to_string()),
        ])
        .await;
        let jobs = jobs_repo(&client).await;
        jobs.upsert_definition(JobKind::PlatformCrawl, "configured-a", 24).await.unwrap();
        jobs.upsert_definition(JobKind::PlatformCrawl, "configured-b", 24).await.unwrap();
        jobs.upsert_definition(JobKind::PlatformCrawl, "unconfigured", 24).await.unwrap();

        scheduler.dispatch_kind(JobKind::PlatformCrawl).await;

        let due = jobs.due_jobs(JobKind::PlatformCrawl, Utc::now() + ChronoDuration::days(2), 10).await.unwrap();
        let by_target = |target: &str| due.iter().find(|j| j.target == target).unwrap().clone();

        assert_eq!(by_target("configured-a").lease_state, LeaseState::Idle);
        assert!(by_target("configured-a").last_result_summary.is_some());
        assert_eq!(by_target("configured-b").lease_state, LeaseState::Idle);
        assert_eq!(by_target("unconfigured").lease_state, LeaseState::Failed);
    }

    #[tokio::test]
    async fn dispatch_kind_does_nothing_once_shutdown_is_flagged() {
        let (scheduler, client) = test_scheduler(Vec::new()).await;
        let jobs = jobs_repo(&client).await;
        jobs.upsert_definition(JobKind::ContributorScan, "11111111-1111-1111-1111-111111111111", 168)
            .await
            .unwrap();
        scheduler.shutdown.store(true, Ordering::SeqCst);

        scheduler.dispatch_kind(JobKind::ContributorScan).await;

        let due = jobs.due_jobs(JobKind::ContributorScan, Utc::now(), 10).await.unwrap();
        assert_eq!(due[0].lease_state, LeaseState::Idle);
        assert!(due[0].lease_owner.is_none());
    }

    #[tokio::test]
    async fn recover_stale_reclaims_leases_past_the_configured_max_age() {
        let (scheduler, client) = test_scheduler(Vec::new()).await;
        let jobs = jobs_repo(&client).await;
        jobs.upsert_definition(JobKind::PlatformCrawl, "civitai", 24).await.unwrap();
        let due = jobs.due_jobs(JobKind::PlatformCrawl, Utc::now(), 10).await.unwrap();
        jobs.lease(due[0].id, "stale-owner", Utc::now() - ChronoDuration::minutes(60)).await.unwrap();

        scheduler.recover_stale().await;

        assert_eq!(jobs.get(due[0].id).await.unwrap().lease_state, LeaseState::Interrupted);
    }

    /// A `protected`-tier contributor has `TierConfig::url_check` enabled
    /// but an empty reverse-image endpoint, so any candidate it discovers
    /// came from re-checking a submitted takedown's source URL.
    #[tokio::test]
    async fn contributor_scan_re_checks_submitted_takedown_urls_for_gated_tiers() {
        let (_, client) = test_scheduler(Vec::new()).await;
        let connection = client.get_connection().unwrap();
        let contributor_id = Uuid::new_v4();
        connection
            .execute(
                "INSERT INTO contributors (id, display_name, tier) VALUES (?1, 'gated', 'protected')",
                libsql::params![contributor_id.to_string()],
            )
            .await
            .unwrap();

        let takedowns = TakedownRepository::new(client.get_connection().unwrap());
        let image_id = Uuid::new_v4();
        connection
            .execute(
                "INSERT INTO discovered_images (id, source_url, status) VALUES (?1, 'https://host.example/resurfaced.jpg', 'matched')",
                libsql::params![image_id.to_string()],
            )
            .await
            .unwrap();
        let face_id = Uuid::new_v4();
        connection
            .execute(
                "INSERT INTO discovered_face_embeddings (id, discovered_image_id, vector_json, detection_score) VALUES (?1, ?2, '[]', 0.9)",
                libsql::params![face_id.to_string(), image_id.to_string()],
            )
            .await
            .unwrap();
        let match_id = Uuid::new_v4();
        connection
            .execute(
                "INSERT INTO matches (id, contributor_id, discovered_image_id, discovered_face_embedding_id, similarity, confidence_tier)
                 VALUES (?1, ?2, ?3, ?4, 0.9, 'high')",
                libsql::params![match_id.to_string(), contributor_id.to_string(), image_id.to_string(), face_id.to_string()],
            )
            .await
            .unwrap();
        let takedown = takedowns.insert_pending(match_id, "notice").await.unwrap();
        takedowns.mark_submitted(takedown.id).await.unwrap();

        let context = JobContext {
            database_client: client.clone(),
            providers: ProviderRegistry::new(
                Arc::new(crate::providers::UnconfiguredFaceDetectionProvider),
                Arc::new(crate::providers::UnconfiguredAiDetectionProvider),
                Arc::new(StaticMatchScorer::default()),
            ),
            discovery: Arc::new(DiscoverySources::from_config(&test_config(Vec::new()))),
            evidence: Arc::new(sentinel_domain_pipeline::NullEvidenceSink),
            http: reqwest::Client::new(),
            config: test_config(Vec::new()),
        };

        run_contributor_scan(&context, contributor_id).await.unwrap();

        // The candidate is recorded at all (ingestion may have since moved
        // it past `pending`, since the download target doesn't exist), which
        // is all `url_check` wiring is responsible for.
        let mut rows = client
            .get_connection()
            .unwrap()
            .query(
                "SELECT COUNT(*) FROM discovered_images WHERE source_url = 'https://host.example/resurfaced.jpg'",
                (),
            )
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1);
    }

    /// A platform crawl with no domains yet on file emits nothing; one with
    /// an unconfigured host's `page_url` on file surfaces it as a signal
    /// rather than inserting it as a new discovered image.
    #[tokio::test]
    async fn platform_crawl_surfaces_link_harvest_candidates_as_signals_not_images() {
        let (_, client) = test_scheduler(vec![("configured".to_string(), "https://example.invalid/configured".to_string())]).await;
        let images = DiscoveredImageRepository::new(client.get_connection().unwrap());
        images.insert_pending("https://unmapped.example/a.jpg", Some("https://unmapped.example/page"), None, None).await.unwrap();

        let jobs = jobs_repo(&client).await;
        jobs.upsert_definition(JobKind::PlatformCrawl, "configured", 24).await.unwrap();

        let context = JobContext {
            database_client: client.clone(),
            providers: ProviderRegistry::new(
                Arc::new(crate::providers::UnconfiguredFaceDetectionProvider),
                Arc::new(crate::providers::UnconfiguredAiDetectionProvider),
                Arc::new(StaticMatchScorer::default()),
            ),
            discovery: Arc::new(DiscoverySources::from_config(&test_config(vec![(
                "configured".to_string(),
                "https://example.invalid/configured".to_string(),
            )]))),
            evidence: Arc::new(sentinel_domain_pipeline::NullEvidenceSink),
            http: reqwest::Client::new(),
            config: test_config(vec![("configured".to_string(), "https://example.invalid/configured".to_string())]),
        };
        let observer = Observer::new(client.clone());

        run_platform_crawl(&context, &observer, "configured").await.unwrap();

        let pending = images.pending(10).await.unwrap();
        assert!(
            pending.iter().all(|i| i.source_url != "https://unmapped.example"),
            "link harvest candidates surface as signals, not discovered images",
        );
    }

    #[tokio::test]
    async fn drain_and_exit_interrupts_only_this_instances_leases() {
        let (scheduler, client) = test_scheduler(Vec::new()).await;
        let jobs = jobs_repo(&client).await;
        jobs.upsert_definition(JobKind::PlatformCrawl, "civitai", 24).await.unwrap();
        jobs.upsert_definition(JobKind::PlatformCrawl, "e621", 24).await.unwrap();
        let due = jobs.due_jobs(JobKind::PlatformCrawl, Utc::now(), 10).await.unwrap();
        jobs.lease(due[0].id, &scheduler.owner, Utc::now()).await.unwrap();
        jobs.lease(due[1].id, "someone-elses-scanner", Utc::now()).await.unwrap();

        scheduler.drain_and_exit().await;

        assert_eq!(jobs.get(due[0].id).await.unwrap().lease_state, LeaseState::Interrupted);
        assert_eq!(jobs.get(due[1].id).await.unwrap().lease_state, LeaseState::Running);
    }
}
