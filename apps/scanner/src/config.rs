// [apps/scanner/src/config.rs]
/*!
 * Environment-driven configuration, read once at kernel ignition. Mirrors
 * the `env::var(...).unwrap_or_else(...)` / `.expect(...)` convention the
 * rest of the workspace uses rather than a layered config system — there
 * are no config files and no remote config service.
 */

use sentinel_domain_models::job::JobKind;
use std::env;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub http_port: u16,
    pub tick_interval_seconds: u64,
    pub stale_job_max_age_minutes: i64,
    pub shutdown_grace_seconds: u64,
    pub contributor_scan_concurrency: usize,
    pub platform_crawl_concurrency: usize,
    pub due_job_fetch_limit: i64,
    pub match_scorer_variant: MatchScorerVariant,
    pub reverse_image_service_name: &'static str,
    pub reverse_image_search_endpoint: String,
    /// `platform=listing_endpoint` pairs, one discovery source per entry.
    pub platform_crawl_targets: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScorerVariant {
    Static,
    Ml,
}

impl ScannerConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("CRITICAL: DATABASE_URL not set"),
            database_auth_token: env::var("TURSO_AUTH_TOKEN").ok(),
            http_port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080),
            tick_interval_seconds: env::var("TICK_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            stale_job_max_age_minutes: env::var("STALE_JOB_MAX_AGE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            shutdown_grace_seconds: env::var("SHUTDOWN_GRACE_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            contributor_scan_concurrency: env::var("CONTRIBUTOR_SCAN_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            platform_crawl_concurrency: env::var("PLATFORM_CRAWL_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            due_job_fetch_limit: env::var("DUE_JOB_FETCH_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            match_scorer_variant: match env::var("MATCH_SCORER_VARIANT").as_deref() {
                Ok("ml") => MatchScorerVariant::Ml,
                _ => MatchScorerVariant::Static,
            },
            reverse_image_service_name: "reverse_image_search",
            reverse_image_search_endpoint: env::var("REVERSE_IMAGE_SEARCH_ENDPOINT")
                .unwrap_or_else(|_| "https://reverse-image-search.internal/v1/search".to_string()),
            platform_crawl_targets: Self::parse_platform_targets(
                env::var("PLATFORM_CRAWL_TARGETS").unwrap_or_default().as_str(),
            ),
        }
    }

    /// Parses `platform=endpoint` pairs separated by `;`. A malformed entry
    /// is logged and skipped rather than aborting startup.
    fn parse_platform_targets(raw: &str) -> Vec<(String, String)> {
        raw.split(';')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| {
                let (platform, endpoint) = entry.split_once('=')?;
                Some((platform.trim().to_string(), endpoint.trim().to_string()))
            })
            .collect()
    }

    /// Per-kind concurrency cap the scheduler enforces when dispatching
    /// leased jobs of that kind within a single tick.
    pub fn concurrency_for(&self, kind: JobKind) -> usize {
        match kind {
            JobKind::ContributorScan => self.contributor_scan_concurrency,
            JobKind::PlatformCrawl => self.platform_crawl_concurrency,
            JobKind::Cleanup | JobKind::Mapper | JobKind::Scout | JobKind::Analyzer => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_semicolon_separated_platform_targets() {
        let targets = ScannerConfig::parse_platform_targets("civitai=https://a.example;leonardo=https://b.example");
        assert_eq!(targets, vec![
            ("civitai".to_string(), "https://a.example".to_string()),
            ("leonardo".to_string(), "https://b.example".to_string()),
        ]);
    }

    #[test]
    fn skips_malformed_platform_target_entries() {
        let targets = ScannerConfig::parse_platform_targets("no_equals_sign;civitai=https://a.example");
        assert_eq!(targets, vec![("civitai".to_string(), "https://a.example".to_string())]);
    }

    #[test]
    fn unknown_scorer_variant_falls_back_to_static() {
        assert_eq!(
            match Some("bogus") {
                Some("ml") => MatchScorerVariant::Ml,
                _ => MatchScorerVariant::Static,
            },
            MatchScorerVariant::Static
        );
    }
}
