// [libs/domain/discovery/src/context.rs]
/*!
 * What a discovery source needs to do its job, and what it hands back.
 * One context type covers all three source kinds; fields irrelevant to a
 * given kind are left at their defaults rather than split into per-kind
 * structs, matching the shape the scheduler already assembles per job.
 */

use std::collections::HashMap;
use uuid::Uuid;

/// Everything a discovery source might read. A scheduler assembles one of
/// these per job dispatch; individual sources only look at the fields that
/// matter for their `SourceType`.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryContext {
    /// Set for `reverse_image`; absent for `platform_crawl`.
    pub contributor_id: Option<Uuid>,
    /// Reference image storage keys (bucket, path) for reverse-image search.
    pub reference_images: Vec<(String, String)>,

    /// Set for `platform_crawl`.
    pub platform: Option<String>,
    pub search_terms: Vec<String>,
    pub cursor: Option<String>,
    pub search_cursors: HashMap<String, String>,
    pub model_cursors: HashMap<String, String>,

    /// Set for `url_check`.
    pub urls: Vec<String>,

    /// Set for the link-harvest meta-source: distinct `page_url` values
    /// already on file, supplied by the caller since this crate has no
    /// database access of its own.
    pub known_page_urls: Vec<String>,
    /// Platform names already crawled, to exclude from link-harvest output.
    pub known_platforms: Vec<String>,
}

/// A candidate image a source believes is worth downloading and running
/// through the ingestion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredImageCandidate {
    pub source_url: String,
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    pub platform: Option<String>,
}

/// What `discover()` returns: the candidates plus whatever resumption state
/// lets the next call pick up where this one left off.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    pub images: Vec<DiscoveredImageCandidate>,
    pub next_cursor: Option<String>,
    pub search_cursors: HashMap<String, String>,
    pub model_cursors: HashMap<String, String>,
    pub tags_total: u32,
    pub tags_exhausted: u32,
}
