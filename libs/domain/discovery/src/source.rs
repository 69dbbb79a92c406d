// [libs/domain/discovery/src/source.rs]
/*!
 * Uniform contract every discovery source implements, regardless of which
 * platform or search technique it wraps. A source is expected to be
 * resumable: given the cursors it returned last time, it should not
 * re-emit candidates it already surfaced, though exact duplicate
 * suppression is a best-effort property the caller backstops by
 * deduplicating on `source_url`.
 */

use crate::context::{DiscoveryContext, DiscoveryOutcome};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    ReverseImage,
    PlatformCrawl,
    UrlCheck,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReverseImage => "reverse_image",
            Self::PlatformCrawl => "platform_crawl",
            Self::UrlCheck => "url_check",
        }
    }
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("[DISCOVERY_TRANSIENT_FAULT]: {0}")]
    Transient(String),
    #[error("[DISCOVERY_PERMANENT_FAULT]: {0}")]
    Permanent(String),
}

#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn discover(&self, context: &DiscoveryContext) -> Result<DiscoveryOutcome, DiscoveryError>;
    fn get_source_type(&self) -> SourceType;
    fn get_source_name(&self) -> &'static str;
}
