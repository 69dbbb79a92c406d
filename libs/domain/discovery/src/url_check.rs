// [libs/domain/discovery/src/url_check.rs]
/*!
 * The simplest source: the caller already knows which URLs to check (e.g.
 * a takedown target resurfaced, or an admin-submitted tip), so discovery
 * is just wrapping each URL as a candidate. No network call happens here;
 * the ingestion stage does the actual download.
 */

use crate::context::{DiscoveredImageCandidate, DiscoveryContext, DiscoveryOutcome};
use crate::source::{DiscoveryError, DiscoverySource, SourceType};
use async_trait::async_trait;
use tracing::instrument;

pub struct UrlCheckSource;

#[async_trait]
impl DiscoverySource for UrlCheckSource {
    #[instrument(skip(self, context))]
    async fn discover(&self, context: &DiscoveryContext) -> Result<DiscoveryOutcome, DiscoveryError> {
        let images = context
            .urls
            .iter()
            .map(|url| DiscoveredImageCandidate {
                source_url: url.clone(),
                page_url: None,
                page_title: None,
                platform: None,
            })
            .collect();

        Ok(DiscoveryOutcome { images, ..Default::default() })
    }

    fn get_source_type(&self) -> SourceType {
        SourceType::UrlCheck
    }

    fn get_source_name(&self) -> &'static str {
        "url_check"
    }
}
