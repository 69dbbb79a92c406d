// [libs/domain/discovery/src/link_harvest.rs]
/*!
 * Meta-discovery: mines external domains out of `page_url`s already on
 * file, excluding known platforms, to seed scouting for new crawl targets.
 * It never touches the database itself — the caller supplies the distinct
 * `page_url` values and the known-platform exclusion list via the context,
 * keeping this crate free of an infra dependency.
 */

use crate::context::{DiscoveredImageCandidate, DiscoveryContext, DiscoveryOutcome};
use crate::source::{DiscoveryError, DiscoverySource, SourceType};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{info, instrument};

pub struct LinkHarvestSource;

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[async_trait]
impl DiscoverySource for LinkHarvestSource {
    #[instrument(skip(self, context))]
    async fn discover(&self, context: &DiscoveryContext) -> Result<DiscoveryOutcome, DiscoveryError> {
        let known: HashSet<&str> = context.known_platforms.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for page_url in &context.known_page_urls {
            let Ok(parsed) = url::Url::parse(page_url) else { continue };
            let Some(host) = parsed.host_str() else { continue };
            let domain = strip_www(&host.to_lowercase()).to_string();

            if domain.is_empty() || known.contains(domain.as_str()) || !seen.insert(domain.clone()) {
                continue;
            }

            images.push(DiscoveredImageCandidate {
                source_url: format!("https://{}", domain),
                page_url: Some(page_url.clone()),
                page_title: None,
                platform: None,
            });
        }

        info!(candidates = images.len(), "link harvest found candidate domains");
        Ok(DiscoveryOutcome { images, ..Default::default() })
    }

    fn get_source_type(&self) -> SourceType {
        SourceType::PlatformCrawl
    }

    fn get_source_name(&self) -> &'static str {
        "link_harvest"
    }
}
