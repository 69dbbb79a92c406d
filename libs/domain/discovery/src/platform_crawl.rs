// [libs/domain/discovery/src/platform_crawl.rs]
/*!
 * Crawls a single platform's public search/tag listings for images matching
 * a configured set of search terms. Resumable via per-term cursors so a
 * restart continues each term where the previous tick left off, rather than
 * re-walking the whole listing.
 */

use crate::context::{DiscoveredImageCandidate, DiscoveryContext, DiscoveryOutcome};
use crate::source::{DiscoveryError, DiscoverySource, SourceType};
use async_trait::async_trait;
use reqwest::Client;
use sentinel_core_resilience::{CIRCUIT_BREAKERS, RATE_LIMITERS};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

#[derive(Deserialize)]
struct PlatformCrawlPage {
    items: Vec<PlatformCrawlItem>,
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct PlatformCrawlItem {
    image_url: String,
    page_url: Option<String>,
    title: Option<String>,
}

pub struct PlatformCrawlSource {
    platform: &'static str,
    listing_endpoint: String,
    http: Client,
}

impl PlatformCrawlSource {
    pub fn new(platform: &'static str, listing_endpoint: impl Into<String>) -> Self {
        Self {
            platform,
            listing_endpoint: listing_endpoint.into(),
            http: Client::builder()
                .timeout(Duration::from_secs(20))
                .user_agent("sentinel-scanner/1.0")
                .build()
                .expect("failed to initialize platform crawl http client"),
        }
    }

    async fn fetch_page(&self, search_term: &str, cursor: Option<&str>) -> Result<PlatformCrawlPage, DiscoveryError> {
        let breaker = CIRCUIT_BREAKERS.get(self.platform);
        breaker
            .check(self.platform)
            .map_err(|e| DiscoveryError::Transient(e.to_string()))?;

        let limiter = RATE_LIMITERS.get(self.platform);
        limiter.acquire(1.0).await;

        let mut query = vec![("q", search_term.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let response = self.http.get(&self.listing_endpoint).query(&query).send().await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                breaker.record_success(self.platform);
                resp.json()
                    .await
                    .map_err(|e| DiscoveryError::Permanent(format!("unparseable listing page: {}", e)))
            }
            Ok(resp) if resp.status().as_u16() == 429 || resp.status().is_server_error() => {
                breaker.record_failure(self.platform);
                Err(DiscoveryError::Transient(format!("upstream status {}", resp.status())))
            }
            Ok(resp) => {
                Err(DiscoveryError::Permanent(format!("listing rejected: {}", resp.status())))
            }
            Err(e) => {
                breaker.record_failure(self.platform);
                Err(DiscoveryError::Transient(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl DiscoverySource for PlatformCrawlSource {
    #[instrument(skip(self, context), fields(platform = self.platform))]
    async fn discover(&self, context: &DiscoveryContext) -> Result<DiscoveryOutcome, DiscoveryError> {
        let mut images = Vec::new();
        let mut search_cursors: HashMap<String, String> = HashMap::new();
        let mut tags_exhausted = 0u32;

        for term in &context.search_terms {
            let cursor = context.search_cursors.get(term).map(String::as_str);
            let page = self.fetch_page(term, cursor).await?;

            images.extend(page.items.into_iter().map(|item| DiscoveredImageCandidate {
                source_url: item.image_url,
                page_url: item.page_url,
                page_title: item.title,
                platform: Some(self.platform.to_string()),
            }));

            match page.next_cursor {
                Some(next) => {
                    search_cursors.insert(term.clone(), next);
                }
                None => {
                    tags_exhausted += 1;
                }
            }
        }

        Ok(DiscoveryOutcome {
            images,
            tags_total: context.search_terms.len() as u32,
            tags_exhausted,
            search_cursors,
            ..Default::default()
        })
    }

    fn get_source_type(&self) -> SourceType {
        SourceType::PlatformCrawl
    }

    fn get_source_name(&self) -> &'static str {
        self.platform
    }
}
