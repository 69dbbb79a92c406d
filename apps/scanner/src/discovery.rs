// [apps/scanner/src/discovery.rs]
/*!
 * Assembles the concrete `DiscoverySource` instances the scheduler
 * dispatches against, from `ScannerConfig`. One `ReverseImageSource`
 * serves every contributor scan job; one `PlatformCrawlSource` per
 * configured platform serves platform crawl jobs. `UrlCheckSource` and
 * `LinkHarvestSource` are stateless, so one shared instance of each
 * covers every job regardless of target.
 */

use crate::config::ScannerConfig;
use sentinel_domain_discovery::{LinkHarvestSource, PlatformCrawlSource, ReverseImageSource, UrlCheckSource};
use std::collections::HashMap;
use std::sync::Arc;

pub struct DiscoverySources {
    pub reverse_image: Arc<ReverseImageSource>,
    pub url_check: Arc<UrlCheckSource>,
    pub link_harvest: Arc<LinkHarvestSource>,
    platform_crawls: HashMap<String, Arc<PlatformCrawlSource>>,
}

impl DiscoverySources {
    pub fn from_config(config: &ScannerConfig) -> Self {
        let reverse_image = Arc::new(ReverseImageSource::new(
            config.reverse_image_service_name,
            config.reverse_image_search_endpoint.clone(),
        ));

        let platform_crawls = config
            .platform_crawl_targets
            .iter()
            .map(|(platform, endpoint)| {
                let leaked_name: &'static str = Box::leak(platform.clone().into_boxed_str());
                (platform.clone(), Arc::new(PlatformCrawlSource::new(leaked_name, endpoint.clone())))
            })
            .collect();

        Self {
            reverse_image,
            url_check: Arc::new(UrlCheckSource),
            link_harvest: Arc::new(LinkHarvestSource),
            platform_crawls,
        }
    }

    pub fn platform_source(&self, platform: &str) -> Option<Arc<PlatformCrawlSource>> {
        self.platform_crawls.get(platform).cloned()
    }

    pub fn configured_platforms(&self) -> impl Iterator<Item = &str> {
        self.platform_crawls.keys().map(String::as_str)
    }
}
