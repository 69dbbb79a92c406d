// [libs/domain/discovery/src/lib.rs]
//! Discovery sources: pluggable capability implementations that surface
//! candidate images for the ingestion stage. Every source implements
//! `DiscoverySource`; the scheduler picks which ones to run per job kind.

pub mod context;
pub mod link_harvest;
pub mod platform_crawl;
pub mod reverse_image;
pub mod source;
pub mod url_check;

pub use context::{DiscoveredImageCandidate, DiscoveryContext, DiscoveryOutcome};
pub use link_harvest::LinkHarvestSource;
pub use platform_crawl::PlatformCrawlSource;
pub use reverse_image::ReverseImageSource;
pub use source::{DiscoveryError, DiscoverySource, SourceType};
pub use url_check::UrlCheckSource;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn link_harvest_excludes_known_platforms_and_dedupes() {
        let source = LinkHarvestSource;
        let context = DiscoveryContext {
            known_page_urls: vec![
                "https://www.newsite.example/gallery/1".into(),
                "https://newsite.example/gallery/2".into(),
                "https://civitai.com/models/1".into(),
            ],
            known_platforms: vec!["civitai.com".into()],
            ..Default::default()
        };

        let outcome = source.discover(&context).await.unwrap();
        assert_eq!(outcome.images.len(), 1);
        assert_eq!(outcome.images[0].source_url, "https://newsite.example");
    }
}
