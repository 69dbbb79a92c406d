// [libs/domain/discovery/src/reverse_image.rs]
/*!
 * Reverse image search: given a contributor's reference photos, ask an
 * upstream search provider (TinEye-style) for pages that embed a visually
 * similar image. Network calls go through the shared rate limiter and
 * circuit breaker registries rather than rolling their own backoff.
 */

use crate::context::{DiscoveredImageCandidate, DiscoveryContext, DiscoveryOutcome};
use crate::source::{DiscoveryError, DiscoverySource, SourceType};
use async_trait::async_trait;
use reqwest::Client;
use sentinel_core_resilience::{CIRCUIT_BREAKERS, RATE_LIMITERS};
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};

#[derive(Deserialize)]
struct ReverseImageHit {
    page_url: Option<String>,
    image_url: String,
    title: Option<String>,
}

#[derive(Deserialize)]
struct ReverseImageResponse {
    results: Vec<ReverseImageHit>,
}

pub struct ReverseImageSource {
    service_name: &'static str,
    search_endpoint: String,
    http: Client,
}

impl ReverseImageSource {
    pub fn new(service_name: &'static str, search_endpoint: impl Into<String>) -> Self {
        Self {
            service_name,
            search_endpoint: search_endpoint.into(),
            http: Client::builder()
                .timeout(Duration::from_secs(20))
                .user_agent("sentinel-scanner/1.0")
                .build()
                .expect("failed to initialize reverse image http client"),
        }
    }

    async fn search_one(&self, bucket: &str, path: &str) -> Result<Vec<ReverseImageHit>, DiscoveryError> {
        let breaker = CIRCUIT_BREAKERS.get(self.service_name);
        breaker
            .check(self.service_name)
            .map_err(|e| DiscoveryError::Transient(e.to_string()))?;

        let limiter = RATE_LIMITERS.get(self.service_name);
        limiter.acquire(1.0).await;

        let response = self
            .http
            .get(&self.search_endpoint)
            .query(&[("bucket", bucket), ("path", path)])
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                breaker.record_success(self.service_name);
                let body: ReverseImageResponse = resp
                    .json()
                    .await
                    .map_err(|e| DiscoveryError::Permanent(format!("unparseable response: {}", e)))?;
                Ok(body.results)
            }
            Ok(resp) if resp.status().as_u16() == 429 || resp.status().is_server_error() => {
                breaker.record_failure(self.service_name);
                Err(DiscoveryError::Transient(format!("upstream status {}", resp.status())))
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "reverse image search rejected permanently");
                Ok(Vec::new())
            }
            Err(e) => {
                breaker.record_failure(self.service_name);
                Err(DiscoveryError::Transient(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl DiscoverySource for ReverseImageSource {
    #[instrument(skip(self, context), fields(service = self.service_name))]
    async fn discover(&self, context: &DiscoveryContext) -> Result<DiscoveryOutcome, DiscoveryError> {
        let mut images = Vec::new();

        for (bucket, path) in &context.reference_images {
            let hits = self.search_one(bucket, path).await?;
            images.extend(hits.into_iter().map(|hit| DiscoveredImageCandidate {
                source_url: hit.image_url,
                page_url: hit.page_url,
                page_title: hit.title,
                platform: None,
            }));
        }

        Ok(DiscoveryOutcome { images, ..Default::default() })
    }

    fn get_source_type(&self) -> SourceType {
        SourceType::ReverseImage
    }

    fn get_source_name(&self) -> &'static str {
        self.service_name
    }
}
