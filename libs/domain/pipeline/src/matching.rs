// [libs/domain/pipeline/src/matching.rs]
/*!
 * Nearest-neighbor search against the contributor embedding registry,
 * confidence tiering via `MatchScorerProvider`, allowlist filtering, and
 * per-tier gating of AI detection / evidence capture / notification.
 * Every scored candidate is persisted as a `Match` row unconditionally;
 * gating only controls the *downstream* actions a match triggers.
 *
 * The registry itself is tier-gated at the source: `matching_registry`
 * excludes a free-tier contributor's secondary embeddings per
 * `TierConfig::crawl_registry_primary_only`, so a free-tier embedding
 * never even reaches the comparator unless it's primary.
 */

use crate::allowlist::check_allowlist;
use chrono::Utc;
use sentinel_core_providers::ProviderRegistry;
use sentinel_domain_models::contributor::Embedding;
use sentinel_domain_models::image::{DiscoveredFaceEmbedding, DiscoveredImage, ImageStatus};
use sentinel_domain_models::matching::{ConfidenceTier, Match, ReviewStatus};
use sentinel_domain_models::tier_config::TierConfig;
use sentinel_infra_db::repositories::{
    ContributorRepository, DiscoveredImageRepository, MatchRepository, NotificationRepository, TakedownRepository,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Enqueues downstream evidence capture for a gated match. The capture
/// mechanism itself (headless-browser screenshot, SHA-256, object storage
/// upload) is a downstream sink outside this crate's scope; this trait is
/// the seam a caller wires a real implementation into.
pub trait EvidenceSink: Send + Sync {
    fn enqueue_screenshot(&self, match_id: Uuid, page_url: &str);
}

pub struct NullEvidenceSink;

impl EvidenceSink for NullEvidenceSink {
    fn enqueue_screenshot(&self, _match_id: Uuid, _page_url: &str) {}
}

/// One scored candidate from a single comparator pass: a contributor
/// embedding paired with its raw cosine similarity against a query face.
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate {
    pub contributor_id: Uuid,
    pub embedding_id: Uuid,
    pub similarity: f32,
    pub primary: bool,
}

/// Cosine similarity as a plain dot product: every stored embedding is
/// asserted unit-norm at insert time, so the norms fall out of the formula.
fn cosine_similarity(query: &[f32], reference: &[f32]) -> f32 {
    query.iter().zip(reference).map(|(a, b)| a * b).sum()
}

pub struct Comparator;

impl Comparator {
    /// Scores `query` against every embedding in the registry, keeps those
    /// at or above `threshold`, and returns the top `limit` sorted by
    /// descending similarity. On a similarity tie, a primary embedding
    /// ranks ahead of a secondary one.
    pub fn compare(query: &[f32], registry: &[Embedding], threshold: f32, limit: usize) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = registry
            .iter()
            .map(|embedding| MatchCandidate {
                contributor_id: embedding.contributor_id,
                embedding_id: embedding.id,
                similarity: cosine_similarity(query, &embedding.vector),
                primary: embedding.primary,
            })
            .filter(|candidate| candidate.similarity >= threshold)
            .collect();

        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.primary.cmp(&a.primary))
        });
        candidates.truncate(limit);
        candidates
    }
}

/// Candidates below this raw similarity never reach a scorer; it is looser
/// than any tier's low threshold so a dynamically-lowered `MlMatchScorer`
/// threshold is never starved of candidates to consider.
pub const COMPARATOR_FLOOR: f32 = 0.30;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 5;

#[derive(Debug, Default, Clone, Copy)]
pub struct MatchingSummary {
    pub images_matched: u64,
    pub images_no_match: u64,
    pub matches_persisted: u64,
    pub notifications_sent: u64,
}

pub struct MatchingStage {
    contributors: ContributorRepository,
    images: DiscoveredImageRepository,
    matches: MatchRepository,
    notifications: NotificationRepository,
    takedowns: TakedownRepository,
    providers: ProviderRegistry,
    evidence: Arc<dyn EvidenceSink>,
    candidate_limit: usize,
}

impl MatchingStage {
    pub fn new(
        contributors: ContributorRepository,
        images: DiscoveredImageRepository,
        matches: MatchRepository,
        notifications: NotificationRepository,
        takedowns: TakedownRepository,
        providers: ProviderRegistry,
        evidence: Arc<dyn EvidenceSink>,
    ) -> Self {
        Self {
            contributors,
            images,
            matches,
            notifications,
            takedowns,
            providers,
            evidence,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, batch_limit: i64) -> MatchingSummary {
        let pairs = match self.images.embedded(batch_limit).await {
            Ok(pairs) => pairs,
            Err(error) => {
                warn!(%error, "failed to fetch embedded images for matching");
                return MatchingSummary::default();
            }
        };
        if pairs.is_empty() {
            return MatchingSummary::default();
        }

        let registry = match self.contributors.matching_registry().await {
            Ok(registry) => registry,
            Err(error) => {
                warn!(%error, "failed to load contributor embedding registry");
                return MatchingSummary::default();
            }
        };

        let mut summary = MatchingSummary::default();
        for (image, face) in &pairs {
            let persisted = self.match_one(image, face, &registry, &mut summary).await;
            let status = if persisted { ImageStatus::Matched } else { ImageStatus::NoMatch };
            if status == ImageStatus::Matched {
                summary.images_matched += 1;
            } else {
                summary.images_no_match += 1;
            }
            if let Err(error) = self.images.set_status(image.id, status, None).await {
                warn!(%error, "failed to record matching outcome status");
            }
        }
        summary
    }

    /// Scores and persists every qualifying candidate for one discovered
    /// face. Returns whether at least one `Match` row was persisted.
    #[instrument(skip(self, image, face, registry, summary), fields(image_id = %image.id))]
    async fn match_one(
        &self,
        image: &DiscoveredImage,
        face: &DiscoveredFaceEmbedding,
        registry: &[Embedding],
        summary: &mut MatchingSummary,
    ) -> bool {
        let candidates = Comparator::compare(&face.vector, registry, COMPARATOR_FLOOR, self.candidate_limit);

        let mut persisted_any = false;
        for candidate in candidates {
            let Some(confidence_tier) = self.providers.match_scorer.score(candidate.similarity) else {
                continue;
            };

            let contributor = match self.contributors.get(candidate.contributor_id).await {
                Ok(contributor) => contributor,
                Err(error) => {
                    warn!(%error, contributor_id = %candidate.contributor_id, "failed to load contributor for candidate match");
                    continue;
                }
            };
            let tier_config = TierConfig::for_tier(contributor.tier);

            // A platform-sourced image (one discovered by a platform-crawl
            // source rather than a reverse-image search) is only scored
            // against contributors whose tier allows it.
            if image.platform.is_some() && !tier_config.platform_crawl_matching {
                continue;
            }

            let known_accounts = match self.contributors.known_accounts_for(candidate.contributor_id).await {
                Ok(accounts) => accounts,
                Err(error) => {
                    warn!(%error, "failed to load known accounts, treating candidate as not allowlisted");
                    Vec::new()
                }
            };
            let known_account = check_allowlist(image.page_url.as_deref(), &known_accounts).is_some();

            let match_row = Match {
                id: Uuid::new_v4(),
                contributor_id: candidate.contributor_id,
                discovered_image_id: image.id,
                discovered_face_embedding_id: face.id,
                similarity: candidate.similarity,
                confidence_tier,
                known_account,
                ai_generated: None,
                ai_detection_score: None,
                review_status: ReviewStatus::New,
                created_at: Utc::now(),
            };

            // Every tier stores a scored match unconditionally; gating only
            // ever controls the downstream actions below.
            debug_assert!(tier_config.store_match, "no tier currently opts a contributor out of match persistence");

            if let Err(error) = self.matches.insert(&match_row).await {
                warn!(%error, "failed to persist match");
                continue;
            }
            persisted_any = true;
            summary.matches_persisted += 1;

            self.run_gated_actions(&match_row, image, &contributor, tier_config, known_account, confidence_tier, summary).await;
        }

        persisted_any
    }

    /// A match triggers AI detection / evidence capture / notification only
    /// if it is not a known-account self-match, the contributor's tier
    /// flags the action on, and the confidence tier is above `low`.
    #[instrument(skip(self, match_row, image, contributor, summary))]
    async fn run_gated_actions(
        &self,
        match_row: &Match,
        image: &DiscoveredImage,
        contributor: &sentinel_domain_models::contributor::Contributor,
        tier_config: &TierConfig,
        known_account: bool,
        confidence_tier: ConfidenceTier,
        summary: &mut MatchingSummary,
    ) {
        if known_account || confidence_tier == ConfidenceTier::Low {
            return;
        }

        if tier_config.show_full_details {
            info!(match_id = %match_row.id, source_url = %image.source_url, similarity = match_row.similarity, "match ready for full-detail review");
        } else {
            info!(match_id = %match_row.id, "match ready for review (full detail withheld by tier)");
        }

        if tier_config.ai_detection {
            match self.providers.ai_detection.classify(&image.source_url).await {
                Ok(Some(verdict)) => {
                    if let Err(error) = self
                        .matches
                        .record_ai_detection_verdict(match_row.id, verdict.is_ai_generated, verdict.score)
                        .await
                    {
                        warn!(%error, "failed to record AI detection verdict");
                    }
                }
                Ok(None) => {}
                Err(error) => warn!(%error, "AI detection provider failed"),
            }
        }

        if tier_config.capture_evidence {
            if let Some(page_url) = image.page_url.as_deref() {
                self.evidence.enqueue_screenshot(match_row.id, page_url);
            }
        }

        if tier_config.notify_on_match {
            if let Err(error) = self.notifications.insert(match_row.contributor_id, match_row.id).await {
                warn!(%error, "failed to enqueue notification");
            } else {
                summary.notifications_sent += 1;
            }
        }

        if tier_config.generate_takedown {
            let notice_body = format!(
                "Unauthorized use of {}'s likeness was detected at {}. This notice requests removal of the identified content.",
                contributor.display_name, image.source_url,
            );
            if let Err(error) = self.takedowns.insert_pending(match_row.id, &notice_body).await {
                warn!(%error, "failed to draft takedown notice");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use libsql::params;
    use proptest::prelude::*;
    use sentinel_core_providers::{
        AiDetectionProvider, AiDetectionVerdict, BoundingBox, DetectedFace, FaceDetectionProvider, ProviderError,
        StaticMatchScorer,
    };
    use sentinel_infra_db::client::TursoClient;
    use std::sync::Arc;

    fn embedding(contributor_id: Uuid, vector: Vec<f32>, primary: bool) -> Embedding {
        Embedding { id: Uuid::new_v4(), contributor_id, vector, primary, created_at: Utc::now() }
    }

    /// Answers `classify` with whatever verdict the test wired in, so a
    /// `generate_takedown` assertion doesn't depend on a real classifier.
    struct FixedAiDetectionProvider {
        verdict: Option<AiDetectionVerdict>,
    }

    #[async_trait]
    impl AiDetectionProvider for FixedAiDetectionProvider {
        async fn classify(&self, _image_url: &str) -> Result<Option<AiDetectionVerdict>, ProviderError> {
            Ok(self.verdict.clone())
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    /// `MatchingStage` never calls `face_detection`; this only exists because
    /// `ProviderRegistry::new` requires one.
    struct UnreachableFaceDetectionProvider;

    impl FaceDetectionProvider for UnreachableFaceDetectionProvider {
        fn init_model(&self, _model_name: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn detect(&self, _image_bytes: &[u8]) -> Result<Vec<DetectedFace>, ProviderError> {
            unreachable!("matching never invokes face detection")
        }

        fn model_name(&self) -> &str {
            "unreachable"
        }
    }

    fn providers() -> ProviderRegistry {
        ProviderRegistry::new(
            Arc::new(UnreachableFaceDetectionProvider),
            Arc::new(FixedAiDetectionProvider { verdict: None }),
            Arc::new(StaticMatchScorer::default()),
        )
    }

    async fn stage_with_tier(tier: &str) -> (MatchingStage, TursoClient, Uuid) {
        let client = TursoClient::connect(":memory:", None).await.expect("in-memory connect");

        let seed = client.get_connection().expect("connection");
        let contributor_id = Uuid::new_v4();
        seed.execute(
            "INSERT INTO contributors (id, display_name, tier) VALUES (?1, ?2, ?3)",
            params![contributor_id.to_string(), "seed", tier],
        )
        .await
        .unwrap();

        let stage = MatchingStage::new(
            ContributorRepository::new(client.get_connection().unwrap()),
            DiscoveredImageRepository::new(client.get_connection().unwrap()),
            MatchRepository::new(client.get_connection().unwrap()),
            NotificationRepository::new(client.get_connection().unwrap()),
            TakedownRepository::new(client.get_connection().unwrap()),
            providers(),
            Arc::new(NullEvidenceSink),
        );
        (stage, client, contributor_id)
    }

    /// A contributor's primary embedding, a platform-sourced image above the
    /// high threshold, and a `premium` tier (which both allows
    /// platform-crawl matching and generates takedowns) together exercise
    /// the full gated-actions path added for per-tier dispatch.
    #[tokio::test]
    async fn premium_tier_platform_match_persists_and_drafts_a_takedown() {
        let (stage, client, contributor_id) = stage_with_tier("premium").await;
        let contributors = ContributorRepository::new(client.get_connection().unwrap());
        let images = DiscoveredImageRepository::new(client.get_connection().unwrap());
        let takedowns = TakedownRepository::new(client.get_connection().unwrap());

        contributors.insert_embedding(contributor_id, &[1.0, 0.0], true).await.unwrap();

        let image_id = images
            .insert_pending("https://platform.example/photo.jpg", Some("https://platform.example/post"), None, Some("instagram"))
            .await
            .unwrap();
        images.set_status(image_id, ImageStatus::Embedded, None).await.unwrap();
        images.insert_face_embedding(image_id, &[1.0, 0.0], 0.95).await.unwrap();

        let summary = stage.run(10).await;

        assert_eq!(summary.matches_persisted, 1);
        assert_eq!(summary.images_matched, 1);

        let drafted = takedowns.pending(10).await.unwrap();
        assert_eq!(drafted.len(), 1);
        assert!(drafted[0].notice_body.contains("platform.example/photo.jpg"));
    }

    /// A `free`-tier contributor never generates a takedown, even when a
    /// platform-sourced image clears the high threshold.
    #[tokio::test]
    async fn free_tier_platform_match_persists_without_a_takedown() {
        let (stage, client, contributor_id) = stage_with_tier("free").await;
        let contributors = ContributorRepository::new(client.get_connection().unwrap());
        let images = DiscoveredImageRepository::new(client.get_connection().unwrap());
        let takedowns = TakedownRepository::new(client.get_connection().unwrap());

        contributors.insert_embedding(contributor_id, &[1.0, 0.0], true).await.unwrap();

        let image_id = images
            .insert_pending("https://platform.example/free.jpg", None, None, Some("instagram"))
            .await
            .unwrap();
        images.set_status(image_id, ImageStatus::Embedded, None).await.unwrap();
        images.insert_face_embedding(image_id, &[1.0, 0.0], 0.95).await.unwrap();

        let summary = stage.run(10).await;

        assert_eq!(summary.matches_persisted, 1);
        assert!(takedowns.pending(10).await.unwrap().is_empty());
    }

    #[test]
    fn compare_ranks_by_descending_similarity() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let registry = vec![
            embedding(a, vec![1.0, 0.0], true),
            embedding(b, vec![0.6, 0.8], true),
        ];
        let results = Comparator::compare(&[1.0, 0.0], &registry, 0.0, 5);
        assert_eq!(results[0].contributor_id, a);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn compare_filters_below_threshold() {
        let registry = vec![embedding(Uuid::new_v4(), vec![0.1, 0.0], true)];
        let results = Comparator::compare(&[1.0, 0.0], &registry, 0.5, 5);
        assert!(results.is_empty());
    }

    #[test]
    fn compare_truncates_to_limit() {
        let registry: Vec<Embedding> = (0..10).map(|_| embedding(Uuid::new_v4(), vec![1.0, 0.0], true)).collect();
        let results = Comparator::compare(&[1.0, 0.0], &registry, 0.0, 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn compare_breaks_ties_in_favor_of_primary() {
        let contributor = Uuid::new_v4();
        let registry = vec![
            embedding(contributor, vec![1.0, 0.0], false),
            embedding(contributor, vec![1.0, 0.0], true),
        ];
        let results = Comparator::compare(&[1.0, 0.0], &registry, 0.0, 5);
        assert!(results[0].primary);
        assert!(!results[1].primary);
    }

    proptest::proptest! {
        #[test]
        fn compare_never_exceeds_limit_and_always_meets_threshold(
            query in proptest::collection::vec(-1.0f32..1.0, 4),
            vectors in proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, 4), 0..20),
            threshold in -1.0f32..1.0,
            limit in 0usize..10,
        ) {
            let registry: Vec<Embedding> = vectors.into_iter().map(|v| embedding(Uuid::new_v4(), v, false)).collect();
            let results = Comparator::compare(&query, &registry, threshold, limit);
            prop_assert!(results.len() <= limit);
            prop_assert!(results.iter().all(|c| c.similarity >= threshold));
            for window in results.windows(2) {
                prop_assert!(window[0].similarity >= window[1].similarity);
            }
        }
    }
}
