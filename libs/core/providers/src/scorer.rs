// [libs/core/providers/src/scorer.rs]
/*!
 * =================================================================
 * APARATO: MATCH SCORER
 * CLASIFICACIÓN: PROVIDER (ESTRATO L1-CORE)
 * RESPONSABILIDAD: MAPEO DE SIMILITUD COSENO -> NIVEL DE CONFIANZA
 *
 * Two variants share one contract: `score(similarity) -> Option<tier>`,
 * `None` meaning "below the low threshold, drop". `StaticMatchScorer` reads
 * fixed thresholds from configuration. `MlMatchScorer` refreshes its
 * thresholds from the latest `threshold_optimizer` `MlModelState` row every
 * `refresh_every` calls, falling back to the static defaults when no row is
 * present yet or the stored parameters fail `is_well_formed`.
 * =================================================================
 */

use sentinel_domain_models::matching::ConfidenceTier;
use sentinel_domain_models::ml_model::{LearnedThresholds, MlModelState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

pub const DEFAULT_LOW_THRESHOLD: f32 = 0.50;
pub const DEFAULT_MEDIUM_THRESHOLD: f32 = 0.65;
pub const DEFAULT_HIGH_THRESHOLD: f32 = 0.85;
pub const DEFAULT_REFRESH_EVERY: u64 = 100;

fn tier_for(similarity: f32, thresholds: LearnedThresholds) -> Option<ConfidenceTier> {
    if similarity >= thresholds.high {
        Some(ConfidenceTier::High)
    } else if similarity >= thresholds.medium {
        Some(ConfidenceTier::Medium)
    } else if similarity >= thresholds.low {
        Some(ConfidenceTier::Low)
    } else {
        None
    }
}

pub trait MatchScorerProvider: Send + Sync {
    fn score(&self, similarity: f32) -> Option<ConfidenceTier>;
}

#[derive(Debug, Clone, Copy)]
pub struct StaticMatchScorer {
    thresholds: LearnedThresholds,
}

impl Default for StaticMatchScorer {
    fn default() -> Self {
        Self {
            thresholds: LearnedThresholds {
                low: DEFAULT_LOW_THRESHOLD,
                medium: DEFAULT_MEDIUM_THRESHOLD,
                high: DEFAULT_HIGH_THRESHOLD,
            },
        }
    }
}

impl StaticMatchScorer {
    pub fn new(thresholds: LearnedThresholds) -> Self {
        debug_assert!(thresholds.is_well_formed());
        Self { thresholds }
    }
}

impl MatchScorerProvider for StaticMatchScorer {
    fn score(&self, similarity: f32) -> Option<ConfidenceTier> {
        tier_for(similarity, self.thresholds)
    }
}

/// A source of the latest promoted `threshold_optimizer` model row. Kept
/// behind a trait so the scorer's refresh logic is testable without a
/// database.
pub trait ThresholdSource: Send + Sync {
    fn latest_threshold_optimizer_state(&self) -> Option<MlModelState>;
}

pub struct MlMatchScorer<S: ThresholdSource> {
    source: S,
    refresh_every: u64,
    calls_since_refresh: AtomicU64,
    current: Mutex<LearnedThresholds>,
}

impl<S: ThresholdSource> MlMatchScorer<S> {
    pub fn new(source: S) -> Self {
        Self::with_refresh_cadence(source, DEFAULT_REFRESH_EVERY)
    }

    pub fn with_refresh_cadence(source: S, refresh_every: u64) -> Self {
        let fallback = LearnedThresholds {
            low: DEFAULT_LOW_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        };
        let mut scorer = Self {
            source,
            refresh_every,
            calls_since_refresh: AtomicU64::new(0),
            current: Mutex::new(fallback),
        };
        scorer.refresh_now();
        scorer
    }

    fn refresh_now(&mut self) {
        let resolved = self.resolve_thresholds();
        *self.current.lock().expect("threshold cache lock poisoned") = resolved;
        self.calls_since_refresh.store(0, Ordering::SeqCst);
    }

    /// Allows the promotion path to force an immediate refresh instead of
    /// waiting for the call-count counter to roll over.
    pub fn force_refresh(&self) {
        let resolved = self.resolve_thresholds();
        *self.current.lock().expect("threshold cache lock poisoned") = resolved;
        self.calls_since_refresh.store(0, Ordering::SeqCst);
    }

    fn resolve_thresholds(&self) -> LearnedThresholds {
        let fallback = LearnedThresholds {
            low: DEFAULT_LOW_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        };

        let Some(state) = self.source.latest_threshold_optimizer_state() else {
            return fallback;
        };

        match serde_json::from_value::<LearnedThresholds>(state.parameters) {
            Ok(thresholds) if thresholds.is_well_formed() => {
                info!(version = state.version, "refreshed match thresholds from learned state");
                thresholds
            }
            Ok(_) => {
                warn!(version = state.version, "learned thresholds are malformed, keeping fallback");
                fallback
            }
            Err(error) => {
                warn!(version = state.version, %error, "failed to parse learned thresholds, keeping fallback");
                fallback
            }
        }
    }
}

impl<S: ThresholdSource> MatchScorerProvider for MlMatchScorer<S> {
    fn score(&self, similarity: f32) -> Option<ConfidenceTier> {
        let previous = self.calls_since_refresh.fetch_add(1, Ordering::SeqCst);
        if previous > 0 && previous % self.refresh_every == 0 {
            self.force_refresh();
        }

        let thresholds = *self.current.lock().expect("threshold cache lock poisoned");
        tier_for(similarity, thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn static_scorer_maps_similarity_to_tier_boundaries() {
        let scorer = StaticMatchScorer::default();
        assert_eq!(scorer.score(0.49), None);
        assert_eq!(scorer.score(0.50), Some(ConfidenceTier::Low));
        assert_eq!(scorer.score(0.65), Some(ConfidenceTier::Medium));
        assert_eq!(scorer.score(0.85), Some(ConfidenceTier::High));
        assert_eq!(scorer.score(0.99), Some(ConfidenceTier::High));
    }

    struct NoRowsSource;
    impl ThresholdSource for NoRowsSource {
        fn latest_threshold_optimizer_state(&self) -> Option<MlModelState> {
            None
        }
    }

    #[test]
    fn ml_scorer_falls_back_to_static_defaults_with_no_row() {
        let scorer = MlMatchScorer::new(NoRowsSource);
        assert_eq!(scorer.score(0.50), Some(ConfidenceTier::Low));
    }

    struct LearnedSource;
    impl ThresholdSource for LearnedSource {
        fn latest_threshold_optimizer_state(&self) -> Option<MlModelState> {
            Some(MlModelState {
                model_name: "threshold_optimizer".to_string(),
                version: 2,
                parameters: serde_json::json!({"low": 0.4, "medium": 0.6, "high": 0.8}),
            })
        }
    }

    #[test]
    fn ml_scorer_adopts_learned_thresholds_on_construction() {
        let scorer = MlMatchScorer::new(LearnedSource);
        assert_eq!(scorer.score(0.45), Some(ConfidenceTier::Low));
        assert_eq!(scorer.score(0.39), None);
    }

    struct MalformedSource;
    impl ThresholdSource for MalformedSource {
        fn latest_threshold_optimizer_state(&self) -> Option<MlModelState> {
            Some(MlModelState {
                model_name: "threshold_optimizer".to_string(),
                version: 3,
                parameters: serde_json::json!({"low": 0.9, "medium": 0.6, "high": 0.8}),
            })
        }
    }

    #[test]
    fn ml_scorer_rejects_malformed_thresholds_and_keeps_fallback() {
        let scorer = MlMatchScorer::new(MalformedSource);
        assert_eq!(scorer.score(0.85), Some(ConfidenceTier::High));
    }

    #[test]
    fn ml_scorer_refreshes_after_refresh_cadence_calls() {
        let scorer = MlMatchScorer::with_refresh_cadence(NoRowsSource, 3);
        for _ in 0..3 {
            scorer.score(0.0);
        }
        // Refresh happens on the call after the cadence boundary; the
        // source here always returns the same fallback so this just
        // exercises the refresh path without panicking.
        assert_eq!(scorer.score(0.99), Some(ConfidenceTier::High));
    }

    proptest::proptest! {
        #[test]
        fn tier_for_is_monotonic_in_similarity(
            low in 0.0f32..0.5,
            medium_gap in 0.0f32..0.3,
            high_gap in 0.0f32..0.3,
            a in 0.0f32..1.0,
            b in 0.0f32..1.0,
        ) {
            let thresholds = LearnedThresholds { low, medium: low + medium_gap, high: low + medium_gap + high_gap };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let tier_lo = tier_for(lo, thresholds);
            let tier_hi = tier_for(hi, thresholds);
            prop_assert!(tier_hi >= tier_lo);
        }
    }
}
