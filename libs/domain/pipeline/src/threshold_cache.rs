// [libs/domain/pipeline/src/threshold_cache.rs]
/*!
 * Bridges the async `MlModelRepository` to `MatchScorerProvider`'s
 * synchronous `ThresholdSource` trait. A background task refreshes an
 * in-memory cache on a timer; the sync trait method only ever reads the
 * cache, never the database, so it can be called from inside the scorer's
 * hot path without an executor handle.
 */

use sentinel_core_providers::ThresholdSource;
use sentinel_domain_models::ml_model::MlModelState;
use sentinel_infra_db::repositories::MlModelRepository;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info, instrument};

const THRESHOLD_OPTIMIZER_MODEL_NAME: &str = "threshold_optimizer";

pub struct CachedThresholdSource {
    cached: Mutex<Option<MlModelState>>,
}

impl CachedThresholdSource {
    pub fn new() -> Self {
        Self { cached: Mutex::new(None) }
    }

    #[instrument(skip(self, repository))]
    pub async fn refresh_once(&self, repository: &MlModelRepository) {
        match repository.latest(THRESHOLD_OPTIMIZER_MODEL_NAME).await {
            Ok(state) => {
                *self.cached.lock().expect("threshold cache lock poisoned") = state;
            }
            Err(error) => {
                error!(%error, "failed to refresh threshold_optimizer state, keeping last known value");
            }
        }
    }

    /// Spawns the periodic refresh loop. Intended to be called once at
    /// bootstrap with the same `MlModelRepository` the pipeline otherwise
    /// uses for reads.
    pub fn spawn_refresh_loop(
        self: std::sync::Arc<Self>,
        repository: MlModelRepository,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.refresh_once(&repository).await;
                info!("threshold cache refreshed");
            }
        })
    }
}

impl Default for CachedThresholdSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ThresholdSource for CachedThresholdSource {
    fn latest_threshold_optimizer_state(&self) -> Option<MlModelState> {
        self.cached.lock().expect("threshold cache lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_falls_back_to_scorer_defaults() {
        let source = CachedThresholdSource::new();
        assert!(source.latest_threshold_optimizer_state().is_none());
    }
}
