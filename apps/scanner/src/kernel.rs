// [apps/scanner/src/kernel.rs]
/*!
 * Composition root: connects the database, assembles providers and
 * discovery sources from configuration, and launches the background
 * daemons alongside the HTTP health surface.
 */

use crate::config::{MatchScorerVariant, ScannerConfig};
use crate::discovery::DiscoverySources;
use crate::providers::{SharedThresholdSource, UnconfiguredAiDetectionProvider, UnconfiguredFaceDetectionProvider};
use crate::routes::create_router;
use crate::services::scheduler::Scheduler;
use crate::services::{spawn_cleanup_service, Observer};
use crate::state::AppState;
use sentinel_core_providers::{MatchScorerProvider, MlMatchScorer, ProviderRegistry, StaticMatchScorer};
use sentinel_domain_pipeline::threshold_cache::CachedThresholdSource;
use sentinel_domain_pipeline::NullEvidenceSink;
use sentinel_infra_db::repositories::MlModelRepository;
use sentinel_infra_db::{schema::apply_full_schema, TursoClient};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

pub struct ScannerKernel {
    config: Arc<ScannerConfig>,
    state: AppState,
    shutdown: Arc<AtomicBool>,
}

impl ScannerKernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: ScannerConfig) -> Self {
        let config = Arc::new(config);

        let database_client = TursoClient::connect(&config.database_url, config.database_auth_token.clone())
            .await
            .expect("FATAL: could not connect to the database, aborting startup");

        let schema_connection = database_client
            .get_connection()
            .expect("FATAL: could not acquire a connection to apply the schema");
        apply_full_schema(&schema_connection)
            .await
            .expect("FATAL: schema synchronization failed");

        let match_scorer: Arc<dyn MatchScorerProvider> = match config.match_scorer_variant {
            MatchScorerVariant::Static => Arc::new(StaticMatchScorer::default()),
            MatchScorerVariant::Ml => {
                let threshold_source = CachedThresholdSource::new();
                let model_connection = database_client
                    .get_connection()
                    .expect("FATAL: could not acquire a connection to seed the threshold cache");
                threshold_source.refresh_once(&MlModelRepository::new(model_connection)).await;
                let threshold_source = Arc::new(threshold_source);

                let refresh_connection = database_client
                    .get_connection()
                    .expect("FATAL: could not acquire a connection for the threshold refresh loop");
                threshold_source
                    .clone()
                    .spawn_refresh_loop(MlModelRepository::new(refresh_connection), Duration::from_secs(300));

                Arc::new(MlMatchScorer::new(SharedThresholdSource(threshold_source)))
            }
        };

        let providers = ProviderRegistry::new(
            Arc::new(UnconfiguredFaceDetectionProvider),
            Arc::new(UnconfiguredAiDetectionProvider),
            match_scorer,
        );

        let observer = Arc::new(Observer::new(database_client.clone()));
        let state = AppState::new(database_client, config.clone(), providers, observer);

        Self { config, state, shutdown: Arc::new(AtomicBool::new(false)) }
    }

    pub async fn launch(self) {
        let discovery = Arc::new(DiscoverySources::from_config(&self.config));

        let scheduler = Arc::new(Scheduler::new(
            self.state.database_client.clone(),
            self.config.clone(),
            self.state.providers.clone(),
            discovery,
            Arc::new(NullEvidenceSink),
            self.state.observer.clone(),
            self.shutdown.clone(),
        ));
        scheduler.spawn_tick_loop();

        self.state.observer.clone().spawn_periodic_flush_loop();
        spawn_cleanup_service(self.state.database_client.clone());

        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received, draining in-flight work");
            shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        let router = create_router(self.state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.config.http_port);

        info!(%bind_address, "scanner listening");
        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL: failed to bind HTTP listener");

        if let Err(error) = axum::serve(listener, router).await {
            error!(%error, "HTTP server exited with an error");
            std::process::exit(1);
        }
    }
}
