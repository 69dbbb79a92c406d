// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * Shared row-mapping helpers live in `mapping`; every repository below
 * takes an owned `Connection` rather than a `TursoClient`, so callers
 * decide connection lifetime and pooling at the construction site.
 * =================================================================
 */

pub(crate) mod mapping;

pub mod job;

mod cleanup;
mod contributor;
mod discovered_image;
mod matching;
mod ml_model;
mod notification;
mod platform_crawl;
mod signal;
mod takedown;

pub use cleanup::{CleanupRepository, CleanupSummary};
pub use contributor::ContributorRepository;
pub use discovered_image::DiscoveredImageRepository;
pub use job::JobRepository;
pub use matching::MatchRepository;
pub use ml_model::MlModelRepository;
pub use notification::NotificationRepository;
pub use platform_crawl::PlatformCrawlRepository;
pub use signal::SignalRepository;
pub use takedown::TakedownRepository;
