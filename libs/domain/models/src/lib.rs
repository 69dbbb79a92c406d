// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS ROOT (V1.0 - SCANNING CONTROL PLANE)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L2-DOMAIN)
 * RESPONSABILIDAD: DEFINICIÓN ÚNICA DE ENTIDADES Y DTOs DEL DOMINIO
 * =================================================================
 */

pub mod contributor;
pub mod image;
pub mod matching;
pub mod takedown;
pub mod job;
pub mod platform_crawl;
pub mod platform_map;
pub mod signal;
pub mod ml_model;
pub mod notification;
pub mod tier_config;

pub use contributor::{Contributor, ContributorTier, Embedding, KnownAccount};
pub use image::{DiscoveredImage, ImageStatus, DiscoveredFaceEmbedding};
pub use matching::{ConfidenceTier, Match, ReviewStatus};
pub use takedown::{Takedown, TakedownStatus};
pub use job::{JobKind, LeaseState, ScanJob};
pub use platform_crawl::PlatformCrawlSchedule;
pub use platform_map::{compute_diff, MapDiff, PlatformMap, Section};
pub use signal::FeedbackSignal;
pub use ml_model::MlModelState;
pub use notification::Notification;
pub use tier_config::TierConfig;
