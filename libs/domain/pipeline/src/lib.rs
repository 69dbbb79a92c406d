// [libs/domain/pipeline/src/lib.rs]
/*!
 * The two stages that turn a discovered image into a scored, gated Match
 * row: ingestion (download, detect, embed) and matching (nearest-neighbor
 * search, confidence tiering, gating). `url_parse` and `allowlist` are
 * shared utilities both the matching stage and discovery's platform
 * tagging depend on; `threshold_cache` bridges the ML scorer's
 * synchronous threshold lookup to the async database.
 */

pub mod allowlist;
pub mod ingestion;
pub mod matching;
pub mod threshold_cache;
pub mod url_parse;

pub use allowlist::check_allowlist;
pub use ingestion::{IngestionOutcome, IngestionStage, IngestionSummary};
pub use matching::{Comparator, EvidenceSink, MatchCandidate, MatchingStage, MatchingSummary, NullEvidenceSink};
pub use threshold_cache::CachedThresholdSource;
pub use url_parse::{parse_url, ParsedUrl};
