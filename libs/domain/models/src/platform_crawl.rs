// [libs/domain/models/src/platform_crawl.rs]
/*!
 * Per-platform crawl resumption state: a pagination cursor plus optional
 * per-search-term and per-tag cursors so a platform crawl source can resume
 * exactly where it left off across restarts.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformCrawlSchedule {
    pub platform: String,
    pub interval_hours: i64,
    pub cursor: Option<String>,
    pub search_cursors: HashMap<String, String>,
    pub model_cursors: HashMap<String, String>,
    pub tags_total: u32,
    pub tags_exhausted: u32,
}
