// [libs/domain/models/src/takedown.rs]
/*!
 * A drafted takedown notice anchored to a match. Drafting and submission are
 * downstream sinks outside this repository's scope; the core only records
 * the row and its pending state until a human submits it.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakedownStatus {
    Pending,
    Submitted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Takedown {
    pub id: Uuid,
    pub match_id: Uuid,
    pub notice_body: String,
    pub status: TakedownStatus,
    pub created_at: DateTime<Utc>,
}
