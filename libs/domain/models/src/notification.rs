// [libs/domain/models/src/notification.rs]
/*!
 * A user-visible record of a match worth surfacing. `read_at` gates the
 * 90-day retention class the cleanup component sweeps.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub match_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}
