// [libs/domain/models/src/signal.rs]
/*!
 * An append-only, structured event describing something noteworthy the
 * pipeline observed. Consumed offline to tune thresholds and policies;
 * never read back by the pipeline itself.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSignal {
    pub signal_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub context: serde_json::Value,
    pub actor: String,
    pub emitted_at: DateTime<Utc>,
}

impl FeedbackSignal {
    pub fn new(
        signal_type: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        context: serde_json::Value,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            signal_type: signal_type.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            context,
            actor: actor.into(),
            emitted_at: Utc::now(),
        }
    }
}
