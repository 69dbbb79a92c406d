// [libs/infra/db/src/repositories/signal.rs]
/*!
 * Batch sink for the observer's `flush()`. Grounded on the bulk-upsert
 * shape the teacher used for worker telemetry: build every statement inside
 * one transaction, commit once, never one round trip per row.
 */

use super::mapping::parse_timestamp;
use crate::errors::DbError;
use libsql::params;
use sentinel_domain_models::signal::FeedbackSignal;
use tracing::instrument;
use uuid::Uuid;

pub struct SignalRepository<'a> {
    connection: &'a libsql::Connection,
}

impl<'a> SignalRepository<'a> {
    pub fn new(connection: &'a libsql::Connection) -> Self {
        Self { connection }
    }

    /// Inserts every buffered signal inside a single transaction. A failure
    /// partway through rolls the whole batch back so the observer's retained
    /// buffer and the database agree on what was actually flushed.
    #[instrument(skip(self, signals), fields(batch_size = signals.len()))]
    pub async fn insert_batch(&self, signals: &[FeedbackSignal]) -> Result<(), DbError> {
        if signals.is_empty() {
            return Ok(());
        }

        let tx = self
            .connection
            .transaction()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        for signal in signals {
            let context_json = serde_json::to_string(&signal.context)
                .map_err(|e| DbError::MappingError(format!("feedback signal context serialization failed: {}", e)))?;

            tx.execute(
                "INSERT INTO ml_feedback_signals (id, signal_type, entity_type, entity_id, context_json, actor, emitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    signal.signal_type.clone(),
                    signal.entity_type.clone(),
                    signal.entity_id.clone(),
                    context_json,
                    signal.actor.clone(),
                    signal.emitted_at.to_rfc3339(),
                ],
            )
            .await?;
        }

        tx.commit().await.map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn recent(&self, limit: i64) -> Result<Vec<FeedbackSignal>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT signal_type, entity_type, entity_id, context_json, actor, emitted_at
                 FROM ml_feedback_signals ORDER BY emitted_at DESC LIMIT ?1",
                params![limit],
            )
            .await?;

        let mut signals = Vec::new();
        while let Some(row) = rows.next().await? {
            let signal_type: String = row.get(0)?;
            let entity_type: String = row.get(1)?;
            let entity_id: String = row.get(2)?;
            let context_json: String = row.get(3)?;
            let actor: String = row.get(4)?;
            let emitted_at: String = row.get(5)?;

            let context = serde_json::from_str(&context_json)
                .map_err(|e| DbError::MappingError(format!("feedback signal context deserialization failed: {}", e)))?;

            signals.push(FeedbackSignal {
                signal_type,
                entity_type,
                entity_id,
                context,
                actor,
                emitted_at: parse_timestamp(&emitted_at)?,
            });
        }
        Ok(signals)
    }
}
