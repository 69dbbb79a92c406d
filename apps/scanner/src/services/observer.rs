// [apps/scanner/src/services/observer.rs]
/*!
 * =================================================================
 * APARATO: FEEDBACK SIGNAL OBSERVER
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: BATCHED PERSISTENCE OF PIPELINE FEEDBACK SIGNALS
 *
 * Buffers signals in memory and flushes in batches rather than one round
 * trip per signal. A flush fires when the buffer reaches 50 rows or 30
 * seconds have elapsed since the last flush, whichever comes first; a
 * match-review signal instead flushes immediately, since review outcomes
 * feed threshold tuning on a tighter loop than the rest of the telemetry.
 * The buffer is capped at 500 rows; past that, the oldest signal is
 * dropped with a warning rather than growing unbounded if the database is
 * unreachable.
 * =================================================================
 */

use sentinel_domain_models::signal::FeedbackSignal;
use sentinel_infra_db::repositories::SignalRepository;
use sentinel_infra_db::TursoClient;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

const FLUSH_SIZE_TRIGGER: usize = 50;
const FLUSH_INTERVAL_SECONDS: i64 = 30;
const BUFFER_HARD_CAP: usize = 500;
const TICK_PERIOD: Duration = Duration::from_secs(5);

pub struct Observer {
    database_client: TursoClient,
    buffer: Mutex<Vec<FeedbackSignal>>,
    last_flush_epoch_seconds: AtomicI64,
}

impl Observer {
    pub fn new(database_client: TursoClient) -> Self {
        Self {
            database_client,
            buffer: Mutex::new(Vec::new()),
            last_flush_epoch_seconds: AtomicI64::new(chrono::Utc::now().timestamp()),
        }
    }

    /// Buffers a signal for the next periodic flush.
    #[instrument(skip(self, signal), fields(signal_type = %signal.signal_type))]
    pub async fn record(&self, signal: FeedbackSignal) {
        let should_flush_now = {
            let mut guard = self.buffer.lock().expect("observer buffer lock poisoned");
            if guard.len() >= BUFFER_HARD_CAP {
                guard.remove(0);
                warn!("observer buffer at hard cap, dropped oldest signal");
            }
            guard.push(signal);
            guard.len() >= FLUSH_SIZE_TRIGGER
        };

        if should_flush_now {
            self.flush().await;
        }
    }

    /// Buffers and flushes immediately, bypassing the batching window. Used
    /// for match-review signals, which feed threshold tuning on a tighter
    /// loop than the rest of the telemetry.
    #[instrument(skip(self, signal), fields(signal_type = %signal.signal_type))]
    pub async fn record_immediate(&self, signal: FeedbackSignal) {
        {
            let mut guard = self.buffer.lock().expect("observer buffer lock poisoned");
            guard.push(signal);
        }
        self.flush().await;
    }

    /// Snapshots the buffer rather than draining it, so a failed insert
    /// leaves every signal in place for the next flush to retry. Only the
    /// flushed prefix is removed on success; anything appended by a
    /// concurrent `record` while this flush was in flight survives.
    #[instrument(skip(self))]
    pub async fn flush(&self) {
        let batch: Vec<FeedbackSignal> = {
            let guard = self.buffer.lock().expect("observer buffer lock poisoned");
            guard.clone()
        };

        if batch.is_empty() {
            return;
        }

        let connection = match self.database_client.get_connection() {
            Ok(connection) => connection,
            Err(error) => {
                error!(%error, buffered = batch.len(), "observer flush failed to acquire a connection, signals retained for retry");
                return;
            }
        };

        let repository = SignalRepository::new(&connection);
        match repository.insert_batch(&batch).await {
            Ok(()) => {
                let mut guard = self.buffer.lock().expect("observer buffer lock poisoned");
                guard.drain(0..batch.len());
                info!(flushed = batch.len(), remaining = guard.len(), "observer flushed feedback signals");
                drop(guard);
                self.last_flush_epoch_seconds.store(chrono::Utc::now().timestamp(), Ordering::SeqCst);
            }
            Err(error) => {
                error!(%error, buffered = batch.len(), "observer flush failed, signals retained for retry");
            }
        }
    }

    fn due_for_periodic_flush(&self) -> bool {
        let elapsed = chrono::Utc::now().timestamp() - self.last_flush_epoch_seconds.load(Ordering::SeqCst);
        elapsed >= FLUSH_INTERVAL_SECONDS
    }

    /// One final flush, called from the shutdown path so nothing buffered
    /// is lost on a graceful exit.
    pub async fn shutdown(&self) {
        info!("observer flushing on shutdown");
        self.flush().await;
    }

    pub fn spawn_periodic_flush_loop(self: std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if self.due_for_periodic_flush() {
                    self.flush().await;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flush_retains_buffered_signals_when_the_insert_fails() {
        let client = TursoClient::connect(":memory:", None).await.unwrap();
        client.get_connection().unwrap().execute("DROP TABLE ml_feedback_signals", ()).await.unwrap();

        let observer = Observer::new(client);
        observer.record(FeedbackSignal::new("test", "entity", "1", serde_json::json!({}), "test")).await;
        observer.flush().await;

        assert_eq!(observer.buffer.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flush_only_drops_the_flushed_prefix() {
        let client = TursoClient::connect(":memory:", None).await.unwrap();
        let observer = Observer::new(client);

        observer.record(FeedbackSignal::new("test", "entity", "1", serde_json::json!({}), "test")).await;
        observer.flush().await;

        assert!(observer.buffer.lock().unwrap().is_empty());
    }

    #[test]
    fn hard_cap_drops_oldest_signal() {
        let mut buffer: Vec<FeedbackSignal> = (0..BUFFER_HARD_CAP)
            .map(|i| FeedbackSignal::new("test", "entity", i.to_string(), serde_json::json!({}), "test"))
            .collect();
        assert_eq!(buffer.len(), BUFFER_HARD_CAP);
        buffer.remove(0);
        buffer.push(FeedbackSignal::new("test", "entity", "new", serde_json::json!({}), "test"));
        assert_eq!(buffer.len(), BUFFER_HARD_CAP);
        assert_eq!(buffer[0].entity_id, "1");
    }
}
