// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: SCANNING CONTROL PLANE SCHEMA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Vectors are stored as JSON-encoded float arrays rather than a native
 * vector column: libSQL's vector extension is not assumed available on
 * every deployment target, and 512 floats as JSON text is small enough
 * that a dedicated binary encoding is not worth the complexity.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_CONTRIBUTORS", r#"
        CREATE TABLE IF NOT EXISTS contributors (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            tier TEXT NOT NULL DEFAULT 'free',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#),
    ("TABLE_EMBEDDINGS", r#"
        CREATE TABLE IF NOT EXISTS embeddings (
            id TEXT PRIMARY KEY,
            contributor_id TEXT NOT NULL REFERENCES contributors(id),
            vector_json TEXT NOT NULL,
            is_primary INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#),
    ("TABLE_KNOWN_ACCOUNTS", r#"
        CREATE TABLE IF NOT EXISTS known_accounts (
            id TEXT PRIMARY KEY,
            contributor_id TEXT NOT NULL REFERENCES contributors(id),
            platform TEXT,
            handle TEXT,
            domain TEXT
        );
    "#),
    ("TABLE_DISCOVERED_IMAGES", r#"
        CREATE TABLE IF NOT EXISTS discovered_images (
            id TEXT PRIMARY KEY,
            source_url TEXT NOT NULL,
            page_url TEXT,
            page_title TEXT,
            platform TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            status_reason TEXT,
            discovered_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            UNIQUE(source_url)
        );
    "#),
    ("TABLE_DISCOVERED_FACE_EMBEDDINGS", r#"
        CREATE TABLE IF NOT EXISTS discovered_face_embeddings (
            id TEXT PRIMARY KEY,
            discovered_image_id TEXT NOT NULL REFERENCES discovered_images(id),
            vector_json TEXT NOT NULL,
            detection_score REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#),
    ("TABLE_MATCHES", r#"
        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            contributor_id TEXT NOT NULL REFERENCES contributors(id),
            discovered_image_id TEXT NOT NULL REFERENCES discovered_images(id),
            discovered_face_embedding_id TEXT NOT NULL REFERENCES discovered_face_embeddings(id),
            similarity REAL NOT NULL,
            confidence_tier TEXT NOT NULL,
            known_account INTEGER NOT NULL DEFAULT 0,
            ai_generated INTEGER,
            ai_detection_score REAL,
            review_status TEXT NOT NULL DEFAULT 'new',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#),
    ("TABLE_TAKEDOWNS", r#"
        CREATE TABLE IF NOT EXISTS takedowns (
            id TEXT PRIMARY KEY,
            match_id TEXT NOT NULL REFERENCES matches(id),
            notice_body TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
    "#),
    ("TABLE_SCAN_JOBS", r#"
        CREATE TABLE IF NOT EXISTS scan_jobs (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            target TEXT NOT NULL,
            interval_hours INTEGER NOT NULL,
            last_run_at TEXT,
            lease_state TEXT NOT NULL DEFAULT 'idle',
            lease_owner TEXT,
            heartbeat_at TEXT,
            run_id TEXT,
            last_result_summary TEXT,
            UNIQUE(kind, target)
        );
    "#),
    ("TABLE_PLATFORM_CRAWL_SCHEDULE", r#"
        CREATE TABLE IF NOT EXISTS platform_crawl_schedule (
            platform TEXT PRIMARY KEY,
            interval_hours INTEGER NOT NULL,
            cursor TEXT,
            search_cursors_json TEXT NOT NULL DEFAULT '{}',
            model_cursors_json TEXT NOT NULL DEFAULT '{}',
            tags_total INTEGER NOT NULL DEFAULT 0,
            tags_exhausted INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_ML_FEEDBACK_SIGNALS", r#"
        CREATE TABLE IF NOT EXISTS ml_feedback_signals (
            id TEXT PRIMARY KEY,
            signal_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            context_json TEXT NOT NULL,
            actor TEXT NOT NULL,
            emitted_at TEXT NOT NULL
        );
    "#),
    ("TABLE_ML_MODEL_STATE", r#"
        CREATE TABLE IF NOT EXISTS ml_model_state (
            model_name TEXT NOT NULL,
            version INTEGER NOT NULL,
            parameters_json TEXT NOT NULL,
            promoted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (model_name, version)
        );
    "#),
    ("TABLE_NOTIFICATIONS", r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            contributor_id TEXT NOT NULL REFERENCES contributors(id),
            match_id TEXT NOT NULL REFERENCES matches(id),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            read_at TEXT
        );
    "#),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_EMBEDDINGS_CONTRIBUTOR", "CREATE INDEX IF NOT EXISTS idx_embeddings_contributor ON embeddings(contributor_id);"),
    ("IDX_KNOWN_ACCOUNTS_CONTRIBUTOR", "CREATE INDEX IF NOT EXISTS idx_known_accounts_contributor ON known_accounts(contributor_id);"),
    ("IDX_DISCOVERED_IMAGES_STATUS", "CREATE INDEX IF NOT EXISTS idx_discovered_images_status ON discovered_images(status, discovered_at);"),
    ("IDX_FACE_EMBEDDINGS_IMAGE", "CREATE INDEX IF NOT EXISTS idx_face_embeddings_image ON discovered_face_embeddings(discovered_image_id);"),
    ("IDX_MATCHES_CONTRIBUTOR", "CREATE INDEX IF NOT EXISTS idx_matches_contributor ON matches(contributor_id, created_at);"),
    ("IDX_SCAN_JOBS_DUE", "CREATE INDEX IF NOT EXISTS idx_scan_jobs_due ON scan_jobs(lease_state, last_run_at);"),
    ("IDX_NOTIFICATIONS_READ", "CREATE INDEX IF NOT EXISTS idx_notifications_read ON notifications(read_at);"),
];

/// Runs the idempotent schema sync sequence: table creation, then index
/// creation. There is no migration/evolution stratum yet because this
/// schema has shipped only one version; when a second version lands, an
/// `ALTER TABLE` stratum belongs here, guarded the way table creation is.
#[instrument(skip(database_connection))]
pub async fn apply_full_schema(database_connection: &Connection) -> Result<()> {
    info!("synchronizing scanning control plane schema");

    create_tables(database_connection).await?;
    create_indexes(database_connection).await?;

    info!("schema synchronized");
    Ok(())
}

async fn create_tables(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("creating table: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("failed to create table: {}", identifier))?;
    }
    Ok(())
}

async fn create_indexes(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("creating index: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("failed to create index: {}", identifier))?;
    }
    Ok(())
}
