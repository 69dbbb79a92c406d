// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el cluster de Turso.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (Variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE -> {0}")]
    TransactionError(String),

    /// La entidad solicitada no existe en la tabla esperada.
    #[error("[L3_DB_FAULT]: ENTITY_NOT_FOUND: {entity} ({key})")]
    NotFound { entity: &'static str, key: String },

    /// El job ya estaba arrendado por otro propietario (fallo de CAS de lease).
    #[error("[L3_DB_FAULT]: LEASE_CONFLICT: job {job_id} already leased")]
    LeaseConflict { job_id: String },

    /// La entidad ya alcanzó el límite permitido por su nivel de suscripción.
    #[error("[L3_DB_FAULT]: CAPACITY_EXCEEDED: {entity} already has {current}/{max} rows")]
    CapacityExceeded { entity: &'static str, current: u32, max: u32 },
}
