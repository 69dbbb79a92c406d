// [libs/infra/db/src/repositories/mapping.rs]
//! Shared row-to-domain conversion helpers used across repositories.

use crate::errors::DbError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::MappingError(format!("invalid uuid '{}': {}", raw, e)))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{}': {}", raw, e)))
}
