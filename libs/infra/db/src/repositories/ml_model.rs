// [libs/infra/db/src/repositories/ml_model.rs]
/*!
 * Reads the latest promoted row for a named model. The core never writes
 * here: promotion is a human-approved step that lives outside this
 * repository's scope.
 */

use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::ml_model::MlModelState;
use tracing::instrument;

pub struct MlModelRepository {
    connection: Connection,
}

impl MlModelRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn latest(&self, model_name: &str) -> Result<Option<MlModelState>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT model_name, version, parameters_json FROM ml_model_state
                 WHERE model_name = ?1 ORDER BY version DESC LIMIT 1",
                params![model_name],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let model_name: String = row.get(0)?;
        let version: i64 = row.get(1)?;
        let parameters_json: String = row.get(2)?;
        let parameters = serde_json::from_str(&parameters_json)
            .map_err(|e| DbError::MappingError(format!("model parameters deserialization failed: {}", e)))?;

        Ok(Some(MlModelState { model_name, version, parameters }))
    }
}
