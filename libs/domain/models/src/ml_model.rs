// [libs/domain/models/src/ml_model.rs]
/*!
 * The most recently promoted version of a named model's learned parameters.
 * A human-approved promotion step writes a new row; the core only reads the
 * latest version, it never writes one itself.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlModelState {
    pub model_name: String,
    pub version: i64,
    pub parameters: serde_json::Value,
}

/// The `threshold_optimizer` model's expected parameter shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LearnedThresholds {
    pub low: f32,
    pub medium: f32,
    pub high: f32,
}

impl LearnedThresholds {
    /// `low <= medium <= high` and `low >= 0`, per the tier-config contract.
    pub fn is_well_formed(&self) -> bool {
        self.low >= 0.0 && self.low <= self.medium && self.medium <= self.high
    }
}
