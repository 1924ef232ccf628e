use serde::{Deserialize, Serialize};

/// Classifier response body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Predicted payload class.
    pub payload_class: i64,
    /// Image quality assessment score.
    pub iqa_score: f64,
}
