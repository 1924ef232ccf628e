//! Persisted history record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis_client::Classification;
use crate::codec::Encoding;
use crate::error_handling::types::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Analyzed,
}

/// Outcome of one classification attempt, as stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisResult {
    #[serde(rename_all = "camelCase")]
    Success {
        payload_class: i64,
        quality_score: f64,
    },
    Failure {
        message: String,
    },
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisResult::Success { .. })
    }
}

impl From<Classification> for AnalysisResult {
    fn from(classification: Classification) -> Self {
        AnalysisResult::Success {
            payload_class: classification.payload_class,
            quality_score: classification.iqa_score,
        }
    }
}

impl From<&AnalysisError> for AnalysisResult {
    fn from(err: &AnalysisError) -> Self {
        AnalysisResult::Failure {
            message: err.to_string(),
        }
    }
}

impl From<Result<Classification, AnalysisError>> for AnalysisResult {
    fn from(outcome: Result<Classification, AnalysisError>) -> Self {
        match outcome {
            Ok(classification) => classification.into(),
            Err(err) => (&err).into(),
        }
    }
}

/// One analyzed or in-flight submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_encoding: Option<Encoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

impl HistoryRecord {
    /// A freshly captured record awaiting analysis.
    pub fn pending(
        id: Uuid,
        file_name: impl Into<String>,
        file_size_bytes: u64,
        created_at: DateTime<Utc>,
        preview_encoding: Option<Encoding>,
    ) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            file_size_bytes,
            created_at,
            status: RecordStatus::Pending,
            preview_encoding,
            result: None,
        }
    }
}

/// Field changes for [`RecordStore::update_by_id`](super::RecordStore::update_by_id).
///
/// `None` leaves the stored field as it is; there is no way to clear a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub status: Option<RecordStatus>,
    pub preview_encoding: Option<Encoding>,
    pub result: Option<AnalysisResult>,
}

impl RecordUpdate {
    /// Marks the record analyzed with `result`, successful or not.
    pub fn resolved(result: AnalysisResult) -> Self {
        Self {
            status: Some(RecordStatus::Analyzed),
            result: Some(result),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(self, record: &mut HistoryRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(preview) = self.preview_encoding {
            record.preview_encoding = Some(preview);
        }
        if let Some(result) = self.result {
            record.result = Some(result);
        }
    }
}
