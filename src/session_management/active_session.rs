use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::codec::{Encoding, FileHandle};
use crate::session_management::WorkflowState;
use crate::storage::AnalysisResult;

/// The session currently driven by a workflow: which record it writes to,
/// the file it holds and how far it has progressed.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    /// Distinguishes this session from any earlier one, including a
    /// restore of the same record.
    pub generation: u64,
    /// Id of the history record this session writes through to.
    pub record_id: Uuid,
    pub state: WorkflowState,
    pub file: FileHandle,
    pub created_at: DateTime<Utc>,
    /// Present once the preview has been built.
    pub preview: Option<Encoding>,
    /// Present once resolved, or when restored from an analyzed record.
    pub result: Option<AnalysisResult>,
}

impl ActiveSession {
    pub fn captured(
        generation: u64,
        record_id: Uuid,
        created_at: DateTime<Utc>,
        file: FileHandle,
    ) -> Self {
        Self {
            generation,
            record_id,
            state: WorkflowState::FileCaptured,
            file,
            created_at,
            preview: None,
            result: None,
        }
    }

    pub fn is(&self, generation: u64, state: WorkflowState) -> bool {
        self.generation == generation && self.state == state
    }
}
