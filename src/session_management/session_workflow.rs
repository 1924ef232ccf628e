use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::analysis_client::AnalysisClient;
use crate::codec::{reconstruct_file, Encoding, FileHandle};
use crate::error_handling::types::{StorageError, WorkflowError};
use crate::session_management::{ActiveSession, WorkflowState};
use crate::storage::{AnalysisResult, HistoryRecord, RecordStore, RecordUpdate};

/// What became of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The result was stored on the session's record.
    Resolved(AnalysisResult),
    /// The session was replaced while the classifier was busy; the late
    /// result was dropped and no record was touched.
    Superseded,
}

/// Drives one file from capture to a stored analysis result.
///
/// The workflow keeps at most one [`ActiveSession`]. It never edits history
/// records directly: the pending record is created with
/// [`RecordStore::add`] and resolved with [`RecordStore::update_by_id`],
/// so every checkpoint is persisted and announced to other views.
///
/// State only changes between the two suspension points (building the
/// preview and waiting on the classifier). The session lock is never held
/// across either of them, so a new capture or a restore can replace the
/// session while a submission is in flight; the late result is then
/// discarded instead of being written. Every capture and restore starts a
/// new session generation, so restoring the very record being analyzed
/// also supersedes the call in flight. At most one classifier call runs
/// per workflow.
///
/// The session lock is held while the store writes a checkpoint, so the
/// write and the session change it belongs to cannot be split by another
/// capture or restore. Bus subscribers must therefore not call back into
/// the workflow.
pub struct SessionWorkflow {
    store: Arc<dyn RecordStore>,
    client: Arc<dyn AnalysisClient>,
    active: Mutex<Option<ActiveSession>>,
    generations: AtomicU64,
    in_flight: AtomicBool,
}

// Marks the workflow busy with a classifier call until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionWorkflow {
    pub fn new(store: Arc<dyn RecordStore>, client: Arc<dyn AnalysisClient>) -> Self {
        Self {
            store,
            client,
            active: Mutex::new(None),
            generations: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.lock()
            .as_ref()
            .map_or(WorkflowState::Idle, |session| session.state)
    }

    pub fn active_record_id(&self) -> Option<Uuid> {
        self.lock().as_ref().map(|session| session.record_id)
    }

    pub fn active_file(&self) -> Option<FileHandle> {
        self.lock().as_ref().map(|session| session.file.clone())
    }

    pub fn preview(&self) -> Option<Encoding> {
        self.lock().as_ref().and_then(|session| session.preview.clone())
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        self.lock().as_ref().and_then(|session| session.result.clone())
    }

    /// Abandons the active session, if any.
    pub fn reset(&self) {
        if let Some(previous) = self.lock().take() {
            debug!("[{}] session abandoned", previous.record_id);
        }
    }

    /// Captures `bytes` as a new file, builds its preview and stores a
    /// pending record for it. Returns the new record id.
    ///
    /// Any previous session is abandoned immediately.
    pub async fn capture(&self, bytes: Vec<u8>, file_name: &str) -> Result<Uuid, WorkflowError> {
        let file = FileHandle::from_bytes(file_name, bytes);
        let record_id = Uuid::new_v4();
        let created_at = Utc::now();
        let generation = self.next_generation();

        if let Some(previous) = self.lock().replace(ActiveSession::captured(
            generation,
            record_id,
            created_at,
            file.clone(),
        )) {
            debug!("[{}] session replaced by a new capture", previous.record_id);
        }
        info!(
            "[{}] captured {} ({} byte(s), {})",
            record_id,
            file.name(),
            file.size(),
            file.media_type()
        );

        let source = file.clone();
        let preview = tokio::task::spawn_blocking(move || source.preview())
            .await
            .map_err(|e| WorkflowError::Encoding(e.to_string()))?;

        let mut active = self.lock();
        let Some(session) = active
            .as_mut()
            .filter(|s| s.is(generation, WorkflowState::FileCaptured))
        else {
            warn!("[{}] superseded before its preview was stored", record_id);
            return Err(WorkflowError::Superseded(record_id));
        };

        let record = HistoryRecord::pending(
            record_id,
            file.name(),
            file.size(),
            created_at,
            Some(preview.clone()),
        );
        self.store.add(record)?;
        session.preview = Some(preview);
        session.state = WorkflowState::PreviewReady;
        drop(active);

        debug!("[{}] preview ready", record_id);
        Ok(record_id)
    }

    /// Reads the file at `path` and captures it under its file name.
    pub async fn capture_path(&self, path: &Path) -> Result<Uuid, WorkflowError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| WorkflowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.capture(bytes, &file_name).await
    }

    /// Sends the active file to the classifier and stores the outcome.
    ///
    /// Only allowed in `PreviewReady`, and only while no earlier call from
    /// this workflow is still waiting on the classifier. A classifier
    /// failure is not an error here: it is stored as
    /// [`AnalysisResult::Failure`] and the record becomes analyzed all the
    /// same.
    pub async fn submit(&self) -> Result<SubmitOutcome, WorkflowError> {
        let (_in_flight, generation, record_id, file) = {
            let mut active = self.lock();
            let Some(session) = active.as_mut() else {
                return Err(WorkflowError::InvalidState {
                    action: "submit",
                    state: WorkflowState::Idle,
                });
            };
            if session.state != WorkflowState::PreviewReady || session.preview.is_none() {
                return Err(WorkflowError::InvalidState {
                    action: "submit",
                    state: session.state,
                });
            }
            let Some(in_flight) = InFlight::acquire(&self.in_flight) else {
                return Err(WorkflowError::SubmissionInFlight(session.record_id));
            };
            session.state = WorkflowState::Submitted;
            (
                in_flight,
                session.generation,
                session.record_id,
                session.file.clone(),
            )
        };

        info!("[{}] submitting {} for analysis", record_id, file.name());
        let result = match self.client.submit(&file).await {
            Ok(classification) => AnalysisResult::from(classification),
            Err(e) => {
                warn!("[{}] analysis failed: {}", record_id, e);
                AnalysisResult::from(&e)
            }
        };

        let mut active = self.lock();
        let Some(session) = active
            .as_mut()
            .filter(|s| s.is(generation, WorkflowState::Submitted))
        else {
            warn!(
                "[{}] discarding late analysis result, session is no longer active",
                record_id
            );
            return Ok(SubmitOutcome::Superseded);
        };

        let stored = self
            .store
            .update_by_id(record_id, RecordUpdate::resolved(result.clone()));
        session.result = Some(result.clone());
        session.state = WorkflowState::Resolved;
        drop(active);

        stored?;
        info!("[{}] analysis resolved", record_id);
        Ok(SubmitOutcome::Resolved(result))
    }

    /// Reopens a history record without contacting the classifier.
    ///
    /// The file is rebuilt from the stored preview. Records that already
    /// hold a result land in `Resolved`, the others in `PreviewReady`. On
    /// failure the current session is left exactly as it was.
    pub fn restore(&self, record: &HistoryRecord) -> Result<WorkflowState, WorkflowError> {
        let encoding = record
            .preview_encoding
            .as_ref()
            .ok_or(WorkflowError::MissingPreview(record.id))?;
        let file = reconstruct_file(encoding, &record.file_name)?;

        let state = if record.result.is_some() {
            WorkflowState::Resolved
        } else {
            WorkflowState::PreviewReady
        };
        *self.lock() = Some(ActiveSession {
            generation: self.next_generation(),
            record_id: record.id,
            state,
            file,
            created_at: record.created_at,
            preview: Some(encoding.clone()),
            result: record.result.clone(),
        });
        info!("[{}] restored {} as {}", record.id, record.file_name, state);
        Ok(state)
    }

    /// Looks `id` up in the store and restores it.
    pub fn restore_by_id(&self, id: Uuid) -> Result<WorkflowState, WorkflowError> {
        let record = self.store.get(id).ok_or(StorageError::NotFound(id))?;
        self.restore(&record)
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
