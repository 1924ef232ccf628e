use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis_client::{AnalysisClient, HttpAnalysisClient};
use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::report::render_report;
use crate::session_management::{SessionWorkflow, SubmitOutcome};
use crate::storage::{FileRecordStore, FileSlot, HistoryRecord, RecordStore};
use crate::sync::SyncBus;
use crate::web_interface::WebServer;

/// Owns one history store and one workflow for the lifetime of the process.
pub struct Controller {
    pub config: Config,
    store: Arc<FileRecordStore>,
    workflow: SessionWorkflow,
}

impl Controller {
    /// Opens the history store and talks to the configured classifier.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        let client = Arc::new(HttpAnalysisClient::from_config(&config.classifier));
        info!("Classifier endpoint: {}", client.endpoint());
        Self::with_client(config, client)
    }

    /// Same as [`Controller::new`] with a caller-provided classifier.
    pub fn with_client(
        config: Config,
        client: Arc<dyn AnalysisClient>,
    ) -> Result<Self, ControllerError> {
        config.validate()?;
        let slot = match &config.storage.path {
            Some(path) => FileSlot::new(path)?,
            None => FileSlot::new_default()?,
        };
        let bus = Arc::new(SyncBus::default());
        let store = Arc::new(FileRecordStore::new(slot, bus));
        let workflow = SessionWorkflow::new(store.clone(), client);
        Ok(Self {
            config,
            store,
            workflow,
        })
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    pub fn workflow(&self) -> &SessionWorkflow {
        &self.workflow
    }

    /// Captures the file at `path`, submits it and returns the stored record.
    pub async fn analyze(&self, path: &Path) -> Result<HistoryRecord, ControllerError> {
        info!("Analyzing {}", path.display());
        let id = self.workflow.capture_path(path).await?;
        match self.workflow.submit().await? {
            SubmitOutcome::Resolved(result) if !result.is_success() => {
                warn!("[{}] stored with a failed analysis", id)
            }
            SubmitOutcome::Resolved(_) => debug!("[{}] stored with a classification", id),
            SubmitOutcome::Superseded => warn!("[{}] superseded before it resolved", id),
        }
        Ok(self.store.get(id).ok_or(StorageError::NotFound(id))?)
    }

    /// All records, most recent first.
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.store.load()
    }

    pub fn show(&self, id: &str) -> Result<String, ControllerError> {
        let id = parse_record_id(id)?;
        let record = self.store.get(id).ok_or(StorageError::NotFound(id))?;
        Ok(render_report(&record))
    }

    /// Rebuilds the original file of record `id` without contacting the
    /// classifier. When `output` is a directory the stored file name is used
    /// inside it. Returns the path written.
    pub fn restore(&self, id: &str, output: &Path) -> Result<PathBuf, ControllerError> {
        let id = parse_record_id(id)?;
        let state = self.workflow.restore_by_id(id)?;
        let file = self
            .workflow
            .active_file()
            .ok_or(WorkflowError::InvalidState {
                action: "restore",
                state,
            })?;

        let target = if output.is_dir() {
            output.join(file.name())
        } else {
            output.to_path_buf()
        };
        std::fs::write(&target, file.bytes()).map_err(|source| {
            error!("Failed to write {}: {}", target.display(), source);
            ControllerError::Output {
                path: target.clone(),
                source,
            }
        })?;
        info!(
            "[{}] restored {} ({} byte(s)) to {}",
            id,
            file.name(),
            file.size(),
            target.display()
        );
        Ok(target)
    }

    /// Returns whether a record was actually removed.
    pub fn remove(&self, id: &str) -> Result<bool, ControllerError> {
        let id = parse_record_id(id)?;
        Ok(self.store.remove_by_id(id)?)
    }

    pub fn clear(&self) -> Result<(), ControllerError> {
        Ok(self.store.clear()?)
    }

    /// Serves the dashboard API until the process stops.
    pub async fn serve(&self) -> Result<(), ControllerError> {
        let addr: SocketAddr = ([127, 0, 0, 1], self.config.web.port).into();
        info!("Serving the history dashboard on http://{}", addr);
        WebServer::new(self.store()).start(addr).await;
        Ok(())
    }
}

pub fn parse_record_id(raw: &str) -> Result<Uuid, ControllerError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ControllerError::InvalidId(raw.to_string()))
}
