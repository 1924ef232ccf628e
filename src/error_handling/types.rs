use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::session_management::WorkflowState;

/// A stored preview encoding that does not have the `data:<type>;base64,<payload>` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("encoding does not start with the `data:` scheme")]
    MissingScheme,
    #[error("encoding has no `,` between header and payload")]
    MissingSeparator,
    #[error("encoding header is not marked `;base64`")]
    NotBase64,
    #[error("malformed base64 payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("a record with id {0} is already stored")]
    DuplicateId(Uuid),
    #[error("no record with id {0}")]
    NotFound(Uuid),
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// Failure reported by the remote classifier boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("classifier unreachable: {0}")]
    Transport(String),
    #[error("classifier answered with HTTP status {0}")]
    Status(u16),
    #[error("classifier response malformed: {0}")]
    MalformedResponse(String),
    #[error("classifier call aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("cannot {action} while the session is {state}")]
    InvalidState {
        action: &'static str,
        state: WorkflowState,
    },
    #[error("a submission for record {0} is still waiting on the classifier")]
    SubmissionInFlight(Uuid),
    #[error("session {0} was replaced before its preview was stored")]
    Superseded(Uuid),
    #[error("record {0} has no stored preview")]
    MissingPreview(Uuid),
    #[error("preview encoding failed: {0}")]
    Encoding(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlError(String),
    #[error("classifier endpoint must be an http(s) URL, got `{0}`")]
    BadEndpoint(String),
    #[error("value out of range: {0}")]
    NotInRange(String),
    #[error("storage path is not a directory: {0}")]
    NotADirectory(String),
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),
    #[error("invalid record id `{0}`")]
    InvalidId(String),
    #[error("failed to write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}
