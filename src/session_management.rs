//! Session management core module.
//!
//! One analysis session follows one file from capture to a stored result.
//! This module provides the workflow state, the active session it tracks
//! and the workflow controller itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Submodule for the state of the session currently on screen.
pub mod active_session;
/// Submodule for the capture → preview → submit → resolve controller.
pub mod session_workflow;

pub use active_session::ActiveSession;
pub use session_workflow::{SessionWorkflow, SubmitOutcome};

/// Where the active session stands.
///
/// Variants:
/// - `Idle`: no file captured yet, or the session was reset.
/// - `FileCaptured`: bytes received, preview not stored yet.
/// - `PreviewReady`: a pending record is in the history; analysis may be requested.
/// - `Submitted`: waiting on the classifier.
/// - `Resolved`: the record holds its final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    FileCaptured,
    PreviewReady,
    Submitted,
    Resolved,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::FileCaptured => "capturing a file",
            WorkflowState::PreviewReady => "ready for analysis",
            WorkflowState::Submitted => "waiting for the classifier",
            WorkflowState::Resolved => "resolved",
        };
        f.write_str(name)
    }
}
