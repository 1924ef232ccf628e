pub mod analysis_client;
pub use analysis_client::{AnalysisClient, Classification, HttpAnalysisClient};

pub mod codec;
pub use codec::{Encoding, FileHandle};

pub mod configuration;
pub use configuration::Config;

pub mod controller;
pub use controller::Controller;

pub mod error_handling;

pub mod report;
pub use report::render_report;

pub mod session_management;
pub use session_management::{SessionWorkflow, SubmitOutcome, WorkflowState};

pub mod storage;
pub use storage::{AnalysisResult, HistoryRecord, RecordStatus, RecordStore};

pub mod sync;
pub use sync::{HistoryView, SyncBus};

pub mod web_interface;
