//! Remote classification boundary.
//!
//! `AnalysisClient` is the only contract the workflow relies on: a call
//! eventually resolves to a [`Classification`] or an [`AnalysisError`], and
//! never panics on network or service faults.

use async_trait::async_trait;

use crate::codec::FileHandle;
use crate::error_handling::types::AnalysisError;

pub mod http_client;
pub mod types;

pub use http_client::HttpAnalysisClient;
pub use types::Classification;

#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Sends the file's bytes and media type to the classifier.
    async fn submit(&self, file: &FileHandle) -> Result<Classification, AnalysisError>;
}
