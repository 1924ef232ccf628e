//! HTTP classifier client.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so the async
//! runtime is never blocked. The file goes out as a single multipart field.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use uuid::Uuid;

use super::types::Classification;
use super::AnalysisClient;
use crate::codec::FileHandle;
use crate::configuration::types::ClassifierConfig;
use crate::error_handling::types::AnalysisError;

pub struct HttpAnalysisClient {
    endpoint: String,
    field_name: String,
    timeout: Duration,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: impl Into<String>, field_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            field_name: field_name.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.field_name.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds a `multipart/form-data` body carrying `file` in one field.
    pub fn multipart_body(boundary: &str, field_name: &str, file: &FileHandle) -> Vec<u8> {
        let media_type = if file.media_type().is_empty() {
            "application/octet-stream"
        } else {
            file.media_type()
        };
        let mut body = Vec::with_capacity(file.bytes().len() + 256);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {media_type}\r\n\r\n",
                quote_safe(field_name),
                quote_safe(file.name()),
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes());
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }
}

// Header parameter values may not carry quotes or line breaks.
fn quote_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn submit(&self, file: &FileHandle) -> Result<Classification, AnalysisError> {
        let boundary = format!("cyberveli-{}", Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, &self.field_name, file);
        let content_type = format!("multipart/form-data; boundary={boundary}");
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;

        debug!(
            "Posting {} ({} byte(s)) to {}",
            file.name(),
            file.size(),
            endpoint
        );

        let classification = tokio::task::spawn_blocking(move || {
            let config = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build();
            let agent = ureq::Agent::new_with_config(config);

            let response = agent
                .post(&endpoint)
                .header("Content-Type", content_type.as_str())
                .send(&body[..])
                .map_err(|e| match e {
                    ureq::Error::StatusCode(code) => AnalysisError::Status(code),
                    other => AnalysisError::Transport(other.to_string()),
                })?;

            response
                .into_body()
                .read_json::<Classification>()
                .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
        })
        .await
        .map_err(|e| AnalysisError::Aborted(e.to_string()))??;

        info!(
            "Classifier answered class {} with score {:.3} for {}",
            classification.payload_class,
            classification.iqa_score,
            file.name()
        );
        Ok(classification)
    }
}
