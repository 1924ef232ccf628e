//! Plain-text analysis report for a single history record.

use crate::storage::{AnalysisResult, HistoryRecord, RecordStatus};

pub const REPORT_TITLE: &str = "Security Analysis Report";

/// File size in kilobytes with two decimals, e.g. `0.49 KB`.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

pub fn status_label(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Pending => "Pending Analysis",
        RecordStatus::Analyzed => "Analysis Complete",
    }
}

/// Renders `record` as a read-only text report.
///
/// Never touches the store; the preview payload is not included.
pub fn render_report(record: &HistoryRecord) -> String {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        "=".repeat(REPORT_TITLE.len()),
        format!("Record:   {}", record.id),
        format!("File:     {}", record.file_name),
        format!("Size:     {}", format_size(record.file_size_bytes)),
        format!(
            "Captured: {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!("Status:   {}", status_label(record.status)),
    ];

    match &record.result {
        Some(AnalysisResult::Success {
            payload_class,
            quality_score,
        }) => {
            lines.push(format!("Class:    {payload_class}"));
            lines.push(format!("Score:    {quality_score}"));
        }
        Some(AnalysisResult::Failure { message }) => lines.push(format!("Error:    {message}")),
        None => lines.push("Pending analysis".to_string()),
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}
