use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use roster_core::{ImportOutcome, ImportViewModel};
use roster_engine::{PersistError, ReportWriter};
use serde::{Deserialize, Serialize};

pub const REPORT_FILENAME: &str = ".roster_last_import.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ReportRow {
    email: String,
    success: bool,
    detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImportReport {
    written_utc: String,
    outcome: String,
    stage: String,
    percent: u8,
    success_count: u64,
    failed_count: u64,
    total: u64,
    count_mismatch: bool,
    warnings: Vec<String>,
    /// Newest first, as shown on screen.
    rows: Vec<ReportRow>,
}

fn outcome_label(outcome: Option<&ImportOutcome>) -> String {
    match outcome {
        Some(ImportOutcome::Finished(_)) => "finished".to_string(),
        Some(ImportOutcome::Incomplete) => "incomplete".to_string(),
        Some(ImportOutcome::TransportFailed { message }) => format!("failed: {message}"),
        Some(ImportOutcome::Cancelled) => "cancelled".to_string(),
        None => "unknown".to_string(),
    }
}

fn build_report(view: &ImportViewModel, now: DateTime<Utc>) -> ImportReport {
    let count_mismatch = matches!(
        &view.outcome,
        Some(ImportOutcome::Finished(summary)) if summary.count_mismatch
    );
    ImportReport {
        written_utc: now.to_rfc3339(),
        outcome: outcome_label(view.outcome.as_ref()),
        stage: view.snapshot.stage.clone(),
        percent: view.snapshot.percent,
        success_count: view.snapshot.success_count,
        failed_count: view.snapshot.failed_count,
        total: view.snapshot.total,
        count_mismatch,
        warnings: view.warnings.clone(),
        rows: view
            .rows
            .iter()
            .map(|row| ReportRow {
                email: row.email.clone(),
                success: row.success,
                detail: row.detail().map(ToOwned::to_owned),
            })
            .collect(),
    }
}

pub fn save(dir: &Path, view: &ImportViewModel) -> Result<PathBuf, PersistError> {
    let report = build_report(view, Utc::now());
    let content = ron::ser::to_string_pretty(&report, ron::ser::PrettyConfig::new())
        .map_err(|err| PersistError::Io(std::io::Error::other(err)))?;
    ReportWriter::new(dir).write(REPORT_FILENAME, &content)
}
