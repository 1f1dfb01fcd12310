use std::collections::VecDeque;

use crate::view_model::ImportViewModel;

const PREPARING: &str = "preparing";
const STARTED: &str = "started";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImportPhase {
    #[default]
    Idle,
    Streaming,
    Finished,
    Failed(FailureReason),
}

impl ImportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportPhase::Finished | ImportPhase::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Transport(String),
    /// Feed closed without a `finish` record.
    Incomplete,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub email: String,
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ItemResult {
    /// Text shown next to the email: the error for failures, the message otherwise.
    pub fn detail(&self) -> Option<&str> {
        if self.success {
            self.message.as_deref().or(self.error.as_deref())
        } else {
            self.error.as_deref().or(self.message.as_deref())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub stage: String,
    pub percent: u8,
    pub success_count: u64,
    pub failed_count: u64,
    pub total: u64,
}

impl ProgressSnapshot {
    pub fn preparing() -> Self {
        Self {
            stage: PREPARING.to_string(),
            percent: 0,
            success_count: 0,
            failed_count: 0,
            total: 0,
        }
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::preparing()
    }
}

/// `round(current / total * 100)` clamped to 0..=100; 0 when `total` is 0.
pub fn percent_of(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let current = u128::from(current);
    let total = u128::from(total);
    let rounded = (current * 200 + total) / (total * 2);
    rounded.min(100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    FullSuccess,
    PartialSuccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishSummary {
    pub total: u64,
    pub success_count: u64,
    pub failed_count: u64,
    pub classification: Classification,
    /// `success_count + failed_count != total` on the `finish` record.
    pub count_mismatch: bool,
}

impl FinishSummary {
    pub fn from_counts(total: u64, success_count: u64, failed_count: u64) -> Self {
        let classification = if failed_count == 0 {
            Classification::FullSuccess
        } else {
            Classification::PartialSuccess
        };
        let count_mismatch = success_count.checked_add(failed_count) != Some(total);
        Self {
            total,
            success_count,
            failed_count,
            classification,
            count_mismatch,
        }
    }

    pub fn label(&self) -> String {
        let mut label = match self.classification {
            Classification::FullSuccess => {
                format!("finished: {} of {} imported", self.success_count, self.total)
            }
            Classification::PartialSuccess => format!(
                "partial success: {} succeeded, {} failed of {}",
                self.success_count, self.failed_count, self.total
            ),
        };
        if self.count_mismatch {
            label.push_str(" (count mismatch)");
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Finished(FinishSummary),
    /// The feed ended before `finish`; the last snapshot is not a final result.
    Incomplete,
    TransportFailed { message: String },
    Cancelled,
}

impl ImportOutcome {
    /// A `finish` record was seen, whatever the per-item results were.
    pub fn is_finished(&self) -> bool {
        matches!(self, ImportOutcome::Finished(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportState {
    phase: ImportPhase,
    submitted: bool,
    total_known: bool,
    snapshot: ProgressSnapshot,
    rows: VecDeque<ItemResult>,
    warnings: Vec<String>,
    outcome: Option<ImportOutcome>,
    dirty: bool,
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &ImportPhase {
        &self.phase
    }

    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    pub fn outcome(&self) -> Option<&ImportOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn view(&self) -> ImportViewModel {
        ImportViewModel {
            phase: self.phase.clone(),
            snapshot: self.snapshot.clone(),
            rows: self.rows.iter().cloned().collect(),
            warnings: self.warnings.clone(),
            outcome: self.outcome.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.submitted = true;
        self.dirty = true;
    }

    /// Idle -> Streaming; no-op in any other phase.
    pub(crate) fn begin_streaming(&mut self) {
        if self.phase == ImportPhase::Idle {
            self.phase = ImportPhase::Streaming;
            self.dirty = true;
        }
    }

    pub(crate) fn apply_start(&mut self, total: u64) {
        self.total_known = true;
        self.snapshot = ProgressSnapshot {
            stage: STARTED.to_string(),
            percent: 0,
            success_count: self.snapshot.success_count,
            failed_count: self.snapshot.failed_count,
            total,
        };
        self.dirty = true;
    }

    pub(crate) fn apply_progress(
        &mut self,
        current: u64,
        total: u64,
        success_count: u64,
        failed_count: u64,
    ) {
        if !self.total_known {
            self.total_known = true;
            self.snapshot.total = total;
        }
        self.snapshot = ProgressSnapshot {
            stage: format!("{current}/{total}"),
            percent: percent_of(current, total),
            success_count,
            failed_count,
            total: self.snapshot.total,
        };
        self.dirty = true;
    }

    pub(crate) fn prepend_row(&mut self, row: ItemResult) {
        self.rows.push_front(row);
        self.dirty = true;
    }

    pub(crate) fn apply_finish(&mut self, summary: FinishSummary) {
        self.snapshot = ProgressSnapshot {
            stage: summary.label(),
            percent: 100,
            success_count: summary.success_count,
            failed_count: summary.failed_count,
            total: summary.total,
        };
        self.phase = ImportPhase::Finished;
        self.outcome = Some(ImportOutcome::Finished(summary));
        self.dirty = true;
    }

    pub(crate) fn push_warning(&mut self, message: String) {
        self.warnings.push(message);
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, reason: FailureReason) -> ImportOutcome {
        let outcome = match &reason {
            FailureReason::Transport(message) => ImportOutcome::TransportFailed {
                message: message.clone(),
            },
            FailureReason::Incomplete => ImportOutcome::Incomplete,
            FailureReason::Cancelled => ImportOutcome::Cancelled,
        };
        self.phase = ImportPhase::Failed(reason);
        self.outcome = Some(outcome.clone());
        self.dirty = true;
        outcome
    }
}
