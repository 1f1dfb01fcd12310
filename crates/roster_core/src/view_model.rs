use crate::{ImportOutcome, ImportPhase, ItemResult, ProgressSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportViewModel {
    pub phase: ImportPhase,
    pub snapshot: ProgressSnapshot,
    /// Newest first.
    pub rows: Vec<ItemResult>,
    pub warnings: Vec<String>,
    pub outcome: Option<ImportOutcome>,
    pub dirty: bool,
}

impl ImportViewModel {
    pub fn failed_rows(&self) -> usize {
        self.rows.iter().filter(|row| !row.success).count()
    }
}
