use crate::{ImportOutcome, ItemResult, ProgressSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the import request with the submitted batch content.
    StartImport { content: String },
    /// Stop reading the feed; nothing is rendered after this.
    CancelImport,
    RenderSnapshot(ProgressSnapshot),
    /// Newest row goes to the top of the result table.
    PrependRow(ItemResult),
    ShowWarning(String),
    Completed(ImportOutcome),
}

impl Effect {
    /// True for effects addressed to the renderer rather than the engine.
    pub fn is_render(&self) -> bool {
        !matches!(self, Effect::StartImport { .. } | Effect::CancelImport)
    }
}
