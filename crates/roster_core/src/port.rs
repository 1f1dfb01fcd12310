use crate::{Effect, ImportOutcome, ItemResult, ProgressSnapshot};

/// Rendering side of the reducer. Implementors own whatever UI they draw into.
pub trait ProgressPort {
    fn on_snapshot(&mut self, snapshot: &ProgressSnapshot);
    fn on_row_prepended(&mut self, row: &ItemResult);
    fn on_warning(&mut self, _message: &str) {}
    fn on_completed(&mut self, _outcome: &ImportOutcome) {}
}

/// Forwards render effects to `port` in order. Engine effects are skipped.
pub fn dispatch(effects: &[Effect], port: &mut dyn ProgressPort) {
    for effect in effects {
        match effect {
            Effect::RenderSnapshot(snapshot) => port.on_snapshot(snapshot),
            Effect::PrependRow(row) => port.on_row_prepended(row),
            Effect::ShowWarning(message) => port.on_warning(message),
            Effect::Completed(outcome) => port.on_completed(outcome),
            Effect::StartImport { .. } | Effect::CancelImport => {}
        }
    }
}
