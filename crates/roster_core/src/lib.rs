//! Roster core: pure batch-import progress state machine and render port.
mod effect;
mod msg;
mod port;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use port::{dispatch, ProgressPort};
pub use state::{
    percent_of, Classification, FailureReason, FinishSummary, ImportOutcome, ImportPhase,
    ImportState, ItemResult, ProgressSnapshot,
};
pub use update::update;
pub use view_model::ImportViewModel;
