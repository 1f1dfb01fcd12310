use crate::{Effect, FailureReason, FinishSummary, ImportOutcome, ImportPhase, ImportState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ImportState, msg: Msg) -> (ImportState, Vec<Effect>) {
    // Finished and Failed are final; late lines and late transport signals are dropped.
    if state.phase().is_terminal() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::ImportSubmitted { content } => {
            if state.is_submitted() || *state.phase() != ImportPhase::Idle {
                return (state, Vec::new());
            }
            if content.trim().is_empty() {
                let warning = "nothing to import".to_string();
                state.push_warning(warning.clone());
                return (state, vec![Effect::ShowWarning(warning)]);
            }
            state.mark_submitted();
            vec![
                Effect::StartImport { content },
                Effect::RenderSnapshot(state.snapshot().clone()),
            ]
        }
        Msg::StreamOpened => {
            state.begin_streaming();
            Vec::new()
        }
        Msg::FeedStarted { total } => {
            state.begin_streaming();
            state.apply_start(total);
            vec![Effect::RenderSnapshot(state.snapshot().clone())]
        }
        Msg::FeedProgress {
            current,
            total,
            success_count,
            failed_count,
            last_result,
        } => {
            state.begin_streaming();
            state.apply_progress(current, total, success_count, failed_count);
            let mut effects = vec![Effect::RenderSnapshot(state.snapshot().clone())];
            if let Some(row) = last_result {
                state.prepend_row(row.clone());
                effects.push(Effect::PrependRow(row));
            }
            effects
        }
        Msg::FeedFinished {
            total,
            success_count,
            failed_count,
        } => {
            let summary = FinishSummary::from_counts(total, success_count, failed_count);
            state.apply_finish(summary.clone());
            vec![
                Effect::RenderSnapshot(state.snapshot().clone()),
                Effect::Completed(ImportOutcome::Finished(summary)),
            ]
        }
        Msg::FeedError { message } => {
            state.push_warning(message.clone());
            vec![Effect::ShowWarning(message)]
        }
        Msg::StreamClosed => {
            let outcome = state.fail(FailureReason::Incomplete);
            vec![Effect::Completed(outcome)]
        }
        Msg::TransportFailed { message } => {
            let outcome = state.fail(FailureReason::Transport(message));
            vec![Effect::Completed(outcome)]
        }
        Msg::CancelRequested => {
            if !state.is_submitted() && *state.phase() == ImportPhase::Idle {
                return (state, Vec::new());
            }
            state.fail(FailureReason::Cancelled);
            vec![Effect::CancelImport]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
