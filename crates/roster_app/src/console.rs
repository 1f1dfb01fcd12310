use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use roster_core::{
    dispatch, update, Effect, ImportOutcome, ImportState, ItemResult, Msg, ProgressPort,
};
use roster_engine::{EngineEvent, EngineHandle, FeedRecord, RunId};
use roster_logging::{roster_error, roster_info, roster_warn};
use tokio_util::sync::CancellationToken;

use crate::config::ConsoleConfig;
use crate::render::TerminalPort;
use crate::report;

const TICK: Duration = Duration::from_millis(100);
const RUN_ID: RunId = 1;

/// One import run: reducer state plus the engine it drives.
struct Console<'a, P: ProgressPort> {
    engine: &'a EngineHandle,
    port: P,
    run_id: RunId,
    state: ImportState,
    cancel: Option<CancellationToken>,
}

impl<'a, P: ProgressPort> Console<'a, P> {
    fn new(engine: &'a EngineHandle, port: P, run_id: RunId) -> Self {
        Self {
            engine,
            port,
            run_id,
            state: ImportState::new(),
            cancel: None,
        }
    }

    fn apply(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.run_effects(&effects);
    }

    fn run_effects(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::StartImport { content } => {
                    roster_info!("StartImport run_id={} content_len={}", self.run_id, content.len());
                    self.cancel = Some(self.engine.start(self.run_id, content.clone()));
                }
                Effect::CancelImport => {
                    if let Some(cancel) = self.cancel.take() {
                        cancel.cancel();
                    }
                }
                _ => {}
            }
        }
        dispatch(effects, &mut self.port);
    }

    /// Pumps engine events until the run reaches a terminal phase.
    fn pump(&mut self) {
        while self.state.is_submitted() && !self.state.phase().is_terminal() {
            match self.engine.recv_timeout(TICK) {
                Ok(event) => {
                    if let Some(msg) = map_event(self.run_id, event) {
                        self.apply(msg);
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.apply(Msg::Tick),
                Err(RecvTimeoutError::Disconnected) => {
                    roster_error!("Import engine stopped unexpectedly");
                    self.apply(Msg::TransportFailed {
                        message: "import engine stopped".to_string(),
                    });
                }
            }
        }
    }
}

/// Submits `content` as one batch import and renders it until it ends.
pub fn run_import(config: &ConsoleConfig, content: String) -> Option<ImportOutcome> {
    let engine = EngineHandle::new(config.import_settings());
    let port = TerminalPort::new(std::io::stdout());
    let mut console = Console::new(&engine, port, RUN_ID);

    console.apply(Msg::ImportSubmitted { content });
    console.pump();

    let view = console.state.view();
    if view.outcome.is_some() {
        match report::save(&config.report_dir, &view) {
            Ok(path) => roster_info!("Saved import report to {:?}", path),
            Err(err) => roster_warn!("Failed to save import report: {}", err),
        }
    }
    view.outcome
}

/// Engine event -> reducer message. Events from other runs and post-cancel
/// completions produce nothing.
fn map_event(run_id: RunId, event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Opened { run_id: id } if id == run_id => Some(Msg::StreamOpened),
        EngineEvent::Record { run_id: id, record } if id == run_id => Some(map_record(record)),
        EngineEvent::Completed {
            run_id: id,
            result,
        } if id == run_id => match result {
            Ok(summary) if summary.cancelled => None,
            Ok(_) => Some(Msg::StreamClosed),
            Err(err) => Some(Msg::TransportFailed {
                message: err.to_string(),
            }),
        },
        _ => None,
    }
}

fn map_record(record: FeedRecord) -> Msg {
    match record {
        FeedRecord::Start { total } => Msg::FeedStarted { total },
        FeedRecord::Progress(progress) => Msg::FeedProgress {
            current: progress.current,
            total: progress.total,
            success_count: progress.success_count,
            failed_count: progress.failed_count,
            last_result: progress.last_result.map(map_item),
        },
        FeedRecord::Finish {
            total,
            success_count,
            failed_count,
        } => Msg::FeedFinished {
            total,
            success_count,
            failed_count,
        },
        FeedRecord::Error { message } => Msg::FeedError { message },
    }
}

fn map_item(item: roster_engine::ItemResult) -> ItemResult {
    ItemResult {
        email: item.email,
        success: item.success,
        message: item.message,
        error: item.error,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures_util::stream;
    use roster_core::{FailureReason, ImportPhase, ProgressSnapshot};
    use roster_engine::{
        run_feed, FailureKind, FeedSink, FeedSummary, ImportError, Importer,
    };

    use super::*;

    /// Serves `content` back as the progress feed, split into small chunks.
    struct ScriptedImporter;

    #[async_trait::async_trait]
    impl Importer for ScriptedImporter {
        async fn import_batch(
            &self,
            content: &str,
            sink: &dyn FeedSink,
            cancel: &CancellationToken,
        ) -> Result<FeedSummary, ImportError> {
            if let Some(message) = content.strip_prefix("reject:") {
                return Err(ImportError::new(FailureKind::HttpStatus(400), message));
            }
            let chunks: Vec<Result<Vec<u8>, ImportError>> = content
                .as_bytes()
                .chunks(5)
                .map(|chunk| Ok(chunk.to_vec()))
                .collect();
            run_feed(stream::iter(chunks), sink, cancel).await
        }
    }

    #[derive(Default)]
    struct Recorder {
        snapshots: Vec<ProgressSnapshot>,
        rows: Vec<String>,
        completed: Vec<ImportOutcome>,
    }

    impl ProgressPort for &mut Recorder {
        fn on_snapshot(&mut self, snapshot: &ProgressSnapshot) {
            self.snapshots.push(snapshot.clone());
        }

        fn on_row_prepended(&mut self, row: &ItemResult) {
            self.rows.push(row.email.clone());
        }

        fn on_completed(&mut self, outcome: &ImportOutcome) {
            self.completed.push(outcome.clone());
        }
    }

    fn run_script(content: &str, recorder: &mut Recorder) -> ImportState {
        let engine = EngineHandle::with_importer(Arc::new(ScriptedImporter));
        let mut console = Console::new(&engine, recorder, 9);
        console.apply(Msg::ImportSubmitted {
            content: content.to_string(),
        });
        console.pump();
        console.state
    }

    #[test]
    fn feed_is_rendered_through_the_port() {
        let feed = concat!(
            "{\"type\":\"start\",\"total\":2}\n",
            "{\"type\":\"progress\",\"current\":1,\"total\":2,\"success_count\":1,\"failed_count\":0,",
            "\"last_result\":{\"email\":\"a@example.com\",\"success\":true}}\n",
            "{\"type\":\"progress\",\"current\":2,\"total\":2,\"success_count\":2,\"failed_count\":0,",
            "\"last_result\":{\"email\":\"b@example.com\",\"success\":true}}\n",
            "{\"type\":\"finish\",\"total\":2,\"success_count\":2,\"failed_count\":0}\n",
        );
        let mut recorder = Recorder::default();

        let state = run_script(feed, &mut recorder);

        assert_eq!(*state.phase(), ImportPhase::Finished);
        assert_eq!(recorder.rows, vec!["a@example.com", "b@example.com"]);
        let percents: Vec<u8> = recorder.snapshots.iter().map(|s| s.percent).collect();
        assert_eq!(percents, vec![0, 0, 50, 100, 100]);
        assert_eq!(recorder.completed.len(), 1);
        assert!(recorder.completed[0].is_finished());
    }

    #[test]
    fn feed_without_finish_ends_incomplete() {
        let feed = "{\"type\":\"start\",\"total\":3}\n{\"type\":\"progress\",\"current\":1,\"total\":3,\"success_count\":1,\"failed_count\":0}\n";
        let mut recorder = Recorder::default();

        let state = run_script(feed, &mut recorder);

        assert_eq!(*state.phase(), ImportPhase::Failed(FailureReason::Incomplete));
        assert_eq!(recorder.completed, vec![ImportOutcome::Incomplete]);
    }

    #[test]
    fn rejected_request_ends_failed() {
        let mut recorder = Recorder::default();

        let state = run_script("reject:content is empty", &mut recorder);

        match state.phase() {
            ImportPhase::Failed(FailureReason::Transport(message)) => {
                assert!(message.contains("content is empty"));
            }
            other => panic!("unexpected phase {other:?}"),
        }
    }

    #[test]
    fn events_from_other_runs_are_ignored() {
        let event = EngineEvent::Opened { run_id: 2 };
        assert_eq!(map_event(1, event), None);

        let cancelled = EngineEvent::Completed {
            run_id: 1,
            result: Ok(FeedSummary {
                cancelled: true,
                ..FeedSummary::default()
            }),
        };
        assert_eq!(map_event(1, cancelled), None);
    }
}
