use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use roster_logging::{roster_error, roster_info};
use tokio_util::sync::CancellationToken;

use crate::client::{ImportSettings, Importer, ReqwestImporter};
use crate::feed::ChannelFeedSink;
use crate::{EngineEvent, FailureKind, ImportError, RunId};

enum EngineCommand {
    Start {
        run_id: RunId,
        content: String,
        cancel: CancellationToken,
    },
}

/// Runs imports on a background tokio runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ImportSettings) -> Self {
        Self::with_importer(Arc::new(ReqwestImporter::new(settings)))
    }

    pub fn with_importer(importer: Arc<dyn Importer>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    roster_error!("Failed to start import runtime: {}", err);
                    fail_all(cmd_rx, event_tx, err.to_string());
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                let importer = importer.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(importer.as_ref(), command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    /// Starts an import. Cancelling the returned token stops the read loop;
    /// no further `Record` events are sent for this run after that.
    pub fn start(&self, run_id: RunId, content: impl Into<String>) -> CancellationToken {
        let cancel = CancellationToken::new();
        let _ = self.cmd_tx.send(EngineCommand::Start {
            run_id,
            content: content.into(),
            cancel: cancel.clone(),
        });
        cancel
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits for the next event. `Disconnected` means the engine thread is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}

async fn handle_command(
    importer: &dyn Importer,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Start {
            run_id,
            content,
            cancel,
        } => {
            let sink = ChannelFeedSink::new(run_id, event_tx.clone());
            let result = importer.import_batch(&content, &sink, &cancel).await;
            match &result {
                Ok(summary) => roster_info!(
                    "Run {} closed: {} records, {} skipped, finish={}, cancelled={}",
                    run_id,
                    summary.records,
                    summary.skipped,
                    summary.saw_finish,
                    summary.cancelled
                ),
                Err(err) => roster_error!("Run {} failed: {}", run_id, err),
            }
            let _ = event_tx.send(EngineEvent::Completed { run_id, result });
        }
    }
}

fn fail_all(
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
    message: String,
) {
    while let Ok(EngineCommand::Start { run_id, .. }) = cmd_rx.recv() {
        let _ = event_tx.send(EngineEvent::Completed {
            run_id,
            result: Err(ImportError::new(FailureKind::Runtime, message.clone())),
        });
    }
}
