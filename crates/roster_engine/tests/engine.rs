use std::sync::Arc;
use std::time::Duration;

use futures_util::stream;
use roster_engine::{
    run_feed, EngineEvent, EngineHandle, FailureKind, FeedRecord, FeedSink, FeedSummary,
    ImportError, Importer,
};
use tokio_util::sync::CancellationToken;

/// Replays `content` as the feed itself, so tests control every byte.
struct EchoImporter;

#[async_trait::async_trait]
impl Importer for EchoImporter {
    async fn import_batch(
        &self,
        content: &str,
        sink: &dyn FeedSink,
        cancel: &CancellationToken,
    ) -> Result<FeedSummary, ImportError> {
        if content == "reject" {
            return Err(ImportError::new(FailureKind::HttpStatus(403), "forbidden"));
        }
        let chunks: Vec<Result<Vec<u8>, ImportError>> = content
            .as_bytes()
            .chunks(7)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        run_feed(stream::iter(chunks), sink, cancel).await
    }
}

fn collect_until_completed(engine: &EngineHandle) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = engine.recv_timeout(Duration::from_secs(5)) {
        let done = matches!(event, EngineEvent::Completed { .. });
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[test]
fn engine_reports_records_then_completion() {
    let engine = EngineHandle::with_importer(Arc::new(EchoImporter));
    let feed = "{\"type\":\"start\",\"total\":1}\n{\"type\":\"finish\",\"total\":1,\"success_count\":1,\"failed_count\":0}\n";

    let _cancel = engine.start(7, feed);
    let events = collect_until_completed(&engine);

    assert_eq!(events.len(), 4);
    assert_eq!(events[0], EngineEvent::Opened { run_id: 7 });
    assert_eq!(
        events[1],
        EngineEvent::Record {
            run_id: 7,
            record: FeedRecord::Start { total: 1 },
        }
    );
    match &events[3] {
        EngineEvent::Completed {
            run_id: 7,
            result: Ok(summary),
        } => assert!(summary.saw_finish),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn engine_reports_transport_failure() {
    let engine = EngineHandle::with_importer(Arc::new(EchoImporter));

    let _cancel = engine.start(1, "reject");
    let events = collect_until_completed(&engine);

    match events.as_slice() {
        [EngineEvent::Completed {
            run_id: 1,
            result: Err(err),
        }] => assert_eq!(err.kind, FailureKind::HttpStatus(403)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn try_recv_is_empty_without_runs() {
    let engine = EngineHandle::with_importer(Arc::new(EchoImporter));
    assert!(engine.try_recv().is_none());
}
