use std::sync::mpsc;

use futures_util::{Stream, StreamExt};
use roster_logging::{preview, roster_debug, roster_warn};
use tokio_util::sync::CancellationToken;

use crate::{
    parse_line, EngineEvent, FeedRecord, FeedSummary, ImportError, LineDecoder, LineError, RunId,
};

const LOG_PREVIEW_CHARS: usize = 120;

/// Receives decoded feed records in wire order.
pub trait FeedSink: Send + Sync {
    /// Called once, when the first bytes arrive.
    fn opened(&self) {}
    fn record(&self, record: FeedRecord);
}

pub struct ChannelFeedSink {
    run_id: RunId,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelFeedSink {
    pub fn new(run_id: RunId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { run_id, tx }
    }
}

impl FeedSink for ChannelFeedSink {
    fn opened(&self) {
        let _ = self.tx.send(EngineEvent::Opened {
            run_id: self.run_id,
        });
    }

    fn record(&self, record: FeedRecord) {
        let _ = self.tx.send(EngineEvent::Record {
            run_id: self.run_id,
            record,
        });
    }
}

/// Drains a chunked byte stream into `sink`, one record per complete line.
///
/// Returns after a `finish` record, at end of stream, or when `cancel` fires.
/// Nothing reaches `sink` once `cancel` has fired. Read errors end the run.
pub async fn run_feed<S, B>(
    chunks: S,
    sink: &dyn FeedSink,
    cancel: &CancellationToken,
) -> Result<FeedSummary, ImportError>
where
    S: Stream<Item = Result<B, ImportError>>,
    B: AsRef<[u8]>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut decoder = LineDecoder::new();
    let mut summary = FeedSummary::default();
    let mut opened = false;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                summary.cancelled = true;
                return Ok(summary);
            }
            next = chunks.next() => next,
        };

        let (lines, ended) = match next {
            Some(Ok(chunk)) => {
                let bytes = chunk.as_ref();
                if bytes.is_empty() {
                    continue;
                }
                if !opened {
                    opened = true;
                    sink.opened();
                }
                (decoder.push(bytes), false)
            }
            Some(Err(err)) => {
                roster_warn!(
                    "Feed read failed after {} lines ({} bytes pending): {}",
                    summary.lines,
                    decoder.pending_len(),
                    err
                );
                return Err(err);
            }
            None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
        };

        for line in lines {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                return Ok(summary);
            }
            if deliver_line(&line, sink, &mut summary) {
                roster_debug!("Feed finished after {} lines", summary.lines);
                return Ok(summary);
            }
        }

        if ended {
            roster_debug!(
                "Feed closed after {} lines ({} records, {} skipped)",
                summary.lines,
                summary.records,
                summary.skipped
            );
            return Ok(summary);
        }
    }
}

/// Returns true when the line was the `finish` record.
fn deliver_line(line: &str, sink: &dyn FeedSink, summary: &mut FeedSummary) -> bool {
    summary.lines += 1;
    match parse_line(line) {
        Ok(record) => {
            let is_finish = record.is_finish();
            summary.records += 1;
            sink.record(record);
            if is_finish {
                summary.saw_finish = true;
            }
            is_finish
        }
        Err(LineError::Blank) => false,
        Err(err) => {
            summary.skipped += 1;
            roster_warn!(
                "Skipping feed line {}: {} ({})",
                summary.lines,
                err,
                preview(line, LOG_PREVIEW_CHARS)
            );
            false
        }
    }
}
