use crate::ItemResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted the batch text (one account per line).
    ImportSubmitted { content: String },
    /// First bytes of the feed arrived.
    StreamOpened,
    /// `start` record.
    FeedStarted { total: u64 },
    /// `progress` record. Counters are the producer's running totals.
    FeedProgress {
        current: u64,
        total: u64,
        success_count: u64,
        failed_count: u64,
        last_result: Option<ItemResult>,
    },
    /// `finish` record.
    FeedFinished {
        total: u64,
        success_count: u64,
        failed_count: u64,
    },
    /// `error` record; reported, never terminal.
    FeedError { message: String },
    /// Connection closed cleanly.
    StreamClosed,
    /// Request rejected, non-2xx status or read error.
    TransportFailed { message: String },
    /// Hosting view is going away.
    CancelRequested,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
