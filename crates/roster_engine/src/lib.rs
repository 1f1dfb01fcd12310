//! Roster engine: progress feed decoding and the batch import transport.
mod client;
mod decode;
mod engine;
mod feed;
mod persist;
mod record;
mod types;

pub use client::{AdminSession, ImportSettings, Importer, ReqwestImporter};
pub use decode::LineDecoder;
pub use engine::EngineHandle;
pub use feed::{run_feed, ChannelFeedSink, FeedSink};
pub use persist::{ensure_report_dir, PersistError, ReportWriter};
pub use record::{parse_line, FeedRecord, ItemResult, LineError, ProgressRecord};
pub use types::{EngineEvent, FailureKind, FeedSummary, ImportError, RunId};
