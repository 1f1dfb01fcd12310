use std::io::Write;

use roster_core::{Classification, ImportOutcome, ItemResult, ProgressPort, ProgressSnapshot};

const BAR_WIDTH: usize = 30;

pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = usize::from(percent.min(100));
    let filled = percent * width / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn snapshot_line(snapshot: &ProgressSnapshot) -> String {
    format!(
        "{} {:>3}%  {}  ok {}  failed {}",
        progress_bar(snapshot.percent, BAR_WIDTH),
        snapshot.percent,
        snapshot.stage,
        snapshot.success_count,
        snapshot.failed_count
    )
}

pub fn row_line(row: &ItemResult) -> String {
    let mark = if row.success { "ok  " } else { "FAIL" };
    match row.detail() {
        Some(detail) => format!("  {mark} {}  {}", row.email, detail),
        None => format!("  {mark} {}", row.email),
    }
}

pub fn outcome_line(outcome: &ImportOutcome) -> String {
    match outcome {
        ImportOutcome::Finished(summary) => {
            let verdict = match summary.classification {
                Classification::FullSuccess => "all imported",
                Classification::PartialSuccess => "some imports failed",
            };
            let mut line = format!(
                "Done: {verdict} ({} ok, {} failed, {} total)",
                summary.success_count, summary.failed_count, summary.total
            );
            if summary.count_mismatch {
                line.push_str(" - server counts do not add up");
            }
            line
        }
        ImportOutcome::Incomplete => {
            "Incomplete: the server closed the feed before reporting a result".to_string()
        }
        ImportOutcome::TransportFailed { message } => format!("Failed: {message}"),
        ImportOutcome::Cancelled => "Cancelled".to_string(),
    }
}

/// Prints each update as its own line; rows appear as they arrive.
pub struct TerminalPort<W: Write> {
    out: W,
}

impl<W: Write> TerminalPort<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn print(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }
}

impl<W: Write> ProgressPort for TerminalPort<W> {
    fn on_snapshot(&mut self, snapshot: &ProgressSnapshot) {
        self.print(&snapshot_line(snapshot));
    }

    fn on_row_prepended(&mut self, row: &ItemResult) {
        self.print(&row_line(row));
    }

    fn on_warning(&mut self, message: &str) {
        self.print(&format!("warning: {message}"));
    }

    fn on_completed(&mut self, outcome: &ImportOutcome) {
        self.print(&outcome_line(outcome));
    }
}
