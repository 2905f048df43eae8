use super::ClusterMonitor;
use crate::{
    format::LineFormatter,
    FleetError,
    StatLine,
};
use std::io::Write;
use tokio::sync::mpsc;

/// Capacity of the report channel. Node monitors wait for room when it is
/// full; lines are never dropped.
pub const REPORT_CHANNEL_CAPACITY: usize = 1024;

/// Why the report loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Every sender is gone and all published lines were written.
    Drained,
    RowLimitReached,
}

/// Single consumer of the report channel. Owns the cluster view, the
/// formatter and the output sink.
pub struct ReportLoop {
    cluster: Box<dyn ClusterMonitor>,
    formatter: Box<dyn LineFormatter>,
    sink: Box<dyn Write + Send>,
    /// Maximum number of flushes; 0 is unlimited.
    row_count: u64,
}

impl ReportLoop {
    pub fn new(
        cluster: Box<dyn ClusterMonitor>,
        formatter: Box<dyn LineFormatter>,
        sink: Box<dyn Write + Send>,
        row_count: u64,
    ) -> Self {
        Self {
            cluster,
            formatter,
            sink,
            row_count,
        }
    }

    #[instrument(level = "debug", name = "report", skip_all, fields(cluster = self.cluster.name()))]
    pub async fn run(mut self, mut reports: mpsc::Receiver<StatLine>) -> Result<ReportOutcome, FleetError> {
        let mut flushes = 0u64;
        while let Some(line) = reports.recv().await {
            let lines = self.cluster.update(line);
            if lines.is_empty() {
                continue;
            }

            let text = self.formatter.format(&lines)?;
            self.sink
                .write_all(text.as_bytes())
                .and_then(|()| self.sink.flush())
                .map_err(FleetError::Output)?;

            flushes += 1;
            if self.row_count > 0 && flushes >= self.row_count {
                debug!(flushes, "row limit reached");
                return Ok(ReportOutcome::RowLimitReached);
            }
        }

        debug!(flushes, "report channel drained");
        Ok(ReportOutcome::Drained)
    }
}
