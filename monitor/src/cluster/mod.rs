//! Cluster-level views over the lines the node monitors publish.

use crate::StatLine;

mod aggregating;
mod direct;
mod report;

pub use aggregating::AggregatingMonitor;
pub use direct::DirectMonitor;
pub use report::{
    ReportLoop,
    ReportOutcome,
    REPORT_CHANNEL_CAPACITY,
};

/// Decides which lines go into each flush. Every call to `update` is one
/// flush; an empty result writes nothing.
pub trait ClusterMonitor: Send {
    fn update(&mut self, line: StatLine) -> Vec<StatLine>;

    fn name(&self) -> &'static str;
}

/// Aggregating when `aggregate` is set, direct otherwise.
pub fn select(aggregate: bool) -> Box<dyn ClusterMonitor> {
    if aggregate {
        Box::new(AggregatingMonitor::default())
    } else {
        Box::new(DirectMonitor)
    }
}
