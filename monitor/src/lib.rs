#[macro_use]
extern crate tracing;

mod address;
pub mod cluster;
pub mod discovery;
mod error;
pub mod format;
pub mod node;
mod orchestrator;
mod snapshot;
pub mod source;
mod stat_line;
#[cfg(test)]
mod testing;

pub use address::{
    AddressError,
    NodeAddress,
    DEFAULT_PORT,
};
pub use cluster::{
    AggregatingMonitor,
    ClusterMonitor,
    DirectMonitor,
    ReportLoop,
    ReportOutcome,
};
pub use discovery::Discoverer;
pub use error::FleetError;
pub use format::{
    GridLineFormatter,
    JsonLineFormatter,
    LineFormatter,
};
pub use node::{
    NodeMonitor,
    NodeState,
    NodeStore,
};
pub use orchestrator::Orchestrator;
pub use snapshot::{
    FieldKind,
    NodeRole,
    Snapshot,
    StatField,
    Unit,
};
pub use source::{
    DiscoverySource,
    HttpNodeSource,
    SnapshotSource,
    SourceError,
};
pub use stat_line::{
    Metric,
    StatError,
    StatLine,
};
