//! Capabilities the monitor needs from the outside world: reading a node's
//! counters and asking a node who else belongs to the fleet.

use crate::{
    NodeAddress,
    Snapshot,
};
use std::{
    collections::BTreeSet,
    future::Future,
    pin::Pin,
};

mod http;

pub use http::HttpNodeSource;

/// Failure of a single request against a node. The monitor only tells
/// success from failure; the variants decide how the failure is shown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("node unreachable: {0}")]
    Unreachable(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected response: {0}")]
    Protocol(String),
}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Reads the current counters of a node.
pub trait SnapshotSource: Send + Sync {
    fn fetch<'a>(&'a self, address: &'a NodeAddress) -> SourceFuture<'a, Snapshot>;
}

/// Lists the members of the fleet as seen by the node at `via`.
pub trait DiscoverySource: Send + Sync {
    fn list_members<'a>(&'a self, via: &'a NodeAddress) -> SourceFuture<'a, BTreeSet<NodeAddress>>;
}
