use super::{
    NodeMonitor,
    NodeState,
};
use crate::NodeAddress;
use futures::future::join_all;
use std::collections::{
    btree_map::Entry,
    BTreeMap,
};
use tokio::sync::watch;

/// Read-only view of the fleet handed to other workers: every known node
/// with a receiver for its health.
pub type FleetMembers = BTreeMap<NodeAddress, watch::Receiver<NodeState>>;

/// All running node monitors, keyed by address. Owned by the orchestrator
/// loop alone, so it needs no locking.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: BTreeMap<NodeAddress, NodeMonitor>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a monitor for `address` unless one already exists. Returns
    /// whether a monitor was started.
    pub fn add_with(&mut self, address: NodeAddress, start: impl FnOnce(&NodeAddress) -> NodeMonitor) -> bool {
        match self.nodes.entry(address) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                let monitor = start(entry.key());
                entry.insert(monitor);
                true
            }
        }
    }

    pub fn remove(&mut self, address: &NodeAddress) -> Option<NodeMonitor> {
        self.nodes.remove(address)
    }

    pub fn get(&self, address: &NodeAddress) -> Option<&NodeMonitor> {
        self.nodes.get(address)
    }

    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.nodes.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &NodeAddress> {
        self.nodes.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &NodeMonitor> {
        self.nodes.values()
    }

    pub fn members(&self) -> FleetMembers {
        self.nodes
            .iter()
            .map(|(address, monitor)| (address.clone(), monitor.state.clone()))
            .collect()
    }

    /// Stops every monitor and waits for all of them to exit.
    pub async fn stop_all(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        join_all(nodes.into_values().map(NodeMonitor::stop)).await;
    }
}
