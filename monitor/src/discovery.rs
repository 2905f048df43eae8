//! Periodic fleet discovery. One healthy node is asked for the fleet
//! members; every member the orchestrator does not know yet is handed over
//! on the discovery channel.

use crate::{
    node::FleetMembers,
    source::DiscoverySource,
    NodeAddress,
};
use std::{
    collections::BTreeSet,
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{
        mpsc::{
            self,
            error::TrySendError,
        },
        watch,
    },
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

/// Capacity of the discovery channel, large enough for a full topology burst.
pub const DISCOVERY_CHANNEL_CAPACITY: usize = 256;

pub struct Discoverer {
    source: Arc<dyn DiscoverySource>,
    members: watch::Receiver<FleetMembers>,
    discovered: mpsc::Sender<NodeAddress>,
    interval: Duration,
}

/// Outcome of one discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryCycle {
    /// No monitored node was healthy enough to ask.
    NoHealthyNode,
    Failed,
    /// Newly seen addresses handed over, and those dropped because the
    /// channel was full.
    Reported { sent: usize, deferred: usize },
    ChannelClosed,
}

impl Discoverer {
    pub fn new(
        source: Arc<dyn DiscoverySource>,
        members: watch::Receiver<FleetMembers>,
        discovered: mpsc::Sender<NodeAddress>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            members,
            discovered,
            interval,
        }
    }

    pub fn spawn(self, cancellation_token: CancellationToken) -> JoinHandle<()> {
        tokio::task::spawn(self.run(cancellation_token))
    }

    #[instrument(level = "debug", name = "discovery", skip_all)]
    pub async fn run(mut self, cancellation_token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let cycle = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                cycle = self.discover_once() => cycle,
            };
            if cycle == DiscoveryCycle::ChannelClosed {
                debug!("discovery channel closed");
                break;
            }
        }
        debug!("discovery stopped");
    }

    /// Runs one cycle: pick a node, list members, hand over the new ones.
    pub async fn discover_once(&mut self) -> DiscoveryCycle {
        let Some(via) = self.pick_node() else {
            warn!("no healthy node to discover the fleet through, retrying next cycle");
            return DiscoveryCycle::NoHealthyNode;
        };

        let members = match self.source.list_members(&via).await {
            Ok(members) => members,
            Err(err) => {
                warn!(%via, "fleet discovery failed, retrying next cycle: {err}");
                return DiscoveryCycle::Failed;
            }
        };

        let unknown = self.unknown(members);
        let total = unknown.len();
        let mut sent = 0;
        for address in unknown {
            match self.discovered.try_send(address) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(address)) => {
                    debug!(%address, deferred = total - sent, "discovery channel full, retrying next cycle");
                    break;
                }
                Err(TrySendError::Closed(_)) => return DiscoveryCycle::ChannelClosed,
            }
        }
        if sent > 0 {
            debug!(%via, sent, "discovered new fleet members");
        }

        DiscoveryCycle::Reported {
            sent,
            deferred: total - sent,
        }
    }

    /// First healthy node in address order.
    fn pick_node(&self) -> Option<NodeAddress> {
        self.members
            .borrow()
            .iter()
            .find(|(_, state)| state.borrow().is_healthy())
            .map(|(address, _)| address.clone())
    }

    fn unknown(&self, members: BTreeSet<NodeAddress>) -> Vec<NodeAddress> {
        let known = self.members.borrow();
        members.into_iter().filter(|address| !known.contains_key(address)).collect()
    }
}
