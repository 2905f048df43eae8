//! Owns the fleet for the duration of a run: starts the seed monitors,
//! wires discovery to the node store and keeps the report loop fed.

use crate::{
    cluster::{
        ReportLoop,
        ReportOutcome,
        REPORT_CHANNEL_CAPACITY,
    },
    discovery::{
        Discoverer,
        DISCOVERY_CHANNEL_CAPACITY,
    },
    node::{
        FleetMembers,
        NodeMonitor,
        NodeStore,
    },
    source::{
        DiscoverySource,
        SnapshotSource,
    },
    FleetError,
    NodeAddress,
    StatLine,
};
use futures::future::join_all;
use std::{
    future::Future,
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{
        mpsc,
        watch,
    },
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

pub struct Orchestrator {
    source: Arc<dyn SnapshotSource>,
    discovery: Option<Arc<dyn DiscoverySource>>,
    interval: Duration,
    nodes: NodeStore,
    members: watch::Sender<FleetMembers>,
    reports: mpsc::Sender<StatLine>,
    report_receiver: Option<mpsc::Receiver<StatLine>>,
    cancellation_token: CancellationToken,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration) -> Self {
        let (reports, report_receiver) = mpsc::channel(REPORT_CHANNEL_CAPACITY);
        let (members, _) = watch::channel(FleetMembers::new());
        Self {
            source,
            discovery: None,
            interval,
            nodes: NodeStore::new(),
            members,
            reports,
            report_receiver: Some(report_receiver),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Enables periodic discovery of further fleet members through `discovery`.
    pub fn with_discovery(mut self, discovery: Arc<dyn DiscoverySource>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// Starts monitoring `address` unless it is already monitored.
    pub fn add_node(&mut self, address: NodeAddress) -> bool {
        let started = self.nodes.add_with(address, |address| {
            NodeMonitor::start(
                address.clone(),
                self.source.clone(),
                self.reports.clone(),
                self.interval,
                self.cancellation_token.child_token(),
            )
        });
        if started {
            self.publish_members();
        }
        started
    }

    /// Stops and forgets the monitor of `address`.
    pub async fn remove_node(&mut self, address: &NodeAddress) -> bool {
        let Some(monitor) = self.nodes.remove(address) else {
            return false;
        };
        monitor.stop().await;
        self.publish_members();
        info!(%address, "node removed");
        true
    }

    fn publish_members(&self) {
        self.members.send_replace(self.nodes.members());
    }

    /// Runs until `shutdown` resolves, the row limit is reached or output
    /// fails. Fails right away when no seed answers its first poll.
    #[instrument(level = "debug", skip_all, fields(seeds = seeds.len()))]
    pub async fn run(
        mut self,
        seeds: Vec<NodeAddress>,
        report: ReportLoop,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), FleetError> {
        if seeds.is_empty() {
            return Err(FleetError::NoSeeds);
        }
        let Some(report_receiver) = self.report_receiver.take() else {
            return Err(FleetError::ReportLoop("report channel already consumed".into()));
        };
        tokio::pin!(shutdown);

        for seed in &seeds {
            if self.add_node(seed.clone()) {
                info!(address = %seed, "monitoring seed");
            }
        }
        let mut report_task = tokio::task::spawn(report.run(report_receiver));

        let reachable = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown requested during startup");
                return self.teardown(report_task).await;
            }
            reachable = self.any_seed_reachable(&seeds) => reachable,
        };
        if !reachable {
            error!("no seed is reachable");
            self.teardown(report_task).await?;
            return Err(FleetError::NoReachableSeed { seeds });
        }

        let (discovered_sender, discovered) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);
        let mut discovered = self.discovery.clone().map(|discovery| {
            Discoverer::new(discovery, self.members.subscribe(), discovered_sender, self.interval)
                .spawn(self.cancellation_token.child_token());
            discovered
        });

        let finished = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break None;
                }
                finished = &mut report_task => break Some(finished),
                address = recv_discovered(&mut discovered), if discovered.is_some() => match address {
                    Some(address) => {
                        if self.add_node(address.clone()) {
                            info!(%address, "monitoring discovered node");
                        }
                    }
                    None => {
                        debug!("discovery ended");
                        discovered = None;
                    }
                },
            }
        };

        match finished {
            None => self.teardown(report_task).await,
            Some(finished) => {
                self.stop_workers().await;
                report_result(finished)
            }
        }
    }

    async fn any_seed_reachable(&self, seeds: &[NodeAddress]) -> bool {
        let checks = seeds
            .iter()
            .filter_map(|seed| self.nodes.get(seed))
            .map(NodeMonitor::first_poll_succeeded);
        join_all(checks).await.into_iter().any(|reachable| reachable)
    }

    async fn stop_workers(&mut self) {
        self.cancellation_token.cancel();
        self.nodes.stop_all().await;
        self.publish_members();
    }

    /// Stops every worker, then lets the report loop write what was
    /// already published.
    async fn teardown(mut self, report_task: JoinHandle<Result<ReportOutcome, FleetError>>) -> Result<(), FleetError> {
        self.stop_workers().await;
        drop(self);
        report_result(report_task.await)
    }
}

async fn recv_discovered(discovered: &mut Option<mpsc::Receiver<NodeAddress>>) -> Option<NodeAddress> {
    match discovered {
        Some(receiver) => receiver.recv().await,
        None => None,
    }
}

fn report_result(finished: Result<Result<ReportOutcome, FleetError>, tokio::task::JoinError>) -> Result<(), FleetError> {
    match finished {
        Ok(Ok(outcome)) => {
            debug!(?outcome, "report loop finished");
            Ok(())
        }
        Ok(Err(err)) => Err(err),
        Err(err) => Err(FleetError::ReportLoop(err.to_string())),
    }
}
