use crate::{
    source::SnapshotSource,
    NodeAddress,
    StatLine,
};
use chrono::{
    DateTime,
    Utc,
};
use inner::NodeMonitorInner;
use std::{
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
use tokio_util::sync::{
    CancellationToken,
    DropGuard,
};

mod inner;
mod state;
mod store;

pub use state::NodeState;
pub use store::{
    FleetMembers,
    NodeStore,
};

/// Handle to the polling worker of one node. Dropping the handle cancels
/// the worker.
#[derive(Debug)]
pub struct NodeMonitor {
    pub address: NodeAddress,
    pub created: DateTime<Utc>,
    pub state: watch::Receiver<NodeState>,
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
    _task_guard: DropGuard,
}

impl NodeMonitor {
    /// Spawns the worker. Its first poll happens right away, then once per
    /// `interval`; every poll publishes one line on `reports`.
    pub fn start(
        address: NodeAddress,
        source: Arc<dyn SnapshotSource>,
        reports: mpsc::Sender<StatLine>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        let (state_sender, state_receiver) = watch::channel(NodeState::default());
        let task_guard = cancellation_token.clone().drop_guard();

        let inner = NodeMonitorInner {
            address: address.clone(),
            source,
            reports,
            interval,
            state: state_sender,
            previous: None,
            consecutive_errors: 0,
        };
        let task = tokio::task::spawn(inner.run(cancellation_token.clone()));

        Self {
            address,
            created: Utc::now(),
            state: state_receiver,
            cancellation_token,
            task,
            _task_guard: task_guard,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Cancels the worker and waits until it has exited.
    pub async fn stop(self) {
        let Self {
            address,
            cancellation_token,
            task,
            ..
        } = self;
        cancellation_token.cancel();
        if let Err(err) = task.await {
            error!(%address, "node monitor task failed: {err}");
        }
    }

    /// Waits for the outcome of the first poll. `false` when it failed or the
    /// worker exited before polling.
    pub async fn first_poll_succeeded(&self) -> bool {
        let mut state = self.state.clone();
        let succeeded = match state.wait_for(NodeState::has_polled).await {
            Ok(state) => state.last_success.is_some(),
            Err(_) => false,
        };
        succeeded
    }
}
