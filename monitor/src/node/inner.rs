use super::NodeState;
use crate::{
    source::SnapshotSource,
    stat_line::StatError,
    NodeAddress,
    Snapshot,
    StatLine,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{
        mpsc,
        watch,
    },
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

/// Polling worker of one node. It is the only owner of the previous
/// snapshot and publishes exactly one line per completed tick.
pub(super) struct NodeMonitorInner {
    pub(super) address: NodeAddress,
    pub(super) source: Arc<dyn SnapshotSource>,
    pub(super) reports: mpsc::Sender<StatLine>,
    pub(super) interval: Duration,
    pub(super) state: watch::Sender<NodeState>,
    pub(super) previous: Option<Snapshot>,
    pub(super) consecutive_errors: u64,
}

impl NodeMonitorInner {
    #[instrument(level = "debug", name = "node", skip_all, fields(address = %self.address))]
    pub(super) async fn run(mut self, cancellation_token: CancellationToken) {
        self.state.send_modify(|state| state.running = true);
        debug!(interval = ?self.interval, "node monitor started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // A stop request abandons the tick in flight; nothing is published after it.
            let line = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                line = self.poll() => line,
            };

            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                sent = self.reports.send(line) => {
                    if sent.is_err() {
                        debug!("report channel closed");
                        break;
                    }
                }
            }
        }

        self.state.send_modify(|state| state.running = false);
        debug!("node monitor stopped");
    }

    /// Every line is stamped with the local time the poll started, so the
    /// time column follows one clock. Node clocks only drive rates.
    async fn poll(&mut self) -> StatLine {
        let polled_at = Utc::now();
        match self.source.fetch(&self.address).await {
            Ok(snapshot) => self.on_snapshot(snapshot, polled_at),
            Err(err) => self.on_failure(StatError::from(&err), polled_at),
        }
    }

    fn on_snapshot(&mut self, snapshot: Snapshot, polled_at: DateTime<Utc>) -> StatLine {
        if let Some(previous) = &self.previous {
            if snapshot.taken_at <= previous.taken_at {
                return self.on_failure(StatError::Stale, polled_at);
            }
        }

        let mut line = StatLine::from_snapshots(&self.address, self.previous.as_ref(), &snapshot);
        line.time = polled_at;
        self.previous = Some(snapshot);

        if self.consecutive_errors > 0 {
            info!(failed_polls = self.consecutive_errors, "node recovered");
        }
        self.consecutive_errors = 0;
        self.state.send_modify(|state| {
            state.polls += 1;
            state.consecutive_errors = 0;
            state.last_success = Some(line.time);
            state.last_error = None;
        });
        line
    }

    /// The previous snapshot survives so the next success can compute rates
    /// across the outage.
    fn on_failure(&mut self, error: StatError, polled_at: DateTime<Utc>) -> StatLine {
        self.consecutive_errors += 1;
        let consecutive_errors = self.consecutive_errors;
        if consecutive_errors == 1 {
            warn!(%error, "poll failed");
        } else {
            debug!(%error, consecutive_errors, "poll still failing");
        }

        self.state.send_modify(|state| {
            state.polls += 1;
            state.consecutive_errors = consecutive_errors;
            state.last_error = Some(error.to_string());
        });
        StatLine::failed(&self.address, error, polled_at)
    }
}
