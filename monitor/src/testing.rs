//! Scripted sources for driving monitors in tests.

use crate::{
    source::{
        DiscoverySource,
        SnapshotSource,
        SourceFuture,
    },
    NodeAddress,
    Snapshot,
    SourceError,
};
use chrono::{
    DateTime,
    TimeZone as _,
    Utc,
};
use std::{
    collections::{
        BTreeSet,
        HashMap,
        VecDeque,
    },
    sync::Mutex,
    time::Duration,
};

/// A snapshot taken `secs` seconds after a fixed epoch.
pub fn snapshot_at(secs: i64) -> Snapshot {
    Snapshot::new(at(secs))
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Replays a fixed list of responses per node. A node without responses left
/// is unreachable.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<NodeAddress, VecDeque<Result<Snapshot, SourceError>>>>,
    delays: HashMap<NodeAddress, Duration>,
}

impl ScriptedSource {
    pub fn with_script(self, address: &NodeAddress, responses: Vec<Result<Snapshot, SourceError>>) -> Self {
        self.scripts.lock().unwrap().insert(address.clone(), responses.into());
        self
    }

    /// Every fetch of `address` takes `delay` to answer.
    pub fn with_delay(mut self, address: &NodeAddress, delay: Duration) -> Self {
        self.delays.insert(address.clone(), delay);
        self
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch<'a>(&'a self, address: &'a NodeAddress) -> SourceFuture<'a, Snapshot> {
        Box::pin(async move {
            if let Some(delay) = self.delays.get(address) {
                tokio::time::sleep(*delay).await;
            }
            self.scripts
                .lock()
                .unwrap()
                .get_mut(address)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(SourceError::Unreachable("no scripted response".into())))
        })
    }
}

/// Answers member listings with a fixed set per queried node.
#[derive(Default)]
pub struct ScriptedDiscovery {
    members: HashMap<NodeAddress, Result<BTreeSet<NodeAddress>, SourceError>>,
}

impl ScriptedDiscovery {
    pub fn with_members(mut self, via: &NodeAddress, members: &[NodeAddress]) -> Self {
        self.members.insert(via.clone(), Ok(members.iter().cloned().collect()));
        self
    }

    pub fn with_failure(mut self, via: &NodeAddress, error: SourceError) -> Self {
        self.members.insert(via.clone(), Err(error));
        self
    }
}

impl DiscoverySource for ScriptedDiscovery {
    fn list_members<'a>(&'a self, via: &'a NodeAddress) -> SourceFuture<'a, BTreeSet<NodeAddress>> {
        let result = self
            .members
            .get(via)
            .cloned()
            .unwrap_or_else(|| Err(SourceError::Unreachable("no scripted members".into())));
        Box::pin(async move { result })
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    flushes: usize,
}

/// Output sink that keeps everything written to it, shared with the test.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    captured: std::sync::Arc<Mutex<Captured>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.captured.lock().unwrap().bytes.clone()).unwrap()
    }

    pub fn flushes(&self) -> usize {
        self.captured.lock().unwrap().flushes
    }
}

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.captured.lock().unwrap().bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.captured.lock().unwrap().flushes += 1;
        Ok(())
    }
}

/// Output sink whose every write fails, like a closed pipe.
#[derive(Debug, Default)]
pub struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Err(std::io::ErrorKind::BrokenPipe.into())
    }
}
