use crate::{
    snapshot::{
        FieldKind,
        NodeRole,
        Snapshot,
        StatField,
    },
    source::SourceError,
    NodeAddress,
};
use chrono::{
    DateTime,
    Utc,
};
use std::collections::BTreeMap;
use strum::IntoEnumIterator as _;

/// One reported value of a stat line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Absolute(u64),
    Rate(f64),
    /// No previous sample, a counter reset or a missing reading.
    Unavailable,
}

impl Metric {
    pub fn is_available(&self) -> bool {
        !matches!(self, Metric::Unavailable)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Metric::Absolute(value) => Some(*value as f64),
            Metric::Rate(value) => Some(*value),
            Metric::Unavailable => None,
        }
    }
}

/// Why a node produced no numbers for a tick.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StatError {
    #[display("unreachable: {_0}")]
    Unreachable(String),
    #[display("auth failure: {_0}")]
    AuthFailure(String),
    /// The node returned a sample that is not newer than the previous one.
    #[display("stale sample")]
    Stale,
}

impl From<&SourceError> for StatError {
    fn from(err: &SourceError) -> Self {
        match err {
            SourceError::Auth(message) => StatError::AuthFailure(message.clone()),
            SourceError::Unreachable(message) | SourceError::Protocol(message) => {
                StatError::Unreachable(message.clone())
            }
        }
    }
}

/// What one node reported for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct StatLine {
    pub host: NodeAddress,
    pub time: DateTime<Utc>,
    pub replica_set: Option<String>,
    pub role: Option<NodeRole>,
    pub metrics: BTreeMap<StatField, Metric>,
    pub error: Option<StatError>,
}

impl StatLine {
    /// Derives the line for `current`, computing rates against `previous`.
    pub fn from_snapshots(host: &NodeAddress, previous: Option<&Snapshot>, current: &Snapshot) -> Self {
        let elapsed_secs = previous.map(|prev| elapsed_seconds(prev.taken_at, current.taken_at));

        let metrics = StatField::iter()
            .map(|field| {
                let metric = match (field.kind(), current.get(field)) {
                    (_, None) => Metric::Unavailable,
                    (FieldKind::Gauge, Some(value)) => Metric::Absolute(value),
                    (FieldKind::Counter, Some(value)) => {
                        match (previous.and_then(|prev| prev.get(field)), elapsed_secs) {
                            (Some(before), Some(elapsed)) => rate(before, value, elapsed),
                            _ => Metric::Unavailable,
                        }
                    }
                };
                (field, metric)
            })
            .collect();

        Self {
            host: host.clone(),
            time: current.taken_at,
            replica_set: current.replica_set.clone(),
            role: current.role,
            metrics,
            error: None,
        }
    }

    pub fn failed(host: &NodeAddress, error: StatError, time: DateTime<Utc>) -> Self {
        Self {
            host: host.clone(),
            time,
            replica_set: None,
            role: None,
            metrics: BTreeMap::new(),
            error: Some(error),
        }
    }

    pub fn metric(&self, field: StatField) -> Metric {
        self.metrics.get(&field).copied().unwrap_or(Metric::Unavailable)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_microseconds().unwrap_or(i64::MAX) as f64 / 1_000_000.0
}

/// A counter that went backwards was reset; there is no meaningful rate.
fn rate(before: u64, after: u64, elapsed_secs: f64) -> Metric {
    if after < before || elapsed_secs <= 0.0 {
        return Metric::Unavailable;
    }
    Metric::Rate((after - before) as f64 / elapsed_secs)
}
