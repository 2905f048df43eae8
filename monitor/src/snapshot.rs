use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;
use strum::{
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
};

/// How a raw reading turns into a reported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Monotonic total, reported as a per-second rate.
    Counter,
    /// Point-in-time value, reported as is.
    Gauge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Count,
    Bytes,
}

/// Every field a stat line can carry, in display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatField {
    Insert,
    Query,
    Update,
    Delete,
    #[strum(to_string = "getmore")]
    #[serde(rename = "getmore")]
    GetMore,
    Command,
    Faults,
    Flushes,
    Vsize,
    Res,
    Qr,
    Qw,
    Ar,
    Aw,
    NetIn,
    NetOut,
    Conn,
    ReplLag,
}

impl StatField {
    pub fn kind(self) -> FieldKind {
        match self {
            StatField::Insert
            | StatField::Query
            | StatField::Update
            | StatField::Delete
            | StatField::GetMore
            | StatField::Command
            | StatField::Faults
            | StatField::Flushes
            | StatField::NetIn
            | StatField::NetOut => FieldKind::Counter,
            StatField::Vsize
            | StatField::Res
            | StatField::Qr
            | StatField::Qw
            | StatField::Ar
            | StatField::Aw
            | StatField::Conn
            | StatField::ReplLag => FieldKind::Gauge,
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            StatField::Vsize | StatField::Res | StatField::NetIn | StatField::NetOut => Unit::Bytes,
            _ => Unit::Count,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Replication role a node reports for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum NodeRole {
    #[strum(to_string = "PRI", serialize = "primary")]
    Primary,
    #[strum(to_string = "SEC", serialize = "secondary")]
    Secondary,
    #[strum(to_string = "ARB", serialize = "arbiter")]
    Arbiter,
    #[strum(to_string = "RTR", serialize = "router")]
    Router,
    #[strum(to_string = "SLV", serialize = "standalone")]
    Standalone,
}

/// Raw readings of one node at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub values: BTreeMap<StatField, u64>,
    pub replica_set: Option<String>,
    pub role: Option<NodeRole>,
}

impl Snapshot {
    pub fn new(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            values: BTreeMap::new(),
            replica_set: None,
            role: None,
        }
    }

    pub fn with(mut self, field: StatField, value: u64) -> Self {
        self.values.insert(field, value);
        self
    }

    pub fn get(&self, field: StatField) -> Option<u64> {
        self.values.get(&field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn field_names_are_stable() {
        let names = StatField::iter().map(StatField::name).collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"insert"));
        assert!(names.contains(&"getmore"));
        assert!(names.contains(&"net_in"));
        assert_eq!(names.last(), Some(&"repl_lag"));
        assert_eq!(StatField::from_str("net_out").unwrap(), StatField::NetOut);
    }

    #[test]
    fn byte_fields() {
        assert_eq!(StatField::Res.unit(), Unit::Bytes);
        assert_eq!(StatField::Res.kind(), FieldKind::Gauge);
        assert_eq!(StatField::NetIn.kind(), FieldKind::Counter);
        assert_eq!(StatField::Conn.unit(), Unit::Count);
    }

    #[test]
    fn roles_parse_from_long_names() {
        assert_eq!(NodeRole::from_str("Primary").unwrap(), NodeRole::Primary);
        assert_eq!(NodeRole::from_str("SEC").unwrap(), NodeRole::Secondary);
        assert_eq!(NodeRole::Arbiter.to_string(), "ARB");
    }
}
