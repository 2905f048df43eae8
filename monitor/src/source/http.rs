use super::{
    DiscoverySource,
    SnapshotSource,
    SourceError,
    SourceFuture,
};
use crate::{
    snapshot::{
        NodeRole,
        StatField,
    },
    NodeAddress,
    Snapshot,
};
use chrono::{
    DateTime,
    Utc,
};
use eyre::{
    Context as _,
    Result,
};
use reqwest::{
    Client,
    StatusCode,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use std::{
    collections::{
        BTreeMap,
        BTreeSet,
    },
    str::FromStr as _,
    time::Duration,
};
use url::Url;

const STATS_PATH: &str = "stats";
const MEMBERS_PATH: &str = "members";

/// Talks to a small JSON agent running next to every node:
/// `GET /stats` for the counters and `GET /members` for the fleet view.
#[derive(Debug, Clone)]
pub struct HttpNodeSource {
    client: Client,
    scheme: String,
    default_port: u16,
}

impl HttpNodeSource {
    pub fn new(scheme: impl Into<String>, timeout: Duration, default_port: u16) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            scheme: scheme.into(),
            default_port,
        })
    }

    fn endpoint(&self, address: &NodeAddress, path: &str) -> Result<Url, SourceError> {
        Url::parse(&format!("{}://{}/", self.scheme, address))
            .and_then(|base| base.join(path))
            .map_err(|err| SourceError::Protocol(format!("invalid URL for {address}: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            if err.is_decode() {
                SourceError::Protocol(err.to_string())
            } else {
                SourceError::Unreachable(err.to_string())
            }
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SourceError::Auth(format!("{url} answered {}", response.status())))
            }
            status if !status.is_success() => Err(SourceError::Protocol(format!("{url} answered {status}"))),
            _ => response
                .json::<T>()
                .await
                .map_err(|err| SourceError::Protocol(format!("invalid body from {url}: {err}"))),
        }
    }
}

impl SnapshotSource for HttpNodeSource {
    fn fetch<'a>(&'a self, address: &'a NodeAddress) -> SourceFuture<'a, Snapshot> {
        Box::pin(async move {
            let url = self.endpoint(address, STATS_PATH)?;
            let document = self.get_json::<StatsDocument>(url).await?;
            Ok(document.into_snapshot(Utc::now()))
        })
    }
}

impl DiscoverySource for HttpNodeSource {
    fn list_members<'a>(&'a self, via: &'a NodeAddress) -> SourceFuture<'a, BTreeSet<NodeAddress>> {
        Box::pin(async move {
            let url = self.endpoint(via, MEMBERS_PATH)?;
            let document = self.get_json::<MembersDocument>(url).await?;
            Ok(document.into_addresses(self.default_port))
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatsDocument {
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    set: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    counters: BTreeMap<String, u64>,
}

impl StatsDocument {
    /// Nodes that do not report their own clock are stamped with `received_at`.
    fn into_snapshot(self, received_at: DateTime<Utc>) -> Snapshot {
        let mut snapshot = Snapshot::new(self.time.unwrap_or(received_at));
        snapshot.replica_set = self.set.filter(|set| !set.is_empty());
        snapshot.role = self.role.and_then(|role| match NodeRole::from_str(&role) {
            Ok(role) => Some(role),
            Err(_) => {
                debug!(%role, "ignoring unknown node role");
                None
            }
        });
        for (name, value) in self.counters {
            match StatField::from_str(&name) {
                Ok(field) => {
                    snapshot.values.insert(field, value);
                }
                Err(_) => debug!(%name, "ignoring unknown counter"),
            }
        }
        snapshot
    }
}

#[derive(Debug, Deserialize)]
struct MembersDocument {
    members: Vec<String>,
}

impl MembersDocument {
    fn into_addresses(self, default_port: u16) -> BTreeSet<NodeAddress> {
        self.members
            .iter()
            .filter_map(
                |member| match NodeAddress::parse_with_default_port(member, default_port) {
                    Ok(address) => Some(address),
                    Err(err) => {
                        warn!(%member, "ignoring fleet member: {err}");
                        None
                    }
                },
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn stats_document_becomes_snapshot() {
        let document: StatsDocument = serde_json::from_str(
            r#"{
                "time": "2024-05-01T10:00:00Z",
                "set": "rs0",
                "role": "secondary",
                "counters": {"insert": 10, "conn": 4, "net_in": 2048, "unknown_counter": 1}
            }"#,
        )
        .unwrap();
        let snapshot = document.into_snapshot(Utc::now());

        assert_eq!(snapshot.taken_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert_eq!(snapshot.replica_set.as_deref(), Some("rs0"));
        assert_eq!(snapshot.role, Some(NodeRole::Secondary));
        assert_eq!(snapshot.get(StatField::Insert), Some(10));
        assert_eq!(snapshot.get(StatField::NetIn), Some(2048));
        assert_eq!(snapshot.values.len(), 3);
    }

    #[test]
    fn missing_time_uses_receive_time() {
        let received_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let document: StatsDocument = serde_json::from_str(r#"{"role": "leader", "counters": {}}"#).unwrap();
        let snapshot = document.into_snapshot(received_at);
        assert_eq!(snapshot.taken_at, received_at);
        assert_eq!(snapshot.role, None);
    }

    #[test]
    fn members_document_skips_bad_entries() {
        let document: MembersDocument =
            serde_json::from_str(r#"{"members": ["db1:27018", "db2", "db3:notaport"]}"#).unwrap();
        let addresses = document.into_addresses(4000);
        assert_eq!(
            addresses.into_iter().collect::<Vec<_>>(),
            vec![NodeAddress::new("db1", 27018), NodeAddress::new("db2", 4000)]
        );
    }

    #[test]
    fn endpoint_joins_path() {
        let source = HttpNodeSource::new("http", Duration::from_secs(1), 27017).unwrap();
        let url = source.endpoint(&NodeAddress::new("::1", 8080), STATS_PATH).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/stats");
    }
}
