use serde::{
    Serialize,
    Serializer,
};
use std::{
    fmt,
    str::FromStr,
};

/// Port assumed for a host given without one.
pub const DEFAULT_PORT: u16 = 27017;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty node address")]
    Empty,
    #[error("invalid port in node address {0:?}")]
    InvalidPort(String),
    #[error("unterminated IPv6 literal in node address {0:?}")]
    UnterminatedBracket(String),
}

/// `host:port` of one monitored node. Ordered by host, then by port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress {
    host: String,
    port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`, using `default_port`
    /// when none is given.
    pub fn parse_with_default_port(input: &str, default_port: u16) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let end = rest
                .find(']')
                .ok_or_else(|| AddressError::UnterminatedBracket(input.to_string()))?;
            let host = &rest[..end];
            match &rest[end + 1..] {
                "" => (host, None),
                tail => match tail.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(AddressError::InvalidPort(input.to_string())),
                },
            }
        } else {
            match input.rsplit_once(':') {
                // A bare IPv6 literal has several colons and no port.
                Some((host, _)) if host.contains(':') => (input, None),
                Some((host, port)) => (host, Some(port)),
                None => (input, None),
            }
        };

        if host.is_empty() {
            return Err(AddressError::Empty);
        }
        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| AddressError::InvalidPort(input.to_string()))?,
            None => default_port,
        };

        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for NodeAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_default_port(s, DEFAULT_PORT)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Serialize for NodeAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
