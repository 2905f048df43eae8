use crate::{
    address::AddressError,
    NodeAddress,
};

/// Failures that end a run.
#[derive(thiserror::Error, Debug)]
pub enum FleetError {
    #[error("no seed answered its first poll: {}", join(.seeds))]
    NoReachableSeed { seeds: Vec<NodeAddress> },
    #[error("no seed hosts given")]
    NoSeeds,
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error("failed to format stat lines")]
    Format(#[source] serde_json::Error),
    #[error("failed to write report output")]
    Output(#[source] std::io::Error),
    #[error("report loop terminated unexpectedly: {0}")]
    ReportLoop(String),
}

fn join(seeds: &[NodeAddress]) -> String {
    seeds.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_seeds_are_listed() {
        let err = FleetError::NoReachableSeed {
            seeds: vec![NodeAddress::new("a", 1), NodeAddress::new("b", 2)],
        };
        assert_eq!(err.to_string(), "no seed answered its first poll: a:1, b:2");
    }
}
