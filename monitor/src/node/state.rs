use chrono::{
    DateTime,
    Utc,
};

/// Health of one node monitor as last published by its worker.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeState {
    pub running: bool,
    pub polls: u64,
    pub consecutive_errors: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl NodeState {
    /// Polled successfully at least once and not failing since.
    pub fn is_healthy(&self) -> bool {
        self.last_success.is_some() && self.consecutive_errors == 0
    }

    pub fn has_polled(&self) -> bool {
        self.polls > 0
    }
}
