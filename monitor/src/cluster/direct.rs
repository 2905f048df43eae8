use super::ClusterMonitor;
use crate::StatLine;

/// Passes every line straight through, in arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectMonitor;

impl ClusterMonitor for DirectMonitor {
    fn update(&mut self, line: StatLine) -> Vec<StatLine> {
        vec![line]
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
