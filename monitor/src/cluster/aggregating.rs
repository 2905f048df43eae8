use super::ClusterMonitor;
use crate::{
    NodeAddress,
    StatLine,
};
use std::collections::BTreeMap;

/// Keeps the latest line of every node and flushes the whole fleet, sorted
/// by address, whenever any node reports.
#[derive(Debug, Clone, Default)]
pub struct AggregatingMonitor {
    latest: BTreeMap<NodeAddress, StatLine>,
}

impl AggregatingMonitor {
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

impl ClusterMonitor for AggregatingMonitor {
    fn update(&mut self, line: StatLine) -> Vec<StatLine> {
        self.latest.insert(line.host.clone(), line);
        self.latest.values().cloned().collect()
    }

    fn name(&self) -> &'static str {
        "aggregating"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::snapshot_at,
        StatError,
        StatField,
    };
    use pretty_assertions::assert_eq;

    fn line(host: &str, secs: i64) -> StatLine {
        StatLine::from_snapshots(
            &NodeAddress::new(host, 27017),
            None,
            &snapshot_at(secs).with(StatField::Conn, secs as u64),
        )
    }

    fn hosts(lines: &[StatLine]) -> Vec<String> {
        lines.iter().map(|line| line.host.host().to_string()).collect()
    }

    #[test]
    fn nodes_appear_from_their_first_line_on() {
        let mut monitor = AggregatingMonitor::default();
        assert_eq!(hosts(&monitor.update(line("a", 0))), vec!["a"]);
        assert_eq!(hosts(&monitor.update(line("b", 0))), vec!["a", "b"]);
    }

    #[test]
    fn flush_is_sorted_regardless_of_arrival_order() {
        let mut monitor = AggregatingMonitor::default();
        monitor.update(line("c", 0));
        monitor.update(line("a", 0));
        let flushed = monitor.update(line("b", 0));
        assert_eq!(hosts(&flushed), vec!["a", "b", "c"]);
    }

    #[test]
    fn keeps_only_the_latest_line_per_node() {
        let mut monitor = AggregatingMonitor::default();
        monitor.update(line("a", 1));
        monitor.update(line("b", 1));
        let flushed = monitor.update(line("a", 2));

        assert_eq!(monitor.len(), 2);
        assert_eq!(flushed[0].time, line("a", 2).time);
        assert_eq!(flushed[1].time, line("b", 1).time);
    }

    #[test]
    fn error_line_replaces_previous_numbers() {
        let mut monitor = AggregatingMonitor::default();
        monitor.update(line("a", 1));
        let failed = StatLine::failed(&NodeAddress::new("a", 27017), StatError::Stale, snapshot_at(2).taken_at);
        let flushed = monitor.update(failed.clone());
        assert_eq!(flushed, vec![failed]);
    }
}
