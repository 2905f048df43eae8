use super::{
    LineFormatter,
    DEFAULT_HEADER_INTERVAL,
};
use crate::{
    snapshot::Unit,
    FleetError,
    Metric,
    StatField,
    StatLine,
};
use std::fmt::Write as _;
use strum::IntoEnumIterator as _;

const HOST_WIDTH: usize = 21;
const FIELD_WIDTH: usize = 7;
const SET_WIDTH: usize = 8;
const ROLE_WIDTH: usize = 4;
const TIME_WIDTH: usize = 8;

const UNAVAILABLE: &str = "*";

/// Fixed-width, right-aligned table rows. A header opens the first block
/// and every later block written once `header_interval` rows have gone by
/// since the last header. A block is never split by a header.
#[derive(Debug, Clone)]
pub struct GridLineFormatter {
    headers: bool,
    header_interval: usize,
    /// Rows written since the last header; `None` until the first one.
    rows_since_header: Option<usize>,
}

impl Default for GridLineFormatter {
    fn default() -> Self {
        Self::new(true, DEFAULT_HEADER_INTERVAL)
    }
}

impl GridLineFormatter {
    pub fn new(headers: bool, header_interval: usize) -> Self {
        Self {
            headers,
            header_interval: header_interval.max(1),
            rows_since_header: None,
        }
    }

    fn header(out: &mut String) {
        let _ = write!(out, "{:>HOST_WIDTH$}", "host");
        for field in StatField::iter() {
            let _ = write!(out, " {:>width$}", field.name(), width = field_width(field));
        }
        let _ = writeln!(
            out,
            " {:>SET_WIDTH$} {:>ROLE_WIDTH$} {:>TIME_WIDTH$}",
            "set", "repl", "time"
        );
    }

    fn row(out: &mut String, line: &StatLine) {
        let _ = write!(out, "{:>HOST_WIDTH$}", line.host.to_string());
        if let Some(error) = &line.error {
            let _ = writeln!(out, " {error}");
            return;
        }

        for field in StatField::iter() {
            let value = render_metric(field, line.metric(field));
            let _ = write!(out, " {value:>width$}", width = field_width(field));
        }
        let set = line.replica_set.as_deref().unwrap_or("");
        let role = line.role.map(|role| role.to_string()).unwrap_or_default();
        let time = line.time.format("%H:%M:%S").to_string();
        let _ = writeln!(out, " {set:>SET_WIDTH$} {role:>ROLE_WIDTH$} {time:>TIME_WIDTH$}");
    }
}

impl LineFormatter for GridLineFormatter {
    fn format(&mut self, lines: &[StatLine]) -> Result<String, FleetError> {
        let mut out = String::new();
        if lines.is_empty() {
            return Ok(out);
        }

        let due = self
            .rows_since_header
            .map_or(true, |rows| rows >= self.header_interval);
        if self.headers && due {
            Self::header(&mut out);
            self.rows_since_header = Some(0);
        }
        for line in lines {
            Self::row(&mut out, line);
        }
        self.rows_since_header = Some(self.rows_since_header.unwrap_or(0) + lines.len());
        Ok(out)
    }
}

fn field_width(field: StatField) -> usize {
    field.name().len().max(FIELD_WIDTH)
}

fn render_metric(field: StatField, metric: Metric) -> String {
    match (metric, field.unit()) {
        (Metric::Unavailable, _) => UNAVAILABLE.to_string(),
        (Metric::Absolute(value), Unit::Bytes) => format_bytes(value as f64),
        (Metric::Absolute(value), Unit::Count) => value.to_string(),
        (Metric::Rate(value), Unit::Bytes) => format_bytes(value),
        (Metric::Rate(value), Unit::Count) => format_rate(value),
    }
}

/// Whole rates print as integers, others with one decimal.
fn format_rate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["k", "M", "G", "T"];

    if bytes < 1024.0 {
        return format!("{bytes:.0}b");
    }
    let mut value = bytes / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cluster::{
            AggregatingMonitor,
            ClusterMonitor as _,
        },
        snapshot::NodeRole,
        testing::{
            at,
            snapshot_at,
        },
        NodeAddress,
        StatError,
    };
    use pretty_assertions::assert_eq;

    fn line(host: &str) -> StatLine {
        let before = snapshot_at(0).with(StatField::Insert, 10);
        let mut after = snapshot_at(2)
            .with(StatField::Insert, 15)
            .with(StatField::Res, 3 * 1024 * 1024)
            .with(StatField::Conn, 42);
        after.replica_set = Some("rs0".into());
        after.role = Some(NodeRole::Primary);
        StatLine::from_snapshots(&NodeAddress::new(host, 27017), Some(&before), &after)
    }

    fn header_count(text: &str) -> usize {
        text.lines().filter(|row| row.trim_start().starts_with("host")).count()
    }

    #[test]
    fn header_repeats_every_interval_across_flushes() {
        let mut formatter = GridLineFormatter::new(true, 3);
        let mut out = String::new();
        out.push_str(&formatter.format(&[line("a"), line("b")]).unwrap());
        for _ in 0..5 {
            out.push_str(&formatter.format(&[line("a")]).unwrap());
        }

        assert_eq!(out.lines().count(), 7 + 3);
        assert_eq!(header_count(&out), 3);
        let header_rows = out
            .lines()
            .enumerate()
            .filter(|(_, row)| row.trim_start().starts_with("host"))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        assert_eq!(header_rows, vec![0, 4, 8]);
    }

    #[test]
    fn single_line_flushes_get_a_header_before_rows_one_four_and_seven() {
        let mut formatter = GridLineFormatter::new(true, 3);
        let out = (0..7)
            .map(|_| formatter.format(&[line("a")]).unwrap())
            .collect::<String>();

        let header_rows = out
            .lines()
            .enumerate()
            .filter(|(_, row)| row.trim_start().starts_with("host"))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        // Data rows 1, 4 and 7 sit at output lines 1, 5 and 9.
        assert_eq!(header_rows, vec![0, 4, 8]);
        assert_eq!(out.lines().count(), 10);
    }

    #[test]
    fn merged_fleet_blocks_are_never_split_by_a_header() {
        let mut cluster = AggregatingMonitor::default();
        let mut formatter = GridLineFormatter::new(true, 10);
        let mut headers = 0;

        for _tick in 0..4 {
            for host in ["a", "b", "c"] {
                let block = formatter.format(&cluster.update(line(host))).unwrap();
                let rows = block.lines().collect::<Vec<_>>();
                let block_headers = rows.iter().filter(|row| row.trim_start().starts_with("host")).count();
                if block_headers > 0 {
                    assert_eq!(block_headers, 1);
                    assert!(rows[0].trim_start().starts_with("host"), "header not at block start:\n{block}");
                }
                headers += block_headers;
            }
        }

        // Blocks of 1, 2, 3, 3, ... rows: headers open blocks 1, 6 and 10.
        assert_eq!(headers, 3);
    }

    #[test]
    fn headers_can_be_disabled() {
        let mut formatter = GridLineFormatter::new(false, 1);
        let out = formatter.format(&[line("a"), line("b")]).unwrap();
        assert_eq!(header_count(&out), 0);
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn renders_values_units_and_unavailable_marker() {
        let mut formatter = GridLineFormatter::new(false, 10);
        let out = formatter.format(&[line("db1")]).unwrap();
        let cells = out.split_whitespace().collect::<Vec<_>>();

        assert_eq!(cells[0], "db1:27017");
        // insert went from 10 to 15 in two seconds.
        assert_eq!(cells[1], "2.5");
        // query has no readings.
        assert_eq!(cells[2], "*");
        assert!(cells.contains(&"3.0M"));
        assert!(cells.contains(&"42"));
        assert_eq!(&cells[cells.len() - 3..], &["rs0", "PRI", "22:13:22"]);
    }

    #[test]
    fn error_rows_show_host_and_error() {
        let failed = StatLine::failed(
            &NodeAddress::new("db2", 27018),
            StatError::Unreachable("connection refused".into()),
            at(0),
        );
        let mut formatter = GridLineFormatter::new(false, 10);
        assert_eq!(
            formatter.format(&[failed]).unwrap().trim(),
            "db2:27018 unreachable: connection refused"
        );
    }

    #[test]
    fn columns_line_up_with_header() {
        let mut formatter = GridLineFormatter::new(true, 10);
        let out = formatter.format(&[line("a")]).unwrap();
        let rows = out.lines().collect::<Vec<_>>();
        assert_eq!(rows[0].len(), rows[1].len());
    }

    #[test]
    fn identical_input_renders_identically() {
        let lines = [line("a"), line("b")];
        let first = GridLineFormatter::new(true, 10).format(&lines).unwrap();
        let second = GridLineFormatter::new(true, 10).format(&lines).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn byte_units() {
        assert_eq!(format_bytes(512.0), "512b");
        assert_eq!(format_bytes(2048.0), "2.0k");
        assert_eq!(format_bytes(1.5 * 1024.0 * 1024.0 * 1024.0), "1.5G");
        assert_eq!(format_bytes(3.0 * 1024f64.powi(5)), "3072.0T");
        assert_eq!(format_rate(50.0), "50");
        assert_eq!(format_rate(1.0 / 3.0), "0.3");
    }
}
