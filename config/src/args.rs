use crate::{
    MergeMode,
    OutputFormat,
};
use clap::{
    ArgAction,
    Parser,
};
use std::path::PathBuf;

/// Live statistics for a fleet of database server nodes.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Seconds to wait between two polls of the same node.
    #[arg(value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Comma separated seed hosts: `host`, `host:port` or `[ipv6]:port`.
    #[arg(long = "host", value_name = "HOSTS", value_delimiter = ',', env = "FLEETSTAT_HOST")]
    pub hosts: Vec<String>,

    /// Port appended to every seed host, overriding any port given there.
    #[arg(long, value_name = "PORT", env = "FLEETSTAT_PORT")]
    pub port: Option<u16>,

    /// Ask the monitored nodes for the rest of the fleet and monitor it too.
    #[arg(long, action)]
    pub discover: bool,

    /// Do not print the column header in grid output.
    #[arg(long = "noheaders", action)]
    pub no_headers: bool,

    /// Number of data rows between two header lines.
    #[arg(long, value_name = "ROWS")]
    pub header_interval: Option<usize>,

    /// Print one JSON document per node and tick instead of the grid.
    #[arg(long, action)]
    pub json: bool,

    /// Merge the latest line of every node into each update (auto, always, never).
    #[arg(long, value_name = "MODE")]
    pub merge: Option<MergeMode>,

    /// Stop after printing this many updates (0 runs until interrupted).
    #[arg(short = 'n', long = "rowcount", value_name = "COUNT")]
    pub row_count: Option<u64>,

    /// Append the report to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Seconds before a single snapshot or membership request is abandoned.
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// URL scheme used to reach the node agents.
    #[arg(long, value_name = "SCHEME")]
    pub scheme: Option<String>,

    /// Configuration file to use instead of `config.yaml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(interval) = self.interval {
                cache.insert("interval_secs".to_string(), interval.into());
            }
            if !self.hosts.is_empty() {
                cache.insert("hosts".to_string(), self.hosts.clone().into());
            }
            if let Some(port) = self.port {
                cache.insert("port".to_string(), (port as u64).into());
            }
            if self.discover {
                cache.insert("discover".to_string(), true.into());
            }
            if self.no_headers {
                cache.insert("no_headers".to_string(), true.into());
            }
            if let Some(header_interval) = self.header_interval {
                cache.insert("header_interval".to_string(), (header_interval as u64).into());
            }
            if self.json {
                cache.insert("format".to_string(), OutputFormat::Json.to_string().into());
            }
            if let Some(merge) = self.merge {
                cache.insert("merge".to_string(), merge.to_string().into());
            }
            if let Some(row_count) = self.row_count {
                cache.insert("row_count".to_string(), row_count.into());
            }
            if let Some(output) = &self.output {
                cache.insert("output".to_string(), output.display().to_string().into());
            }
            if let Some(timeout) = self.timeout_secs {
                cache.insert("timeout_secs".to_string(), timeout.into());
            }
            if let Some(scheme) = &self.scheme {
                cache.insert("scheme".to_string(), scheme.clone().into());
            }
            if self.verbose > 0 {
                cache.insert("verbose".to_string(), (self.verbose as u64).into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let version = clap::crate_version!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "\
{version}

Config directory: {config_dir_path}"
    )
}
