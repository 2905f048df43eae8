#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod report_options;

pub use app_config::{
    get_config_dir,
    AppConfig,
};
pub use args::Args;
use color_eyre::Result;
use eyre::{
    ensure,
    Context as _,
};
pub use report_options::{
    MergeMode,
    MergeModeIter,
    OutputFormat,
    OutputFormatIter,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    path::PathBuf,
    time::Duration,
};

/// Settings shared by every part of a run. Built from the embedded defaults,
/// the optional `config.yaml` and finally the command line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub default_port: u16,
    pub interval_secs: u64,
    #[serde(default)]
    pub discover: bool,
    #[serde(default)]
    pub no_headers: bool,
    pub header_interval: usize,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub merge: MergeMode,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub timeout_secs: u64,
    pub scheme: String,
    #[serde(default)]
    pub verbose: u8,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        builder = match &args.config {
            Some(path) => builder.add_source(config::File::from(path.clone()).format(config::FileFormat::Yaml)),
            None => builder.add_source(
                config::File::from(config_dir.join("config.yaml"))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            ),
        };

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;

        Ok(cfg)
    }

    /// Builds and validates the configuration for `args`.
    #[instrument(level = "debug", skip_all)]
    pub fn load(args: Args) -> Result<Self> {
        let config = Self::new(args).context("Failed to load configuration")?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.hosts.is_empty(), "at least one seed host is required");
        ensure!(
            self.hosts.iter().all(|host| !host.trim().is_empty()),
            "seed hosts must not be empty"
        );
        ensure!(self.interval_secs >= 1, "sleep interval must be at least 1 second");
        ensure!(self.header_interval >= 1, "header interval must be at least 1 row");
        ensure!(self.timeout_secs >= 1, "request timeout must be at least 1 second");
        Ok(())
    }

    /// Seed hosts with the `port` override applied, as given to the address parser.
    pub fn seed_hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| host.trim())
            .map(|host| match self.port {
                Some(port) => format!("{}:{port}", strip_port(host)),
                None => host.to_string(),
            })
            .collect()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn aggregates(&self) -> bool {
        self.merge.aggregates(self.discover, self.hosts.len())
    }

    pub fn print_headers(&self) -> bool {
        !self.no_headers
    }
}

/// Drops an explicit port from `host`, keeping bracketed IPv6 literals intact.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &host[..end + 2],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, _)) if !name.contains(':') => name,
        _ => host,
    }
}
