#[macro_use]
extern crate tracing;

mod logging;

use color_eyre::Result;
use eyre::Context as _;
pub use fleetstat_config::{
    Args,
    Config,
};
use fleetstat_monitor::{
    cluster,
    format,
    HttpNodeSource,
    NodeAddress,
    Orchestrator,
    ReportLoop,
};
pub use logging::init_logging;
use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
    sync::Arc,
};

pub fn init_errors() -> Result<()> {
    color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .install()
}

/// Monitors the configured fleet until interrupted, the row limit is
/// reached or the report can no longer be written.
pub async fn run(config: Config) -> Result<()> {
    let seeds = config
        .seed_hosts()
        .iter()
        .map(|host| NodeAddress::parse_with_default_port(host, config.default_port))
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("Invalid seed host")?;

    let source = Arc::new(HttpNodeSource::new(
        config.scheme.clone(),
        config.timeout(),
        config.default_port,
    )?);
    let sink = open_sink(config.output.as_deref())?;

    let aggregate = config.aggregates();
    let report = ReportLoop::new(
        cluster::select(aggregate),
        format::from_config(&config),
        sink,
        config.row_count,
    );

    let mut orchestrator = Orchestrator::new(source.clone(), config.interval());
    if config.discover {
        orchestrator = orchestrator.with_discovery(source);
    }

    info!(
        seeds = seeds.len(),
        discover = config.discover,
        aggregate,
        format = %config.format,
        "starting fleet monitor"
    );
    orchestrator.run(seeds, report, shutdown_signal()).await?;
    Ok(())
}

/// Stdout, or `path` opened for appending.
fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    match path {
        None => Ok(Box::new(std::io::stdout())),
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("Failed to open output file {}", path.display()))?;
            Ok(Box::new(file))
        }
    }
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to register SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
