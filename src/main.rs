use clap::Parser;
use color_eyre::Result;
use fleetstat::{
    init_errors,
    init_logging,
    Args,
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let config = Config::load(Args::parse())?;
    init_logging(config.verbose)?;
    fleetstat::run(config).await
}
