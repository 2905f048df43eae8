//! Rendering of stat lines into output records.

use crate::{
    FleetError,
    StatLine,
};
use fleetstat_config::{
    Config,
    OutputFormat,
};

mod grid;
mod json;

pub use grid::GridLineFormatter;
pub use json::JsonLineFormatter;

/// Header repetition used when none is configured.
pub const DEFAULT_HEADER_INTERVAL: usize = 10;

/// Turns the lines of one flush into text. The result is made of complete,
/// newline-terminated records and may be empty. A formatting failure ends
/// the run.
pub trait LineFormatter: Send {
    fn format(&mut self, lines: &[StatLine]) -> Result<String, FleetError>;
}

pub fn from_config(config: &Config) -> Box<dyn LineFormatter> {
    match config.format {
        OutputFormat::Grid => Box::new(GridLineFormatter::new(config.print_headers(), config.header_interval)),
        OutputFormat::Json => Box::new(JsonLineFormatter),
    }
}
