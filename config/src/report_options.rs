use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
};

/// Shape of the records written to the output sink.
#[derive(Debug, Default, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width columns with a periodically repeated header.
    #[default]
    Grid,
    /// One JSON object per node and tick.
    Json,
}

/// Whether lines from different nodes are merged into one view per update.
#[derive(Debug, Default, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MergeMode {
    /// Merge when discovering or when more than one seed host is given.
    #[default]
    Auto,
    Always,
    Never,
}

impl MergeMode {
    pub fn aggregates(self, discover: bool, seed_count: usize) -> bool {
        match self {
            MergeMode::Auto => discover || seed_count > 1,
            MergeMode::Always => true,
            MergeMode::Never => false,
        }
    }
}
