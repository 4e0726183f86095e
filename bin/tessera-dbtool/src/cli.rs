use std::{path::PathBuf, str::FromStr};

use argh::FromArgs;

use crate::cmd::{
    block::GetBlockArgs, collection::GetCollectionArgs, events::GetEventsArgs,
    height::GetHeightArgs, register::GetRegisterArgs, summary::GetSummaryArgs,
    transaction::GetTransactionArgs,
};

/// Tessera DB tool – offline index inspection utility.
#[derive(FromArgs)]
/// Inspect an archive node's index database while the node is offline.
pub(crate) struct Cli {
    /// index database directory (same as `--index-dir` used by the node).
    #[argh(option, short = 'd', default = "PathBuf::from(\"data/index\")")]
    pub(crate) index_dir: PathBuf,

    #[argh(subcommand)]
    pub(crate) cmd: Command,
}

/// Subcommand variants.
#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub(crate) enum Command {
    GetSummary(GetSummaryArgs),
    GetBlock(GetBlockArgs),
    GetHeight(GetHeightArgs),
    GetTransaction(GetTransactionArgs),
    GetCollection(GetCollectionArgs),
    GetEvents(GetEventsArgs),
    GetRegister(GetRegisterArgs),
}

/// Output format
#[derive(PartialEq, Eq, Debug, Clone)]
pub(crate) enum OutputFormat {
    /// Machine-readable, concise format (default)
    Porcelain,
    /// Structured JSON
    Json,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct UnsupportedOutputFormat;

impl std::fmt::Display for UnsupportedOutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "must be 'porcelain' or 'json'")
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedOutputFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "porcelain" | "default" => Ok(Self::Porcelain),
            "json" => Ok(Self::Json),
            _ => Err(UnsupportedOutputFormat),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OutputFormat::Porcelain => "porcelain",
            OutputFormat::Json => "json",
        })
    }
}
