use anyhow::Context;
use argh::FromArgs;
use tessera_primitives::RegisterPath;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    cmd::parse_id,
    output::{helpers::output, info::RegisterInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-register")]
/// Get a register value at a height
pub(crate) struct GetRegisterArgs {
    /// register path (hex)
    #[argh(positional)]
    pub(crate) path: String,

    /// height to resolve at (defaults to the last indexed height)
    #[argh(option)]
    pub(crate) height: Option<u64>,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Resolve one register's newest value at or below a height.
pub(crate) fn get_register(reader: &IndexReader, args: GetRegisterArgs) -> anyhow::Result<()> {
    let path: RegisterPath = parse_id(&args.path)?;
    let height = match args.height {
        Some(height) => height,
        None => reader.last().context("index has no last marker")?,
    };
    let values = reader
        .values_by_height(std::slice::from_ref(&path), height)
        .with_context(|| format!("register {path} has no value at or below height {height}"))?;

    let info = RegisterInfo {
        path: path.to_string(),
        height,
        payload: hex::encode(&values[0]),
    };
    output(&info, args.output_format)
}
