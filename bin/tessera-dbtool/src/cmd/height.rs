use anyhow::Context;
use argh::FromArgs;
use tessera_primitives::BlockId;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    cmd::parse_id,
    output::{helpers::output, info::HeightInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-height")]
/// Resolve a block ID to its height
pub(crate) struct GetHeightArgs {
    /// block ID (hex)
    #[argh(positional)]
    pub(crate) block_id: String,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Show the height a block was indexed at.
pub(crate) fn get_height(reader: &IndexReader, args: GetHeightArgs) -> anyhow::Result<()> {
    let block_id: BlockId = parse_id(&args.block_id)?;
    let height = reader
        .height_for_block(&block_id)
        .with_context(|| format!("block {block_id} not indexed"))?;

    let info = HeightInfo { block_id, height };
    output(&info, args.output_format)
}
