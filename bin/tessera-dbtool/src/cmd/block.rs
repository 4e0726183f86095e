use anyhow::Context;
use argh::FromArgs;
use tessera_db::IndexDb;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    output::{helpers::output, info::BlockInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-block")]
/// Get an indexed block's artifacts
pub(crate) struct GetBlockArgs {
    /// block height
    #[argh(positional)]
    pub(crate) height: u64,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Show the header, commit, and artifact lists of one height.
pub(crate) fn get_block(
    db: &IndexDb,
    reader: &IndexReader,
    args: GetBlockArgs,
) -> anyhow::Result<()> {
    let height = args.height;
    let header = reader
        .header_by_height(height)
        .with_context(|| format!("no header at height {height}"))?;
    let commit = reader
        .commit_by_height(height)
        .with_context(|| format!("no commit at height {height}"))?;
    let seal_ids = db.seals_at_height(height)?.unwrap_or_default();
    let collection_ids = db.collections_at_height(height)?.unwrap_or_default();
    let transaction_ids = db.transactions_at_height(height)?.unwrap_or_default();

    let info = BlockInfo {
        height,
        header: &header,
        commit: &commit,
        seal_ids: &seal_ids,
        collection_ids: &collection_ids,
        transaction_ids: &transaction_ids,
    };
    output(&info, args.output_format)
}
