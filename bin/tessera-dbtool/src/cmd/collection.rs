use anyhow::Context;
use argh::FromArgs;
use tessera_primitives::CollectionId;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    cmd::parse_id,
    output::{helpers::output, info::CollectionInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-collection")]
/// Get a light collection
pub(crate) struct GetCollectionArgs {
    /// collection ID (hex)
    #[argh(positional)]
    pub(crate) collection_id: String,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Show the transaction IDs a collection guarantees.
pub(crate) fn get_collection(reader: &IndexReader, args: GetCollectionArgs) -> anyhow::Result<()> {
    let collection_id: CollectionId = parse_id(&args.collection_id)?;
    let collection = reader
        .collection(&collection_id)
        .with_context(|| format!("collection {collection_id} not indexed"))?;

    let info = CollectionInfo {
        id: &collection.id,
        transaction_ids: &collection.transaction_ids,
    };
    output(&info, args.output_format)
}
