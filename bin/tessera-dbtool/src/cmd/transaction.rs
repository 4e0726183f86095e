use anyhow::Context;
use argh::FromArgs;
use tessera_primitives::TxId;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    cmd::parse_id,
    output::{helpers::output, info::TransactionInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-transaction")]
/// Get a transaction body and its result
pub(crate) struct GetTransactionArgs {
    /// transaction ID (hex)
    #[argh(positional)]
    pub(crate) tx_id: String,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Show one transaction, where it executed, and how it ended.
pub(crate) fn get_transaction(reader: &IndexReader, args: GetTransactionArgs) -> anyhow::Result<()> {
    let tx_id: TxId = parse_id(&args.tx_id)?;
    let transaction = reader
        .transaction(&tx_id)
        .with_context(|| format!("transaction {tx_id} not indexed"))?;
    let height = reader
        .height_for_transaction(&tx_id)
        .with_context(|| format!("transaction {tx_id} has no height index"))?;
    let result = reader.result(&tx_id).ok();

    let info = TransactionInfo {
        height,
        transaction: &transaction,
        result: result.as_ref(),
    };
    output(&info, args.output_format)
}
