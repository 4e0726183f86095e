use anyhow::Context;
use argh::FromArgs;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    output::{helpers::output, info::SummaryInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-summary")]
/// Get the indexed height range
pub(crate) struct GetSummaryArgs {
    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Show the index's height range.
pub(crate) fn get_summary(reader: &IndexReader, args: GetSummaryArgs) -> anyhow::Result<()> {
    let first = reader.first().context("index has no first marker")?;
    let last = reader.last().context("index has no last marker")?;

    let summary = SummaryInfo {
        first,
        last,
        indexed_heights: last - first + 1,
    };
    output(&summary, args.output_format)
}
