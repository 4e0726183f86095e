use anyhow::Context;
use argh::FromArgs;
use tessera_storage::IndexReader;

use crate::{
    cli::OutputFormat,
    output::{helpers::output, info::EventsInfo},
};

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "get-events")]
/// Get the events recorded at a height
pub(crate) struct GetEventsArgs {
    /// block height
    #[argh(positional)]
    pub(crate) height: u64,

    /// restrict to one event type
    #[argh(option, short = 't')]
    pub(crate) event_type: Option<String>,

    /// output format: "json" or "porcelain"
    #[argh(option, short = 'o', default = "OutputFormat::Porcelain")]
    pub(crate) output_format: OutputFormat,
}

/// Show a height's events, optionally filtered by type.
pub(crate) fn get_events(reader: &IndexReader, args: GetEventsArgs) -> anyhow::Result<()> {
    let types: Vec<String> = args.event_type.iter().cloned().collect();
    let events = reader
        .events_by_height(args.height, &types)
        .with_context(|| format!("height {} not indexed", args.height))?;

    let info = EventsInfo {
        height: args.height,
        events: &events,
    };
    output(&info, args.output_format)
}
