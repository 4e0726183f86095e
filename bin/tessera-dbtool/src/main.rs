//! Binary entry-point for the offline index inspection tool.

mod cli;
mod cmd;
mod output;

use std::{process::exit, sync::Arc};

use tessera_db::IndexDb;
use tessera_storage::IndexReader;
use tracing_subscriber::fmt::init;

use crate::{
    cli::{Cli, Command},
    cmd::{
        block::get_block, collection::get_collection, events::get_events, height::get_height,
        register::get_register, summary::get_summary, transaction::get_transaction,
    },
};

fn main() {
    init();

    let cli: Cli = argh::from_env();

    let db = match IndexDb::open(&cli.index_dir) {
        Ok(db) => Arc::new(db),
        Err(err) => {
            eprintln!("failed to open index at {}: {err}", cli.index_dir.display());
            exit(1);
        }
    };
    let reader = IndexReader::new(db.clone());

    let result = match cli.cmd {
        Command::GetSummary(args) => get_summary(&reader, args),
        Command::GetBlock(args) => get_block(&db, &reader, args),
        Command::GetHeight(args) => get_height(&reader, args),
        Command::GetTransaction(args) => get_transaction(&reader, args),
        Command::GetCollection(args) => get_collection(&reader, args),
        Command::GetEvents(args) => get_events(&reader, args),
        Command::GetRegister(args) => get_register(&reader, args),
    };

    if let Err(err) = result {
        eprintln!("{err:#}");
        exit(1);
    }
}
