//! Display structs for the inspected index entries.

use serde::Serialize;
use tessera_primitives::{
    BlockId, CollectionId, Event, Header, SealId, StateCommitment, Transaction,
    TransactionResult, TxId,
};

use super::{helpers::porcelain_field, traits::Formattable};

/// Overall shape of the index.
#[derive(Serialize)]
pub(crate) struct SummaryInfo {
    pub first: u64,
    pub last: u64,
    pub indexed_heights: u64,
}

impl Formattable for SummaryInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("summary.first", self.first),
            porcelain_field("summary.last", self.last),
            porcelain_field("summary.indexed_heights", self.indexed_heights),
        ]
        .join("\n")
    }
}

/// One indexed block.
#[derive(Serialize)]
pub(crate) struct BlockInfo<'a> {
    pub height: u64,
    pub header: &'a Header,
    pub commit: &'a StateCommitment,
    pub seal_ids: &'a [SealId],
    pub collection_ids: &'a [CollectionId],
    pub transaction_ids: &'a [TxId],
}

impl Formattable for BlockInfo<'_> {
    fn format_porcelain(&self) -> String {
        let mut output = vec![
            porcelain_field("block.height", self.height),
            porcelain_field("block.chain_id", &self.header.chain_id),
            porcelain_field("block.parent_id", self.header.parent_id),
            porcelain_field("block.timestamp_ms", self.header.timestamp_ms),
            porcelain_field("block.commit", self.commit),
            porcelain_field("block.seals", self.seal_ids.len()),
            porcelain_field("block.collections", self.collection_ids.len()),
            porcelain_field("block.transactions", self.transaction_ids.len()),
        ];
        for seal_id in self.seal_ids {
            output.push(porcelain_field("block.seal_id", seal_id));
        }
        for collection_id in self.collection_ids {
            output.push(porcelain_field("block.collection_id", collection_id));
        }
        output.join("\n")
    }
}

/// A transaction body, its height, and its result if present.
#[derive(Serialize)]
pub(crate) struct TransactionInfo<'a> {
    pub height: u64,
    pub transaction: &'a Transaction,
    pub result: Option<&'a TransactionResult>,
}

impl Formattable for TransactionInfo<'_> {
    fn format_porcelain(&self) -> String {
        let mut output = vec![
            porcelain_field("transaction.id", self.transaction.id),
            porcelain_field("transaction.height", self.height),
            porcelain_field(
                "transaction.reference_block_id",
                self.transaction.reference_block_id,
            ),
            porcelain_field("transaction.gas_limit", self.transaction.gas_limit),
            porcelain_field("transaction.payer", hex::encode(&self.transaction.payer)),
            porcelain_field("transaction.script_bytes", self.transaction.script.len()),
        ];
        match self.result {
            Some(result) if result.succeeded() => {
                output.push(porcelain_field("transaction.status", "sealed"));
            }
            Some(result) => {
                output.push(porcelain_field("transaction.status", "failed"));
                output.push(porcelain_field("transaction.error", &result.error_message));
            }
            None => output.push(porcelain_field("transaction.status", "unknown")),
        }
        output.join("\n")
    }
}

/// A light collection.
#[derive(Serialize)]
pub(crate) struct CollectionInfo<'a> {
    pub id: &'a CollectionId,
    pub transaction_ids: &'a [TxId],
}

impl Formattable for CollectionInfo<'_> {
    fn format_porcelain(&self) -> String {
        let mut output = vec![
            porcelain_field("collection.id", self.id),
            porcelain_field("collection.transactions", self.transaction_ids.len()),
        ];
        for tx_id in self.transaction_ids {
            output.push(porcelain_field("collection.transaction_id", tx_id));
        }
        output.join("\n")
    }
}

/// Events recorded at one height.
#[derive(Serialize)]
pub(crate) struct EventsInfo<'a> {
    pub height: u64,
    pub events: &'a [Event],
}

impl Formattable for EventsInfo<'_> {
    fn format_porcelain(&self) -> String {
        let mut output = vec![
            porcelain_field("events.height", self.height),
            porcelain_field("events.count", self.events.len()),
        ];
        for event in self.events {
            output.push(porcelain_field(
                "events.event",
                format!(
                    "{} tx={} idx={} payload={}B",
                    event.event_type,
                    event.tx_index,
                    event.event_index,
                    event.payload.len()
                ),
            ));
        }
        output.join("\n")
    }
}

/// A register value resolved at a height.
#[derive(Serialize)]
pub(crate) struct RegisterInfo {
    pub path: String,
    pub height: u64,
    pub payload: String,
}

impl Formattable for RegisterInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("register.path", &self.path),
            porcelain_field("register.height", self.height),
            porcelain_field("register.payload", &self.payload),
        ]
        .join("\n")
    }
}

/// Identifier of the block a lookup resolved through.
#[derive(Serialize)]
pub(crate) struct HeightInfo {
    pub block_id: BlockId,
    pub height: u64,
}

impl Formattable for HeightInfo {
    fn format_porcelain(&self) -> String {
        [
            porcelain_field("height.block_id", self.block_id),
            porcelain_field("height.height", self.height),
        ]
        .join("\n")
    }
}
