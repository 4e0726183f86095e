use std::collections::BTreeMap;

use tessera_codec::encode;
use tessera_primitives::{
    BlockId, CollectionGuarantee, CollectionId, Event, Header, Height, LightCollection,
    RegisterPath, Seal, SealId, StateCommitment, Transaction, TransactionResult, TxId,
};

use crate::{
    error::DbResult,
    keys::{event_key, height_key, id_key, marker_key, register_key, KeySpace},
};

/// A staged set of index and register mutations, applied atomically
/// per tree.
///
/// The `last` marker is staged separately and emitted after every other
/// index key, so a batch that both indexes a height and forwards `last`
/// cannot expose the marker before the artifacts it covers.
#[derive(Debug, Default)]
pub struct IndexBatch {
    index: Vec<(Vec<u8>, Vec<u8>)>,
    registers: Vec<(Vec<u8>, Vec<u8>)>,
    last: Option<Vec<u8>>,
    first: Option<Vec<u8>>,
}

impl IndexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
            && self.registers.is_empty()
            && self.last.is_none()
            && self.first.is_none()
    }

    /// Number of staged mutations.
    pub fn len(&self) -> usize {
        self.index.len()
            + self.registers.len()
            + usize::from(self.last.is_some())
            + usize::from(self.first.is_some())
    }

    pub fn put_first(&mut self, height: Height) -> DbResult<()> {
        self.first = Some(encode(&height)?);
        Ok(())
    }

    pub fn put_last(&mut self, height: Height) -> DbResult<()> {
        self.last = Some(encode(&height)?);
        Ok(())
    }

    pub fn put_height_for_block(&mut self, block_id: &BlockId, height: Height) -> DbResult<()> {
        self.index.push((
            id_key(KeySpace::HeightByBlock, block_id.as_slice()),
            encode(&height)?,
        ));
        Ok(())
    }

    pub fn put_height_for_tx(&mut self, tx_id: &TxId, height: Height) -> DbResult<()> {
        self.index.push((
            id_key(KeySpace::HeightByTx, tx_id.as_slice()),
            encode(&height)?,
        ));
        Ok(())
    }

    pub fn put_commit(&mut self, height: Height, commit: &StateCommitment) -> DbResult<()> {
        self.index
            .push((height_key(KeySpace::Commit, height).to_vec(), encode(commit)?));
        Ok(())
    }

    pub fn put_header(&mut self, height: Height, header: &Header) -> DbResult<()> {
        self.index
            .push((height_key(KeySpace::Header, height).to_vec(), encode(header)?));
        Ok(())
    }

    /// Stages a height's events, grouped per type so readers can filter
    /// with point lookups and scan types in order.
    pub fn put_events(&mut self, height: Height, events: &[Event]) -> DbResult<()> {
        let mut by_type: BTreeMap<&str, Vec<Event>> = BTreeMap::new();
        for event in events {
            by_type
                .entry(event.event_type.as_str())
                .or_default()
                .push(event.clone());
        }
        for (event_type, mut group) in by_type {
            group.sort_by_key(|event| (event.tx_index, event.event_index));
            self.index
                .push((event_key(height, event_type), encode(&group)?));
        }
        Ok(())
    }

    pub fn put_seals_at_height(&mut self, height: Height, seal_ids: &Vec<SealId>) -> DbResult<()> {
        self.index.push((
            height_key(KeySpace::SealsAtHeight, height).to_vec(),
            encode(seal_ids)?,
        ));
        Ok(())
    }

    pub fn put_collections_at_height(
        &mut self,
        height: Height,
        collection_ids: &Vec<CollectionId>,
    ) -> DbResult<()> {
        self.index.push((
            height_key(KeySpace::CollectionsAtHeight, height).to_vec(),
            encode(collection_ids)?,
        ));
        Ok(())
    }

    pub fn put_transactions_at_height(
        &mut self,
        height: Height,
        tx_ids: &Vec<TxId>,
    ) -> DbResult<()> {
        self.index.push((
            height_key(KeySpace::TransactionsAtHeight, height).to_vec(),
            encode(tx_ids)?,
        ));
        Ok(())
    }

    pub fn put_results_at_height(&mut self, height: Height, tx_ids: &Vec<TxId>) -> DbResult<()> {
        self.index.push((
            height_key(KeySpace::ResultsAtHeight, height).to_vec(),
            encode(tx_ids)?,
        ));
        Ok(())
    }

    pub fn put_guarantee(&mut self, guarantee: &CollectionGuarantee) -> DbResult<()> {
        self.index.push((
            id_key(KeySpace::Guarantee, guarantee.collection_id.as_slice()),
            encode(guarantee)?,
        ));
        Ok(())
    }

    pub fn put_transaction(&mut self, transaction: &Transaction) -> DbResult<()> {
        self.index.push((
            id_key(KeySpace::Transaction, transaction.id.as_slice()),
            encode(transaction)?,
        ));
        Ok(())
    }

    pub fn put_result(&mut self, result: &TransactionResult) -> DbResult<()> {
        self.index.push((
            id_key(KeySpace::Result, result.tx_id.as_slice()),
            encode(result)?,
        ));
        Ok(())
    }

    pub fn put_seal(&mut self, seal: &Seal) -> DbResult<()> {
        self.index
            .push((id_key(KeySpace::Seal, seal.id.as_slice()), encode(seal)?));
        Ok(())
    }

    pub fn put_collection(&mut self, collection: &LightCollection) -> DbResult<()> {
        self.index.push((
            id_key(KeySpace::Collection, collection.id.as_slice()),
            encode(collection)?,
        ));
        Ok(())
    }

    /// Stages one register version at `(path, height)`.
    pub fn put_register(
        &mut self,
        path: &RegisterPath,
        height: Height,
        payload: &Vec<u8>,
    ) -> DbResult<()> {
        self.registers
            .push((register_key(path, height).to_vec(), encode(payload)?));
        Ok(())
    }

    /// Splits the staged mutations into per-tree sled batches, in the
    /// order they must be applied: registers, then index (with the
    /// `first`/`last` markers trailing).
    pub(crate) fn into_tree_batches(self) -> (sled::Batch, sled::Batch) {
        let mut registers = sled::Batch::default();
        for (key, value) in self.registers {
            registers.insert(key, value);
        }
        let mut index = sled::Batch::default();
        for (key, value) in self.index {
            index.insert(key, value);
        }
        if let Some(value) = self.first {
            index.insert(marker_key(KeySpace::First).to_vec(), value);
        }
        if let Some(value) = self.last {
            index.insert(marker_key(KeySpace::Last).to_vec(), value);
        }
        (registers, index)
    }
}
