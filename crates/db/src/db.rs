use std::path::Path;

use tessera_codec::{decode, Encodable};
use tessera_primitives::{
    BlockId, CollectionGuarantee, CollectionId, Event, Header, Height, LightCollection,
    RegisterPath, Seal, SealId, StateCommitment, Transaction, TransactionResult, TxId,
};

use crate::{
    batch::IndexBatch,
    error::DbResult,
    keys::{event_key, events_prefix, height_key, id_key, marker_key, register_key, KeySpace},
};

const INDEX_TREE: &str = "index";
const REGISTER_TREE: &str = "registers";

/// The archive's on-disk index: chain artifacts plus the versioned
/// register map, backed by two trees of one sled instance.
///
/// Writes go through [`IndexBatch`]; each tree's batch applies
/// atomically. Reads are plain point lookups and bounded range scans.
#[derive(Debug, Clone)]
pub struct IndexDb {
    db: sled::Db,
    index: sled::Tree,
    registers: sled::Tree,
}

impl IndexDb {
    /// Opens (or creates) the index database under `path`.
    pub fn open(path: &Path) -> DbResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// Opens with an explicit engine cache budget. Register reads are
    /// seek-heavy, so the cache directly bounds their working set.
    pub fn open_with_cache(path: &Path, cache_bytes: u64) -> DbResult<Self> {
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(cache_bytes)
            .open()?;
        Self::from_db(db)
    }

    /// Wraps an already opened sled instance.
    pub fn from_db(db: sled::Db) -> DbResult<Self> {
        let index = db.open_tree(INDEX_TREE)?;
        let registers = db.open_tree(REGISTER_TREE)?;
        Ok(Self {
            db,
            index,
            registers,
        })
    }

    fn read<T: Encodable>(&self, key: impl AsRef<[u8]>) -> DbResult<Option<T>> {
        match self.index.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // --- height markers ---

    pub fn read_first(&self) -> DbResult<Option<Height>> {
        self.read(marker_key(KeySpace::First))
    }

    pub fn read_last(&self) -> DbResult<Option<Height>> {
        self.read(marker_key(KeySpace::Last))
    }

    // --- lookup indexes ---

    pub fn height_for_block(&self, block_id: &BlockId) -> DbResult<Option<Height>> {
        self.read(id_key(KeySpace::HeightByBlock, block_id.as_slice()))
    }

    pub fn height_for_tx(&self, tx_id: &TxId) -> DbResult<Option<Height>> {
        self.read(id_key(KeySpace::HeightByTx, tx_id.as_slice()))
    }

    // --- per-height artifacts ---

    pub fn commit(&self, height: Height) -> DbResult<Option<StateCommitment>> {
        self.read(height_key(KeySpace::Commit, height))
    }

    pub fn header(&self, height: Height) -> DbResult<Option<Header>> {
        self.read(height_key(KeySpace::Header, height))
    }

    /// Reads the events of one type at a height.
    pub fn events_of_type(&self, height: Height, event_type: &str) -> DbResult<Vec<Event>> {
        Ok(self
            .read(event_key(height, event_type))?
            .unwrap_or_default())
    }

    /// Scans every event type recorded at a height, in type order.
    pub fn events(&self, height: Height) -> DbResult<Vec<Event>> {
        let mut events = Vec::new();
        for entry in self.index.scan_prefix(events_prefix(height)) {
            let (_, value) = entry?;
            let group: Vec<Event> = decode(&value)?;
            events.extend(group);
        }
        Ok(events)
    }

    pub fn seals_at_height(&self, height: Height) -> DbResult<Option<Vec<SealId>>> {
        self.read(height_key(KeySpace::SealsAtHeight, height))
    }

    pub fn collections_at_height(&self, height: Height) -> DbResult<Option<Vec<CollectionId>>> {
        self.read(height_key(KeySpace::CollectionsAtHeight, height))
    }

    pub fn transactions_at_height(&self, height: Height) -> DbResult<Option<Vec<TxId>>> {
        self.read(height_key(KeySpace::TransactionsAtHeight, height))
    }

    pub fn results_at_height(&self, height: Height) -> DbResult<Option<Vec<TxId>>> {
        self.read(height_key(KeySpace::ResultsAtHeight, height))
    }

    // --- per-ID artifacts ---

    pub fn guarantee(&self, collection_id: &CollectionId) -> DbResult<Option<CollectionGuarantee>> {
        self.read(id_key(KeySpace::Guarantee, collection_id.as_slice()))
    }

    pub fn transaction(&self, tx_id: &TxId) -> DbResult<Option<Transaction>> {
        self.read(id_key(KeySpace::Transaction, tx_id.as_slice()))
    }

    pub fn result(&self, tx_id: &TxId) -> DbResult<Option<TransactionResult>> {
        self.read(id_key(KeySpace::Result, tx_id.as_slice()))
    }

    pub fn seal(&self, seal_id: &SealId) -> DbResult<Option<Seal>> {
        self.read(id_key(KeySpace::Seal, seal_id.as_slice()))
    }

    pub fn collection(&self, collection_id: &CollectionId) -> DbResult<Option<LightCollection>> {
        self.read(id_key(KeySpace::Collection, collection_id.as_slice()))
    }

    // --- registers ---

    /// Point-in-time register read: the newest version at or below
    /// `height`, found with a single reverse seek bounded to the path.
    pub fn register(&self, path: &RegisterPath, height: Height) -> DbResult<Option<Vec<u8>>> {
        let lower = register_key(path, 0);
        let upper = register_key(path, height);
        match self.registers.range(lower..=upper).next_back() {
            Some(entry) => {
                let (_, value) = entry?;
                Ok(Some(decode(&value)?))
            }
            None => Ok(None),
        }
    }

    // --- mutation ---

    /// Applies a staged batch: registers first, then the index tree, so
    /// an index batch carrying `save_last` never becomes visible before
    /// the register versions it covers.
    pub fn apply(&self, batch: IndexBatch) -> DbResult<()> {
        let (registers, index) = batch.into_tree_batches();
        self.registers.apply_batch(registers)?;
        self.index.apply_batch(index)?;
        Ok(())
    }

    /// Durably flushes both trees.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Final flush before the handle is dropped.
    pub fn close(&self) -> DbResult<()> {
        self.flush()
    }
}
