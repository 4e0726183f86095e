use std::sync::Arc;

use tessera_db::IndexDb;
use tessera_primitives::{
    ArchiveError, BlockId, CollectionGuarantee, CollectionId, Event, Header, Height,
    LightCollection, RegisterPath, Seal, SealId, StateCommitment, Transaction, TransactionResult,
    TxId,
};

type Result<T> = std::result::Result<T, ArchiveError>;

/// Read path for served queries. Pure reads, no mutation; every miss
/// is returned verbatim as [`ArchiveError::NotFound`].
#[derive(Debug, Clone)]
pub struct IndexReader {
    db: Arc<IndexDb>,
}

impl IndexReader {
    pub fn new(db: Arc<IndexDb>) -> Self {
        Self { db }
    }

    /// The root height indexing started from.
    pub fn first(&self) -> Result<Height> {
        self.db.read_first()?.ok_or(ArchiveError::NotFound)
    }

    /// The greatest fully indexed height.
    pub fn last(&self) -> Result<Height> {
        self.db.read_last()?.ok_or(ArchiveError::NotFound)
    }

    pub fn header_by_height(&self, height: Height) -> Result<Header> {
        self.db.header(height)?.ok_or(ArchiveError::NotFound)
    }

    pub fn commit_by_height(&self, height: Height) -> Result<StateCommitment> {
        self.db.commit(height)?.ok_or(ArchiveError::NotFound)
    }

    pub fn height_for_block(&self, block_id: &BlockId) -> Result<Height> {
        self.db
            .height_for_block(block_id)?
            .ok_or(ArchiveError::NotFound)
    }

    pub fn height_for_transaction(&self, tx_id: &TxId) -> Result<Height> {
        self.db.height_for_tx(tx_id)?.ok_or(ArchiveError::NotFound)
    }

    pub fn collection(&self, collection_id: &CollectionId) -> Result<LightCollection> {
        self.db
            .collection(collection_id)?
            .ok_or(ArchiveError::NotFound)
    }

    pub fn guarantee(&self, collection_id: &CollectionId) -> Result<CollectionGuarantee> {
        self.db
            .guarantee(collection_id)?
            .ok_or(ArchiveError::NotFound)
    }

    pub fn transaction(&self, tx_id: &TxId) -> Result<Transaction> {
        self.db.transaction(tx_id)?.ok_or(ArchiveError::NotFound)
    }

    pub fn result(&self, tx_id: &TxId) -> Result<TransactionResult> {
        self.db.result(tx_id)?.ok_or(ArchiveError::NotFound)
    }

    pub fn seal(&self, seal_id: &SealId) -> Result<Seal> {
        self.db.seal(seal_id)?.ok_or(ArchiveError::NotFound)
    }

    /// The seals included at a height, resolved to full seals.
    pub fn seals_by_height(&self, height: Height) -> Result<Vec<Seal>> {
        let ids = self
            .db
            .seals_at_height(height)?
            .ok_or(ArchiveError::NotFound)?;
        ids.iter()
            .map(|id| self.db.seal(id)?.ok_or(ArchiveError::NotFound))
            .collect()
    }

    /// The collections guaranteed at a height, resolved to light
    /// collections.
    pub fn collections_by_height(&self, height: Height) -> Result<Vec<LightCollection>> {
        let ids = self
            .db
            .collections_at_height(height)?
            .ok_or(ArchiveError::NotFound)?;
        ids.iter()
            .map(|id| self.db.collection(id)?.ok_or(ArchiveError::NotFound))
            .collect()
    }

    /// The transactions executed at a height, resolved to bodies.
    pub fn transactions_by_height(&self, height: Height) -> Result<Vec<Transaction>> {
        let ids = self
            .db
            .transactions_at_height(height)?
            .ok_or(ArchiveError::NotFound)?;
        ids.iter()
            .map(|id| self.db.transaction(id)?.ok_or(ArchiveError::NotFound))
            .collect()
    }

    /// The transaction results produced at a height.
    pub fn results_by_height(&self, height: Height) -> Result<Vec<TransactionResult>> {
        let ids = self
            .db
            .results_at_height(height)?
            .ok_or(ArchiveError::NotFound)?;
        ids.iter()
            .map(|id| self.db.result(id)?.ok_or(ArchiveError::NotFound))
            .collect()
    }

    /// Events at a height, optionally restricted to a set of types.
    ///
    /// An empty filter means all types. Heights outside the indexed
    /// range are a miss even when the scan would come back empty.
    pub fn events_by_height(&self, height: Height, types: &[String]) -> Result<Vec<Event>> {
        self.check_bounds(height)?;
        if types.is_empty() {
            return Ok(self.db.events(height)?);
        }
        let mut events = Vec::new();
        for event_type in types {
            events.extend(self.db.events_of_type(height, event_type)?);
        }
        Ok(events)
    }

    /// Point-in-time register reads; one value per requested path.
    pub fn values_by_height(
        &self,
        paths: &[RegisterPath],
        height: Height,
    ) -> Result<Vec<Vec<u8>>> {
        self.check_bounds(height)?;
        paths
            .iter()
            .map(|path| self.db.register(path, height)?.ok_or(ArchiveError::NotFound))
            .collect()
    }

    /// Rejects heights outside `[first, last]`: history before the
    /// root or above the indexing frontier was never materialized.
    fn check_bounds(&self, height: Height) -> Result<()> {
        let first = self.first()?;
        let last = self.last()?;
        if height < first || height > last {
            return Err(ArchiveError::NotFound);
        }
        Ok(())
    }
}
