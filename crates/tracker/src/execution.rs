use std::{collections::VecDeque, num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use parking_lot::Mutex;
use tessera_primitives::{
    ArchiveError, Block, BlockId, BlockPayload, ExecutionRecord, Height, TrieUpdate,
};
use tessera_streamer::{BlobSource, Streamer};
use tracing::{debug, trace};

use crate::protocol::ProtocolState;

type Result<T> = std::result::Result<T, ArchiveError>;

/// Tracks execution records pulled from the streamer.
///
/// Two views are maintained: a FIFO of not-yet-consumed trie-update
/// batches (one per record that carries updates), and a bounded
/// by-block-ID record cache. Consuming a record through [`record`]
/// purges everything below its height, so memory tracks the mapper's
/// frontier.
///
/// [`record`]: ExecutionTracker::record
#[expect(
    missing_debug_implementations,
    reason = "the lru cache has no Debug implementation"
)]
pub struct ExecutionTracker<S> {
    streamer: Arc<Streamer<S>>,
    inner: Mutex<Inner>,
}

struct Inner {
    queue: VecDeque<Vec<TrieUpdate>>,
    records: LruCache<BlockId, ExecutionRecord>,
    /// Heights strictly below this were already consumed and purged. A
    /// record arriving below it can only be a replay.
    purged_below: Height,
}

impl<S: BlobSource> ExecutionTracker<S> {
    /// Creates the tracker and seeds it with a synthetic record for
    /// the sealed root block, so the root height is served through the
    /// same lookup path as every later height.
    pub fn new(
        streamer: Arc<Streamer<S>>,
        protocol: &impl ProtocolState,
        cache_size: NonZeroUsize,
    ) -> Result<Self> {
        let root_height = protocol.root_height()?;
        let root_id = protocol.block_id_at(root_height)?;
        let root_header = protocol.header(&root_id)?;
        let root_seal = protocol
            .seals(&root_id)?
            .into_iter()
            .find(|seal| seal.block_id == root_id)
            .ok_or(ArchiveError::NotFound)?;

        // The root block was executed before recorded history began:
        // no collections, no events, no trie updates.
        let root_record = ExecutionRecord {
            block: Block {
                id: root_id,
                header: root_header,
                payload: BlockPayload {
                    guarantees: vec![],
                    seals: vec![root_seal.clone()],
                },
            },
            collections: vec![],
            tx_results: vec![],
            events: vec![],
            trie_updates: vec![],
            final_state_commitment: root_seal.final_state,
        };

        let mut records = LruCache::new(cache_size);
        records.put(root_id, root_record);
        debug!(%root_id, height = root_height, "seeded synthetic root record");

        Ok(Self {
            streamer,
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                records,
                purged_below: 0,
            }),
        })
    }

    /// Pops the oldest unconsumed trie-update batch, pulling records
    /// from the streamer as needed and skipping blocks that carry no
    /// updates.
    pub fn all_updates(&self) -> Result<Vec<TrieUpdate>> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(batch) = inner.queue.pop_front() {
                return Ok(batch);
            }
            self.pull_record(&mut inner)?;
        }
    }

    /// Returns the record for a block and purges every cached record
    /// strictly below its height.
    pub fn record(&self, block_id: &BlockId) -> Result<ExecutionRecord> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(record) = inner.records.peek(block_id).cloned() {
                let height = record.height();
                let stale: Vec<BlockId> = inner
                    .records
                    .iter()
                    .filter(|(_, cached)| cached.height() < height)
                    .map(|(id, _)| *id)
                    .collect();
                for id in &stale {
                    inner.records.pop(id);
                }
                if !stale.is_empty() {
                    trace!(purged = stale.len(), below = height, "purged record cache");
                }
                inner.purged_below = inner.purged_below.max(height);
                return Ok(record);
            }
            self.pull_record(&mut inner)?;
        }
    }

    /// Discards every queued trie-update batch without pulling more
    /// records. Used when register mapping is disabled, so consumed
    /// records do not pin their updates in memory.
    pub fn drain_updates(&self) {
        let mut inner = self.inner.lock();
        if !inner.queue.is_empty() {
            trace!(batches = inner.queue.len(), "discarded queued trie updates");
            inner.queue.clear();
        }
    }

    /// Pulls the next record off the streamer into the queue and
    /// cache. `Unavailable` propagates to the caller's retry loop.
    fn pull_record(&self, inner: &mut Inner) -> Result<()> {
        let record = self.streamer.next()?;
        let block_id = record.block_id();

        if inner.records.contains(&block_id) || record.height() < inner.purged_below {
            return Err(ArchiveError::DuplicateRecord(block_id));
        }

        if !record.trie_updates.is_empty() {
            inner.queue.push_back(record.trie_updates.clone());
        }
        trace!(%block_id, height = record.height(), "cached execution record");
        inner.records.put(block_id, record);
        Ok(())
    }
}
