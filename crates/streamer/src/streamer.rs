use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tessera_primitives::{ArchiveError, BlockId, ExecutionRecord};
use tracing::{debug, error, trace, warn};

use crate::blob::{BlobError, BlobSource};

/// Ordered execution-record downloader.
///
/// Block IDs enter the download queue in finalization order and leave
/// the record buffer in the same order; a failed fetch returns its ID
/// to the popping end of the queue, so delivery order is never
/// perturbed by retries. At most one poll runs at a time, enforced by
/// a compare-and-swap on the busy flag.
#[derive(Debug)]
pub struct Streamer<S> {
    source: Arc<S>,
    pending: Mutex<VecDeque<BlockId>>,
    buffer: Mutex<VecDeque<ExecutionRecord>>,
    polling: AtomicBool,
    buffer_limit: usize,
    /// A corrupted object is fatal; the error is parked here and
    /// surfaced on the next pull.
    poisoned: Mutex<Option<ArchiveError>>,
}

impl<S: BlobSource> Streamer<S> {
    pub fn new(source: Arc<S>, buffer_limit: usize) -> Self {
        Self {
            source,
            pending: Mutex::new(VecDeque::new()),
            buffer: Mutex::new(VecDeque::new()),
            polling: AtomicBool::new(false),
            buffer_limit,
            poisoned: Mutex::new(None),
        }
    }

    /// Pre-seeds the download queue with catch-up block IDs, oldest
    /// first. Called once at startup before the follower starts
    /// delivering.
    pub fn seed(&self, block_ids: impl IntoIterator<Item = BlockId>) {
        let mut pending = self.pending.lock();
        for block_id in block_ids {
            pending.push_back(block_id);
        }
        debug!(queued = pending.len(), "seeded download queue");
    }

    /// Finalization callback: enqueues the block for download in
    /// arrival order.
    pub fn on_block_finalized(self: &Arc<Self>, block_id: BlockId) {
        self.pending.lock().push_back(block_id);
        self.spawn_poll();
    }

    /// Returns the oldest buffered record, or `Unavailable` when the
    /// buffer is empty. Always kicks an asynchronous poll so the
    /// buffer refills behind the caller.
    pub fn next(self: &Arc<Self>) -> Result<ExecutionRecord, ArchiveError> {
        if let Some(err) = self.poisoned.lock().clone() {
            return Err(err);
        }

        let popped = self.buffer.lock().pop_front();
        self.spawn_poll();
        popped.ok_or(ArchiveError::Unavailable)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Starts a background poll unless one is already running.
    fn spawn_poll(self: &Arc<Self>) {
        if self
            .polling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            this.poll().await;
            this.polling.store(false, Ordering::Release);
        });
    }

    /// Downloads queued records until the buffer is full, the queue is
    /// empty, or a fetch does not complete.
    async fn poll(&self) {
        loop {
            if self.buffer.lock().len() >= self.buffer_limit {
                trace!("record buffer full, ending poll");
                return;
            }
            let Some(block_id) = self.pending.lock().pop_front() else {
                return;
            };

            let name = format!("{block_id}.cbor");
            match self.source.fetch(&name).await {
                Ok(bytes) => match decode_record(&block_id, &bytes) {
                    Ok(record) => {
                        trace!(%block_id, height = record.height(), "buffered execution record");
                        self.buffer.lock().push_back(record);
                    }
                    Err(err) => {
                        error!(%block_id, %err, "execution record is corrupt");
                        *self.poisoned.lock() = Some(err);
                        return;
                    }
                },
                Err(BlobError::NotFound(_)) => {
                    // Not uploaded yet; retry the same block next poll.
                    trace!(%block_id, "record not yet uploaded");
                    self.pending.lock().push_front(block_id);
                    return;
                }
                Err(err) => {
                    warn!(%block_id, %err, "record fetch failed, will retry");
                    self.pending.lock().push_front(block_id);
                    return;
                }
            }
        }
    }
}

/// Decodes and validates one CBOR record object.
fn decode_record(block_id: &BlockId, bytes: &[u8]) -> Result<ExecutionRecord, ArchiveError> {
    let record: ExecutionRecord = ciborium::de::from_reader(bytes)
        .map_err(|err| ArchiveError::InvalidEncoding(format!("record {block_id}: {err}")))?;
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::AtomicUsize,
        time::Duration,
    };

    use tessera_primitives::{
        Block, BlockPayload, Buf32, Header, StateCommitment,
    };

    use super::*;
    use crate::blob::MockBlobSource;

    fn make_record(height: u64, tag: u8) -> ExecutionRecord {
        ExecutionRecord {
            block: Block {
                id: BlockId::from_bytes([tag; 32]),
                header: Header {
                    chain_id: "tessera-test".into(),
                    height,
                    parent_id: BlockId::from_bytes([tag.wrapping_sub(1); 32]),
                    timestamp_ms: height * 1000,
                    payload_hash: Buf32::new([2u8; 32]),
                    proposer_id: Buf32::new([3u8; 32]),
                    proposer_sig: vec![],
                },
                payload: BlockPayload {
                    guarantees: vec![],
                    seals: vec![],
                },
            },
            collections: vec![],
            tx_results: vec![],
            events: vec![],
            trie_updates: vec![],
            final_state_commitment: StateCommitment::from_bytes([tag; 32]),
        }
    }

    fn encode_record(record: &ExecutionRecord) -> Vec<u8> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(record, &mut bytes).unwrap();
        bytes
    }

    async fn drain_one(streamer: &Arc<Streamer<MockBlobSource>>) -> ExecutionRecord {
        for _ in 0..200 {
            match streamer.next() {
                Ok(record) => return record,
                Err(ArchiveError::Unavailable) => {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
                Err(err) => panic!("unexpected streamer error: {err}"),
            }
        }
        panic!("record never became available");
    }

    #[tokio::test]
    async fn test_records_delivered_in_finalization_order() {
        let mut source = MockBlobSource::new();
        for tag in [1u8, 2, 3] {
            let record = make_record(100 + tag as u64, tag);
            let name = format!("{}.cbor", record.block_id());
            let bytes = encode_record(&record);
            source
                .expect_fetch()
                .withf(move |n| n == name)
                .returning(move |_| Ok(bytes.clone()));
        }

        let streamer = Arc::new(Streamer::new(Arc::new(source), 8));
        for tag in [1u8, 2, 3] {
            streamer.on_block_finalized(BlockId::from_bytes([tag; 32]));
        }

        for tag in [1u8, 2, 3] {
            let record = drain_one(&streamer).await;
            assert_eq!(record.block_id(), BlockId::from_bytes([tag; 32]));
        }
    }

    #[tokio::test]
    async fn test_transport_failure_retries_same_block_first() {
        let record_a = make_record(101, 1);
        let bytes_a = encode_record(&record_a);
        let record_b = make_record(102, 2);
        let bytes_b = encode_record(&record_b);
        let name_a = format!("{}.cbor", record_a.block_id());

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_inner = attempts.clone();

        let mut source = MockBlobSource::new();
        source.expect_fetch().returning(move |name| {
            if name == name_a {
                // First attempt at block A fails; the retry succeeds.
                if attempts_inner.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err(BlobError::transport("connection reset"));
                }
                return Ok(bytes_a.clone());
            }
            Ok(bytes_b.clone())
        });

        let streamer = Arc::new(Streamer::new(Arc::new(source), 8));
        streamer.on_block_finalized(record_a.block_id());
        streamer.on_block_finalized(record_b.block_id());

        // A must still come out before B despite A's failed attempt.
        assert_eq!(drain_one(&streamer).await.block_id(), record_a.block_id());
        assert_eq!(drain_one(&streamer).await.block_id(), record_b.block_id());
    }

    #[tokio::test]
    async fn test_missing_object_ends_poll_and_block_stays_queued() {
        let mut source = MockBlobSource::new();
        source
            .expect_fetch()
            .returning(|name| Err(BlobError::NotFound(name.to_string())));

        let streamer = Arc::new(Streamer::new(Arc::new(source), 8));
        streamer.on_block_finalized(BlockId::from_bytes([1u8; 32]));

        assert!(matches!(streamer.next(), Err(ArchiveError::Unavailable)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(streamer.pending_len(), 1);
        assert_eq!(streamer.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_buffer_bounded() {
        let mut source = MockBlobSource::new();
        source.expect_fetch().returning(|name| {
            let tag = u8::from_str_radix(&name[..2], 16).unwrap();
            Ok(encode_record(&make_record(100 + tag as u64, tag)))
        });

        let streamer = Arc::new(Streamer::new(Arc::new(source), 2));
        for tag in 1u8..=6 {
            streamer.on_block_finalized(BlockId::from_bytes([tag; 32]));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(streamer.buffered_len(), 2);
        assert_eq!(streamer.pending_len(), 4);

        // Draining frees buffer slots and the poll refills them.
        let record = drain_one(&streamer).await;
        assert_eq!(record.block_id(), BlockId::from_bytes([1u8; 32]));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(streamer.buffered_len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_at_most_one_poll_active() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let (active_inner, max_inner) = (active.clone(), max_seen.clone());

        let mut source = MockBlobSource::new();
        source.expect_fetch().returning(move |name| {
            let now = active_inner.fetch_add(1, Ordering::SeqCst) + 1;
            max_inner.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            active_inner.fetch_sub(1, Ordering::SeqCst);
            let tag = u8::from_str_radix(&name[..2], 16).unwrap();
            Ok(encode_record(&make_record(100 + tag as u64, tag)))
        });

        let streamer = Arc::new(Streamer::new(Arc::new(source), 16));
        for tag in 1u8..=8 {
            streamer.on_block_finalized(BlockId::from_bytes([tag; 32]));
        }
        // Hammer next() from many tasks to try to start extra polls.
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let streamer = streamer.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let _ = streamer.next();
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_poisons_stream() {
        let mut source = MockBlobSource::new();
        source
            .expect_fetch()
            .returning(|_| Ok(vec![0xff, 0x00, 0x01]));

        let streamer = Arc::new(Streamer::new(Arc::new(source), 8));
        streamer.on_block_finalized(BlockId::from_bytes([1u8; 32]));

        // First pull kicks the poll; subsequent pulls surface the
        // corruption instead of Unavailable.
        let _ = streamer.next();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            streamer.next(),
            Err(ArchiveError::InvalidEncoding(_))
        ));
    }

    #[tokio::test]
    async fn test_record_with_zero_commitment_rejected() {
        let mut record = make_record(101, 1);
        record.final_state_commitment = StateCommitment::default();
        let bytes = encode_record(&record);

        let mut source = MockBlobSource::new();
        source.expect_fetch().returning(move |_| Ok(bytes.clone()));

        let streamer = Arc::new(Streamer::new(Arc::new(source), 8));
        streamer.on_block_finalized(record.block_id());

        let _ = streamer.next();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            streamer.next(),
            Err(ArchiveError::InvalidEncoding(_))
        ));
    }
}
