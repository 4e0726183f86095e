//! End-to-end pipeline tests: a scripted blob store and a simulated
//! consensus follower drive the full mapper cycle against temporary
//! databases.

use std::{collections::HashMap, num::NonZeroUsize, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tessera_bootstrap::catchup_blocks;
use tessera_db::{IndexDb, ProtocolDb};
use tessera_mapper::{MapperBuilder, MapperError, MapperHandle};
use tessera_primitives::{
    ArchiveError, Block, BlockId, BlockPayload, Buf32, Collection, CollectionGuarantee,
    CollectionId, Event, ExecutionRecord, Header, Height, RegisterEntry, RegisterPath,
    RootCheckpoint, RootSnapshot, Seal, SealId, StateCommitment, Transaction, TransactionResult,
    TrieUpdate, TxId,
};
use tessera_storage::{IndexReader, IndexWriter};
use tessera_streamer::{BlobError, BlobSource, Streamer};
use tessera_tracker::{ConsensusTracker, ExecutionTracker};

const FLUSH_INTERVAL: Duration = Duration::from_millis(25);
const WAIT_INTERVAL: Duration = Duration::from_millis(10);
const ROOT: Height = 100;

/// In-memory blob store with scriptable transient failures.
#[derive(Default)]
struct BlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, usize>>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl BlobStore {
    fn publish(&self, record: &ExecutionRecord) {
        self.publish_as(record.block_id(), record);
    }

    /// Publishes record bytes under another block's object name.
    fn publish_as(&self, block_id: BlockId, record: &ExecutionRecord) {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(record, &mut bytes).unwrap();
        self.objects
            .lock()
            .insert(format!("{block_id}.cbor"), bytes);
    }

    /// The next `times` fetches of this block's object fail with a
    /// transport error.
    fn fail_next(&self, block_id: BlockId, times: usize) {
        self.failures
            .lock()
            .insert(format!("{block_id}.cbor"), times);
    }

    fn attempts(&self, block_id: BlockId) -> usize {
        self.attempts
            .lock()
            .get(&format!("{block_id}.cbor"))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl BlobSource for BlobStore {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, BlobError> {
        *self.attempts.lock().entry(name.to_string()).or_insert(0) += 1;
        {
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(BlobError::transport("scripted failure"));
                }
            }
        }
        self.objects
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(name.to_string()))
    }
}

fn bid(height: Height) -> BlockId {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&height.to_be_bytes());
    BlockId::from_bytes(bytes)
}

fn path(tag: u8) -> RegisterPath {
    RegisterPath::from_bytes([tag; 32])
}

fn make_header(height: Height) -> Header {
    Header {
        chain_id: "tessera-test".into(),
        height,
        parent_id: bid(height.wrapping_sub(1)),
        timestamp_ms: height * 1000,
        payload_hash: Buf32::new([0x10; 32]),
        proposer_id: Buf32::new([0x20; 32]),
        proposer_sig: vec![0xcc; 8],
    }
}

fn root_snapshot() -> RootSnapshot {
    RootSnapshot {
        block_id: bid(ROOT),
        header: make_header(ROOT),
        seal: Seal {
            id: SealId::from_bytes([0xf1; 32]),
            block_id: bid(ROOT),
            final_state: StateCommitment::from_bytes([0xf2; 32]),
        },
    }
}

/// The state commitment each height seals with. The root height seals
/// with the snapshot seal's commitment.
fn commit_of(height: Height) -> StateCommitment {
    if height == ROOT {
        return StateCommitment::from_bytes([0xf2; 32]);
    }
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    bytes[31] = 0xee;
    StateCommitment::from_bytes(bytes)
}

/// A record whose single trie update writes `(path, payload)` pairs.
/// Trie updates chain: each batch starts from the previous height's
/// sealed commitment.
fn make_record(height: Height, writes: &[(RegisterPath, Vec<u8>)]) -> ExecutionRecord {
    let trie_updates = if writes.is_empty() {
        vec![]
    } else {
        vec![TrieUpdate {
            root_hash: *commit_of(height - 1).inner(),
            paths: writes.iter().map(|(p, _)| *p).collect(),
            payloads: writes.iter().map(|(_, v)| v.clone()).collect(),
        }]
    };
    ExecutionRecord {
        block: Block {
            id: bid(height),
            header: make_header(height),
            payload: BlockPayload {
                guarantees: vec![],
                seals: vec![],
            },
        },
        collections: vec![],
        tx_results: vec![],
        events: vec![],
        trie_updates,
        final_state_commitment: commit_of(height),
    }
}

struct Env {
    protocol: Arc<ProtocolDb>,
    index: Arc<IndexDb>,
    blobs: Arc<BlobStore>,
    writer: Arc<IndexWriter>,
    reader: IndexReader,
    streamer: Arc<Streamer<BlobStore>>,
    consensus: Arc<ConsensusTracker<ProtocolDb, BlobStore>>,
    execution: Arc<ExecutionTracker<BlobStore>>,
}

impl Env {
    /// Fresh databases with the root snapshot already ingested.
    fn new() -> Self {
        let protocol_db = sled::Config::new().temporary(true).open().unwrap();
        let protocol = Arc::new(ProtocolDb::from_db(protocol_db).unwrap());
        protocol.put_root(&root_snapshot()).unwrap();

        let index_db = sled::Config::new().temporary(true).open().unwrap();
        let index = Arc::new(IndexDb::from_db(index_db).unwrap());

        Self::over(protocol, index, Arc::new(BlobStore::default()))
    }

    /// Builds a fresh component stack over existing databases, as a
    /// process restart would.
    fn over(protocol: Arc<ProtocolDb>, index: Arc<IndexDb>, blobs: Arc<BlobStore>) -> Self {
        let writer = Arc::new(IndexWriter::new(index.clone(), FLUSH_INTERVAL));
        let reader = IndexReader::new(index.clone());
        let streamer = Arc::new(Streamer::new(blobs.clone(), 8));
        let execution = Arc::new(
            ExecutionTracker::new(
                streamer.clone(),
                protocol.as_ref(),
                NonZeroUsize::new(64).unwrap(),
            )
            .unwrap(),
        );
        let consensus =
            Arc::new(ConsensusTracker::new(protocol.clone(), execution.clone()).unwrap());

        Self {
            protocol,
            index,
            blobs,
            writer,
            reader,
            streamer,
            consensus,
            execution,
        }
    }

    fn launch(
        &self,
        checkpoint: Option<RootCheckpoint>,
    ) -> (
        MapperHandle,
        tokio::task::JoinHandle<Result<(), MapperError>>,
    ) {
        let (handle, task) = MapperBuilder::new(
            self.index.clone(),
            self.writer.clone(),
            self.consensus.clone(),
            self.execution.clone(),
        )
        .with_checkpoint(checkpoint)
        .with_wait_interval(WAIT_INTERVAL)
        .build();
        (handle, tokio::spawn(task))
    }

    /// Simulates the follower finalizing a block: protocol state is
    /// written first, then the callbacks fire in consensus order.
    fn finalize(&self, record: &ExecutionRecord) {
        let block = &record.block;
        self.protocol
            .put_finalized_block(
                block.header.height,
                &block.id,
                &block.header,
                &block.payload.guarantees,
                &block.payload.seals,
            )
            .unwrap();
        self.consensus.on_block_finalized(&block.id).unwrap();
        self.streamer.on_block_finalized(block.id);
    }

    /// Follower activity while the archive process is down: only the
    /// protocol store advances.
    fn finalize_offline(&self, record: &ExecutionRecord) {
        let block = &record.block;
        self.protocol
            .put_finalized_block(
                block.header.height,
                &block.id,
                &block.header,
                &block.payload.guarantees,
                &block.payload.seals,
            )
            .unwrap();
    }

    async fn settle(&self) {
        self.writer.flush().await.unwrap();
    }
}

async fn wait_height(handle: &MapperHandle, target: Height) {
    let mut rx = handle.height_watcher();
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|h| *h >= target))
        .await
        .unwrap_or_else(|_| panic!("mapper never reached height {target}"))
        .unwrap();
}

#[tokio::test]
async fn test_root_bootstrap() {
    let env = Env::new();
    let checkpoint = RootCheckpoint {
        registers: vec![RegisterEntry {
            path: path(0x01),
            payload: vec![0xaa, 0xbb],
        }],
    };

    let (handle, task) = env.launch(Some(checkpoint));
    wait_height(&handle, ROOT).await;
    env.settle().await;

    assert_eq!(env.reader.first().unwrap(), ROOT);
    assert_eq!(env.reader.last().unwrap(), ROOT);
    assert_eq!(env.reader.header_by_height(ROOT).unwrap(), make_header(ROOT));
    assert_eq!(
        env.reader.commit_by_height(ROOT).unwrap(),
        StateCommitment::from_bytes([0xf2; 32])
    );
    assert_eq!(
        env.reader.values_by_height(&[path(0x01)], ROOT).unwrap(),
        vec![vec![0xaa, 0xbb]]
    );
    let seals = env.reader.seals_by_height(ROOT).unwrap();
    assert_eq!(seals.len(), 1);
    assert_eq!(seals[0].final_state, StateCommitment::from_bytes([0xf2; 32]));
    assert_eq!(env.reader.height_for_block(&bid(ROOT)).unwrap(), ROOT);
    // Nothing above the root exists yet.
    assert_eq!(
        env.reader.header_by_height(ROOT + 1),
        Err(ArchiveError::NotFound)
    );

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_single_block_advance() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    // Block 101 carries a full set of artifacts.
    let tx = Transaction {
        id: TxId::from_bytes([0x51; 32]),
        reference_block_id: bid(ROOT),
        script: b"transaction { execute {} }".to_vec(),
        arguments: vec![vec![0x01]],
        gas_limit: 9999,
        payer: vec![0x07; 8],
    };
    let guarantee = CollectionGuarantee {
        collection_id: CollectionId::from_bytes([0x52; 32]),
        reference_block_id: bid(ROOT),
        signer_indices: vec![0, 1],
        signature: vec![0xdd; 48],
    };
    let seal = Seal {
        id: SealId::from_bytes([0x53; 32]),
        block_id: bid(ROOT),
        final_state: StateCommitment::from_bytes([0xf2; 32]),
    };
    let event = Event {
        event_type: "A.01.TokensDeposit".into(),
        tx_index: 0,
        event_index: 0,
        tx_id: tx.id,
        payload: vec![0x09],
    };

    let mut record = make_record(101, &[(path(0x33), vec![0x44])]);
    record.block.payload.guarantees = vec![guarantee.clone()];
    record.block.payload.seals = vec![seal.clone()];
    record.collections = vec![Collection {
        guarantee: guarantee.clone(),
        transactions: vec![tx.clone()],
    }];
    record.tx_results = vec![TransactionResult {
        tx_id: tx.id,
        error_message: String::new(),
    }];
    record.events = vec![event.clone()];

    env.blobs.publish(&record);
    env.finalize(&record);

    wait_height(&handle, 101).await;
    env.settle().await;

    assert_eq!(env.reader.last().unwrap(), 101);
    assert_eq!(
        env.reader.commit_by_height(101).unwrap(),
        record.final_state_commitment
    );
    assert_eq!(
        env.reader.values_by_height(&[path(0x33)], 101).unwrap(),
        vec![vec![0x44]]
    );
    // The register version holds for later heights until overwritten.
    assert_eq!(env.reader.height_for_block(&bid(101)).unwrap(), 101);
    assert_eq!(env.reader.height_for_transaction(&tx.id).unwrap(), 101);
    assert_eq!(env.reader.transaction(&tx.id).unwrap(), tx);
    assert_eq!(
        env.reader.guarantee(&guarantee.collection_id).unwrap(),
        guarantee
    );
    assert_eq!(
        env.reader
            .collection(&guarantee.collection_id)
            .unwrap()
            .transaction_ids,
        vec![tx.id]
    );
    assert!(env.reader.result(&tx.id).unwrap().succeeded());
    assert_eq!(env.reader.seal(&seal.id).unwrap(), seal);
    assert_eq!(env.reader.events_by_height(101, &[]).unwrap(), vec![event]);

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_out_of_order_publication_still_indexes_in_order() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    let records: Vec<_> = (101..=105)
        .map(|height| make_record(height, &[(path(height as u8), vec![height as u8])]))
        .collect();

    // All five finalize in order, but the records appear in the store
    // out of order: 103 first, then 101, 102, 105, 104.
    for record in &records {
        env.finalize(record);
    }
    env.blobs.publish(&records[2]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    // The mapper cannot move: 101 is still missing.
    assert_eq!(*handle.height_watcher().borrow(), ROOT);

    env.blobs.publish(&records[0]);
    env.blobs.publish(&records[1]);
    wait_height(&handle, 103).await;

    env.blobs.publish(&records[4]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*handle.height_watcher().borrow(), 103);

    env.blobs.publish(&records[3]);
    wait_height(&handle, 105).await;
    env.settle().await;

    // Every height got exactly its own register version.
    for height in 101..=105u64 {
        let tag = height as u8;
        assert_eq!(
            env.reader.values_by_height(&[path(tag)], height).unwrap(),
            vec![vec![tag]]
        );
        if height > 101 {
            assert_eq!(
                env.reader.values_by_height(&[path(tag)], height - 1),
                Err(ArchiveError::NotFound)
            );
        }
    }

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_restart_catchup() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    let early: Vec<_> = (101..=103)
        .map(|height| make_record(height, &[(path(height as u8), vec![height as u8])]))
        .collect();
    for record in &early {
        env.blobs.publish(record);
        env.finalize(record);
    }
    wait_height(&handle, 103).await;

    // Stop the first process.
    handle.shutdown();
    task.await.unwrap().unwrap();
    env.writer.close().await.unwrap();

    // While the archive is down, 104 and 105 finalize and upload.
    let late: Vec<_> = (104..=105)
        .map(|height| make_record(height, &[(path(height as u8), vec![height as u8])]))
        .collect();
    for record in &late {
        env.blobs.publish(record);
        env.finalize_offline(record);
    }

    // A fresh process enumerates the gap and pre-seeds its streamer.
    let restarted = Env::over(
        env.protocol.clone(),
        env.index.clone(),
        env.blobs.clone(),
    );
    let last = restarted.index.read_last().unwrap().unwrap();
    assert_eq!(last, 103);
    let catchup = catchup_blocks(restarted.protocol.as_ref(), last).unwrap();
    assert_eq!(catchup, vec![bid(104), bid(105)]);
    restarted.streamer.seed(catchup);

    let (handle, task) = restarted.launch(None);
    wait_height(&handle, 105).await;
    restarted.settle().await;

    assert_eq!(restarted.reader.last().unwrap(), 105);
    assert_eq!(
        restarted.reader.values_by_height(&[path(105)], 105).unwrap(),
        vec![vec![105]]
    );

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_transient_record_unavailability() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    let record = make_record(101, &[(path(0x66), vec![0x77])]);
    env.blobs.fail_next(record.block_id(), 3);
    env.blobs.publish(&record);
    env.finalize(&record);

    wait_height(&handle, 101).await;
    env.settle().await;

    // Three failed attempts plus at least one success.
    assert!(env.blobs.attempts(record.block_id()) >= 4);
    assert_eq!(env.reader.last().unwrap(), 101);
    assert_eq!(
        env.reader.commit_by_height(101).unwrap(),
        record.final_state_commitment
    );
    assert_eq!(
        env.reader.values_by_height(&[path(0x66)], 101).unwrap(),
        vec![vec![0x77]]
    );

    handle.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_mismatched_root_hash_is_fatal() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    // Block 101's update batch does not start from the root's sealed
    // commitment.
    let mut record = make_record(101, &[(path(0x01), vec![0x01])]);
    record.trie_updates[0].root_hash = Buf32::new([0xba; 32]);
    env.blobs.publish(&record);
    env.finalize(&record);

    let err = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("mapper should stop on mismatched root hash")
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        MapperError::Archive(ArchiveError::MismatchedRootHash { expected, actual })
            if expected == *commit_of(ROOT).inner() && actual == Buf32::new([0xba; 32])
    ));

    // The frontier never advanced onto the divergent height.
    env.settle().await;
    assert_eq!(env.reader.last().unwrap(), ROOT);

    handle.shutdown();
}

#[tokio::test]
async fn test_end_of_history_stops_cleanly() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    let record = make_record(101, &[(path(0x01), vec![0x01])]);
    env.blobs.publish(&record);
    env.finalize(&record);
    wait_height(&handle, 101).await;

    // The follower marks recorded history complete at 101; the next
    // indexing attempt observes it and the mapper finishes cleanly.
    env.protocol.put_end_of_history(101).unwrap();

    tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("mapper should finish at end of history")
        .unwrap()
        .unwrap();

    env.settle().await;
    assert_eq!(env.reader.last().unwrap(), 101);
    assert_eq!(
        env.reader.commit_by_height(101).unwrap(),
        record.final_state_commitment
    );

    handle.shutdown();
}

#[tokio::test]
async fn test_duplicate_record_is_fatal() {
    let env = Env::new();
    let (handle, task) = env.launch(None);
    wait_height(&handle, ROOT).await;

    let record = make_record(101, &[(path(0x01), vec![0x01])]);
    env.blobs.publish(&record);
    env.finalize(&record);
    wait_height(&handle, 101).await;

    // Block 102 finalizes, but its object replays block 101's record.
    let block_102 = make_record(102, &[]);
    env.blobs.publish_as(block_102.block_id(), &record);
    env.finalize(&block_102);

    let err = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .expect("mapper should stop on duplicate record")
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        err,
        MapperError::Archive(ArchiveError::DuplicateRecord(id)) if id == bid(101)
    ));

    // The frontier never moved past the last good height.
    env.settle().await;
    assert_eq!(env.reader.last().unwrap(), 101);

    handle.shutdown();
}
