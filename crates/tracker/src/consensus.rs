use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tessera_primitives::{
    ArchiveError, BlockId, Collection, CollectionGuarantee, Event, ExecutionRecord, Header, Height,
    Seal, StateCommitment, Transaction, TransactionResult,
};
use tessera_streamer::BlobSource;
use tracing::{debug, trace};

use crate::{execution::ExecutionTracker, protocol::ProtocolState};

type Result<T> = std::result::Result<T, ArchiveError>;

/// Per-height view of the finalized chain.
///
/// Headers, guarantees, and seals come from the protocol-state store;
/// everything produced by execution (commit, collections,
/// transactions, results, events) is joined in from the execution
/// tracker via the block ID. Queries above the follower's finalized
/// frontier answer `Unavailable`, never `NotFound`.
#[expect(
    missing_debug_implementations,
    reason = "the execution tracker has no Debug implementation"
)]
pub struct ConsensusTracker<P, S> {
    protocol: Arc<P>,
    execution: Arc<ExecutionTracker<S>>,
    last_finalized: AtomicU64,
}

impl<P: ProtocolState, S: BlobSource> ConsensusTracker<P, S> {
    pub fn new(protocol: Arc<P>, execution: Arc<ExecutionTracker<S>>) -> Result<Self> {
        // Blocks finalized before this process started still count;
        // pick the frontier up from the store.
        let finalized = protocol.finalized_height()?;
        debug!(finalized, "initialized consensus tracker");
        Ok(Self {
            protocol,
            execution,
            last_finalized: AtomicU64::new(finalized),
        })
    }

    /// Finalization callback: resolves the block's height and advances
    /// the frontier monotonically.
    pub fn on_block_finalized(&self, block_id: &BlockId) -> Result<()> {
        let height = self.protocol.height_for_block(block_id)?;
        let previous = self.last_finalized.fetch_max(height, Ordering::AcqRel);
        trace!(%block_id, height, previous, "block finalized");
        Ok(())
    }

    /// The root height indexing starts from.
    pub fn root(&self) -> Result<Height> {
        self.protocol.root_height()
    }

    pub fn last_finalized(&self) -> Height {
        self.last_finalized.load(Ordering::Acquire)
    }

    /// Resolves a finalized height to its block ID.
    pub fn block_id(&self, height: Height) -> Result<BlockId> {
        self.check_finalized(height)?;
        self.protocol.block_id_at(height)
    }

    pub fn header(&self, height: Height) -> Result<Header> {
        self.check_finalized(height)?;
        let block_id = self.protocol.block_id_at(height)?;
        self.protocol.header(&block_id)
    }

    pub fn guarantees(&self, height: Height) -> Result<Vec<CollectionGuarantee>> {
        self.check_finalized(height)?;
        let block_id = self.protocol.block_id_at(height)?;
        self.protocol.guarantees(&block_id)
    }

    pub fn seals(&self, height: Height) -> Result<Vec<Seal>> {
        self.check_finalized(height)?;
        let block_id = self.protocol.block_id_at(height)?;
        self.protocol.seals(&block_id)
    }

    pub fn commit(&self, height: Height) -> Result<StateCommitment> {
        Ok(self.record_at(height)?.final_state_commitment)
    }

    pub fn collections(&self, height: Height) -> Result<Vec<Collection>> {
        Ok(self.record_at(height)?.collections)
    }

    pub fn transactions(&self, height: Height) -> Result<Vec<Transaction>> {
        let record = self.record_at(height)?;
        Ok(record
            .collections
            .into_iter()
            .flat_map(|collection| collection.transactions)
            .collect())
    }

    pub fn results(&self, height: Height) -> Result<Vec<TransactionResult>> {
        Ok(self.record_at(height)?.tx_results)
    }

    pub fn events(&self, height: Height) -> Result<Vec<Event>> {
        Ok(self.record_at(height)?.events)
    }

    fn record_at(&self, height: Height) -> Result<ExecutionRecord> {
        self.check_finalized(height)?;
        let block_id = self.protocol.block_id_at(height)?;
        self.execution.record(&block_id)
    }

    /// Data above the finalized frontier has not been produced yet as
    /// far as this process knows, unless the recorded history ended
    /// below the queried height and never will produce it.
    fn check_finalized(&self, height: Height) -> Result<()> {
        if height > self.last_finalized() {
            if let Some(end) = self.protocol.end_of_history()? {
                if height > end {
                    return Err(ArchiveError::Finished);
                }
            }
            return Err(ArchiveError::Unavailable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use mockall::predicate::eq;
    use tessera_primitives::{Buf32, SealId};
    use tessera_streamer::{MockBlobSource, Streamer};

    use super::*;
    use crate::protocol::MockProtocolState;

    const ROOT_HEIGHT: Height = 100;

    fn block_id(tag: u8) -> BlockId {
        BlockId::from_bytes([tag; 32])
    }

    fn make_header(height: Height, tag: u8) -> Header {
        Header {
            chain_id: "tessera-test".into(),
            height,
            parent_id: block_id(tag.wrapping_sub(1)),
            timestamp_ms: height * 1000,
            payload_hash: Buf32::new([2u8; 32]),
            proposer_id: Buf32::new([3u8; 32]),
            proposer_sig: vec![],
        }
    }

    fn root_seal() -> Seal {
        Seal {
            id: SealId::from_bytes([0xf1; 32]),
            block_id: block_id(0xf0),
            final_state: StateCommitment::from_bytes([0xf2; 32]),
        }
    }

    /// Protocol mock with the root block at 100 and finalized marker at
    /// `finalized`.
    fn mock_protocol(finalized: Height) -> MockProtocolState {
        let mut protocol = MockProtocolState::new();
        protocol.expect_root_height().returning(|| Ok(ROOT_HEIGHT));
        protocol
            .expect_finalized_height()
            .returning(move || Ok(finalized));
        protocol.expect_end_of_history().returning(|| Ok(None));
        protocol
            .expect_block_id_at()
            .with(eq(ROOT_HEIGHT))
            .returning(|_| Ok(block_id(0xf0)));
        protocol
            .expect_header()
            .with(eq(block_id(0xf0)))
            .returning(|_| Ok(make_header(ROOT_HEIGHT, 0xf0)));
        protocol
            .expect_seals()
            .with(eq(block_id(0xf0)))
            .returning(|_| Ok(vec![root_seal()]));
        protocol
    }

    fn make_tracker(
        protocol: MockProtocolState,
    ) -> ConsensusTracker<MockProtocolState, MockBlobSource> {
        let protocol = Arc::new(protocol);
        let streamer = Arc::new(Streamer::new(Arc::new(MockBlobSource::new()), 8));
        let execution = Arc::new(
            ExecutionTracker::new(
                streamer,
                protocol.as_ref(),
                NonZeroUsize::new(16).unwrap(),
            )
            .unwrap(),
        );
        ConsensusTracker::new(protocol, execution).unwrap()
    }

    #[tokio::test]
    async fn test_queries_above_finalized_unavailable() {
        let tracker = make_tracker(mock_protocol(ROOT_HEIGHT));
        assert_eq!(tracker.header(ROOT_HEIGHT + 1), Err(ArchiveError::Unavailable));
        assert_eq!(tracker.commit(ROOT_HEIGHT + 1), Err(ArchiveError::Unavailable));
        assert_eq!(tracker.events(ROOT_HEIGHT + 1), Err(ArchiveError::Unavailable));
    }

    #[tokio::test]
    async fn test_queries_past_end_of_history_finished() {
        let mut protocol = MockProtocolState::new();
        protocol.expect_root_height().returning(|| Ok(ROOT_HEIGHT));
        protocol
            .expect_finalized_height()
            .returning(|| Ok(ROOT_HEIGHT + 1));
        protocol
            .expect_block_id_at()
            .with(eq(ROOT_HEIGHT))
            .returning(|_| Ok(block_id(0xf0)));
        protocol
            .expect_header()
            .with(eq(block_id(0xf0)))
            .returning(|_| Ok(make_header(ROOT_HEIGHT, 0xf0)));
        protocol
            .expect_seals()
            .with(eq(block_id(0xf0)))
            .returning(|_| Ok(vec![root_seal()]));
        // Recorded history ends at root + 3.
        protocol
            .expect_end_of_history()
            .returning(|| Ok(Some(ROOT_HEIGHT + 3)));

        let tracker = make_tracker(protocol);
        // Within the bounded history but not yet finalized locally is
        // still a wait...
        assert_eq!(
            tracker.header(ROOT_HEIGHT + 2),
            Err(ArchiveError::Unavailable)
        );
        // ...while anything past the end never arrives.
        assert_eq!(
            tracker.header(ROOT_HEIGHT + 4),
            Err(ArchiveError::Finished)
        );
    }

    #[tokio::test]
    async fn test_root_block_served_through_join() {
        let tracker = make_tracker(mock_protocol(ROOT_HEIGHT));
        assert_eq!(tracker.root().unwrap(), ROOT_HEIGHT);
        assert_eq!(tracker.header(ROOT_HEIGHT).unwrap().height, ROOT_HEIGHT);
        // The commit comes from the synthetic root record.
        assert_eq!(
            tracker.commit(ROOT_HEIGHT).unwrap(),
            StateCommitment::from_bytes([0xf2; 32])
        );
        assert!(tracker.collections(ROOT_HEIGHT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalization_advances_monotonically() {
        let mut protocol = mock_protocol(ROOT_HEIGHT);
        protocol
            .expect_height_for_block()
            .with(eq(block_id(0x01)))
            .returning(|_| Ok(ROOT_HEIGHT + 1));
        protocol
            .expect_height_for_block()
            .with(eq(block_id(0x02)))
            .returning(|_| Ok(ROOT_HEIGHT + 2));

        let tracker = make_tracker(protocol);
        assert_eq!(tracker.last_finalized(), ROOT_HEIGHT);

        tracker.on_block_finalized(&block_id(0x02)).unwrap();
        assert_eq!(tracker.last_finalized(), ROOT_HEIGHT + 2);
        // A late, lower callback must not regress the frontier.
        tracker.on_block_finalized(&block_id(0x01)).unwrap();
        assert_eq!(tracker.last_finalized(), ROOT_HEIGHT + 2);
    }
}
