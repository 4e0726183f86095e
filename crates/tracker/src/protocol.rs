use tessera_db::ProtocolDb;
use tessera_primitives::{ArchiveError, BlockId, CollectionGuarantee, Header, Height, Seal};

type Result<T> = std::result::Result<T, ArchiveError>;

/// Read-only view of the protocol-state store the consensus follower
/// populates as blocks finalize.
///
/// Misses are [`ArchiveError::NotFound`]; the trackers decide when a
/// miss really means "not yet" and translate accordingly.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait ProtocolState: Send + Sync + 'static {
    /// The height the chain history starts from.
    fn root_height(&self) -> Result<Height>;

    /// The latest height the follower has finalized.
    fn finalized_height(&self) -> Result<Height>;

    /// The final height of recorded history, if the followed history
    /// is bounded. `None` means the chain is live and unbounded.
    fn end_of_history(&self) -> Result<Option<Height>>;

    fn block_id_at(&self, height: Height) -> Result<BlockId>;

    fn height_for_block(&self, block_id: &BlockId) -> Result<Height>;

    fn header(&self, block_id: &BlockId) -> Result<Header>;

    fn guarantees(&self, block_id: &BlockId) -> Result<Vec<CollectionGuarantee>>;

    fn seals(&self, block_id: &BlockId) -> Result<Vec<Seal>>;
}

impl ProtocolState for ProtocolDb {
    fn root_height(&self) -> Result<Height> {
        ProtocolDb::root_height(self)?.ok_or(ArchiveError::NotFound)
    }

    fn finalized_height(&self) -> Result<Height> {
        ProtocolDb::finalized_height(self)?.ok_or(ArchiveError::NotFound)
    }

    fn end_of_history(&self) -> Result<Option<Height>> {
        Ok(ProtocolDb::end_of_history(self)?)
    }

    fn block_id_at(&self, height: Height) -> Result<BlockId> {
        ProtocolDb::block_id_at(self, height)?.ok_or(ArchiveError::NotFound)
    }

    fn height_for_block(&self, block_id: &BlockId) -> Result<Height> {
        ProtocolDb::height_for_block(self, block_id)?.ok_or(ArchiveError::NotFound)
    }

    fn header(&self, block_id: &BlockId) -> Result<Header> {
        ProtocolDb::header(self, block_id)?.ok_or(ArchiveError::NotFound)
    }

    fn guarantees(&self, block_id: &BlockId) -> Result<Vec<CollectionGuarantee>> {
        ProtocolDb::guarantees(self, block_id)?.ok_or(ArchiveError::NotFound)
    }

    fn seals(&self, block_id: &BlockId) -> Result<Vec<Seal>> {
        ProtocolDb::seals(self, block_id)?.ok_or(ArchiveError::NotFound)
    }
}
