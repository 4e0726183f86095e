use std::path::Path;

use tessera_codec::{decode, encode, Encodable};
use tessera_primitives::{
    BlockId, CollectionGuarantee, Header, Height, RootSnapshot, Seal,
};

use crate::error::DbResult;

const PROTOCOL_TREE: &str = "protocol";

/// One-byte prefixes for the protocol-state tree.
///
/// The consensus follower owns this database and appends to it as
/// blocks finalize; the archive only ever reads it, except for the
/// one-shot root-snapshot ingestion.
#[derive(Debug, Clone, Copy)]
#[repr(u8)]
enum ProtocolSpace {
    /// `[1]` -> root height.
    Root = 1,
    /// `[2]` -> latest finalized height.
    Finalized = 2,
    /// `[3][height:be64]` -> block ID.
    BlockIdByHeight = 3,
    /// `[4][block_id:32]` -> height.
    HeightByBlockId = 4,
    /// `[5][block_id:32]` -> header.
    HeaderByBlockId = 5,
    /// `[6][block_id:32]` -> collection guarantees.
    GuaranteesByBlockId = 6,
    /// `[7][block_id:32]` -> seals.
    SealsByBlockId = 7,
    /// `[8]` -> final height of recorded history, if the followed
    /// history is bounded.
    EndOfHistory = 8,
}

fn marker_key(space: ProtocolSpace) -> [u8; 1] {
    [space as u8]
}

fn height_key(space: ProtocolSpace, height: Height) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = space as u8;
    key[1..].copy_from_slice(&height.to_be_bytes());
    key
}

fn id_key(space: ProtocolSpace, block_id: &BlockId) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[0] = space as u8;
    key[1..].copy_from_slice(block_id.as_slice());
    key
}

/// Read (and bootstrap-write) view of the consensus follower's
/// protocol-state database.
#[derive(Debug, Clone)]
pub struct ProtocolDb {
    db: sled::Db,
    tree: sled::Tree,
}

impl ProtocolDb {
    pub fn open(path: &Path) -> DbResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    pub fn from_db(db: sled::Db) -> DbResult<Self> {
        let tree = db.open_tree(PROTOCOL_TREE)?;
        Ok(Self { db, tree })
    }

    fn read<T: Encodable>(&self, key: impl AsRef<[u8]>) -> DbResult<Option<T>> {
        match self.tree.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // --- reads (the archive's view) ---

    pub fn root_height(&self) -> DbResult<Option<Height>> {
        self.read(marker_key(ProtocolSpace::Root))
    }

    pub fn finalized_height(&self) -> DbResult<Option<Height>> {
        self.read(marker_key(ProtocolSpace::Finalized))
    }

    /// The final height of recorded history, when the follower tracks
    /// a bounded (sealed) history rather than a live chain.
    pub fn end_of_history(&self) -> DbResult<Option<Height>> {
        self.read(marker_key(ProtocolSpace::EndOfHistory))
    }

    pub fn block_id_at(&self, height: Height) -> DbResult<Option<BlockId>> {
        self.read(height_key(ProtocolSpace::BlockIdByHeight, height))
    }

    pub fn height_for_block(&self, block_id: &BlockId) -> DbResult<Option<Height>> {
        self.read(id_key(ProtocolSpace::HeightByBlockId, block_id))
    }

    pub fn header(&self, block_id: &BlockId) -> DbResult<Option<Header>> {
        self.read(id_key(ProtocolSpace::HeaderByBlockId, block_id))
    }

    pub fn guarantees(&self, block_id: &BlockId) -> DbResult<Option<Vec<CollectionGuarantee>>> {
        self.read(id_key(ProtocolSpace::GuaranteesByBlockId, block_id))
    }

    pub fn seals(&self, block_id: &BlockId) -> DbResult<Option<Vec<Seal>>> {
        self.read(id_key(ProtocolSpace::SealsByBlockId, block_id))
    }

    // --- writes (bootstrap ingestion and the follower side) ---

    /// Ingests the root snapshot: the root markers plus the sealed root
    /// block itself. Used once against an empty store.
    pub fn put_root(&self, snapshot: &RootSnapshot) -> DbResult<()> {
        let height = snapshot.header.height;
        self.put_finalized_block(
            height,
            &snapshot.block_id,
            &snapshot.header,
            &[],
            std::slice::from_ref(&snapshot.seal),
        )?;
        self.tree
            .insert(marker_key(ProtocolSpace::Root).to_vec(), encode(&height)?)?;
        Ok(())
    }

    /// Appends one finalized block and advances the finalized marker.
    /// This is the follower's write path; the archive itself only calls
    /// it from tests and the root ingestion above.
    pub fn put_finalized_block(
        &self,
        height: Height,
        block_id: &BlockId,
        header: &Header,
        guarantees: &[CollectionGuarantee],
        seals: &[Seal],
    ) -> DbResult<()> {
        let mut batch = sled::Batch::default();
        batch.insert(
            height_key(ProtocolSpace::BlockIdByHeight, height).to_vec(),
            encode(block_id)?,
        );
        batch.insert(
            id_key(ProtocolSpace::HeightByBlockId, block_id).to_vec(),
            encode(&height)?,
        );
        batch.insert(
            id_key(ProtocolSpace::HeaderByBlockId, block_id).to_vec(),
            encode(header)?,
        );
        batch.insert(
            id_key(ProtocolSpace::GuaranteesByBlockId, block_id).to_vec(),
            encode(&guarantees.to_vec())?,
        );
        batch.insert(
            id_key(ProtocolSpace::SealsByBlockId, block_id).to_vec(),
            encode(&seals.to_vec())?,
        );
        batch.insert(
            marker_key(ProtocolSpace::Finalized).to_vec(),
            encode(&height)?,
        );
        self.tree.apply_batch(batch)?;
        Ok(())
    }

    /// Marks recorded history as complete at `height`. Written by the
    /// follower when its source has no further blocks.
    pub fn put_end_of_history(&self, height: Height) -> DbResult<()> {
        self.tree.insert(
            marker_key(ProtocolSpace::EndOfHistory).to_vec(),
            encode(&height)?,
        )?;
        Ok(())
    }

    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_primitives::{Buf32, SealId, StateCommitment};

    use super::*;

    fn setup_db() -> ProtocolDb {
        let db = sled::Config::new().temporary(true).open().unwrap();
        ProtocolDb::from_db(db).unwrap()
    }

    fn make_snapshot(height: Height) -> RootSnapshot {
        RootSnapshot {
            block_id: BlockId::from_bytes([7u8; 32]),
            header: Header {
                chain_id: "tessera-test".into(),
                height,
                parent_id: BlockId::default(),
                timestamp_ms: 1_700_000_000_000,
                payload_hash: Buf32::new([1u8; 32]),
                proposer_id: Buf32::new([2u8; 32]),
                proposer_sig: vec![],
            },
            seal: Seal {
                id: SealId::from_bytes([3u8; 32]),
                block_id: BlockId::from_bytes([7u8; 32]),
                final_state: StateCommitment::from_bytes([4u8; 32]),
            },
        }
    }

    #[test]
    fn test_empty_store_has_no_root() {
        let db = setup_db();
        assert!(db.root_height().unwrap().is_none());
        assert!(db.finalized_height().unwrap().is_none());
    }

    #[test]
    fn test_root_ingestion() {
        let db = setup_db();
        let snapshot = make_snapshot(100);
        db.put_root(&snapshot).unwrap();

        assert_eq!(db.root_height().unwrap(), Some(100));
        assert_eq!(db.finalized_height().unwrap(), Some(100));
        assert_eq!(db.block_id_at(100).unwrap(), Some(snapshot.block_id));
        assert_eq!(
            db.height_for_block(&snapshot.block_id).unwrap(),
            Some(100)
        );
        assert_eq!(db.header(&snapshot.block_id).unwrap(), Some(snapshot.header));
        assert_eq!(
            db.seals(&snapshot.block_id).unwrap(),
            Some(vec![snapshot.seal])
        );
    }

    #[test]
    fn test_end_of_history_marker() {
        let db = setup_db();
        assert!(db.end_of_history().unwrap().is_none());

        db.put_root(&make_snapshot(100)).unwrap();
        assert!(db.end_of_history().unwrap().is_none());

        db.put_end_of_history(105).unwrap();
        assert_eq!(db.end_of_history().unwrap(), Some(105));
    }

    #[test]
    fn test_finalized_marker_advances() {
        let db = setup_db();
        let snapshot = make_snapshot(100);
        db.put_root(&snapshot).unwrap();

        let next_id = BlockId::from_bytes([8u8; 32]);
        let mut header = snapshot.header.clone();
        header.height = 101;
        header.parent_id = snapshot.block_id;
        db.put_finalized_block(101, &next_id, &header, &[], &[])
            .unwrap();

        assert_eq!(db.finalized_height().unwrap(), Some(101));
        assert_eq!(db.block_id_at(101).unwrap(), Some(next_id));
        // Root marker untouched.
        assert_eq!(db.root_height().unwrap(), Some(100));
    }
}
