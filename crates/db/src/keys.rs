use tessera_primitives::{Height, RegisterPath};

/// One-byte prefixes partitioning the index tree into disjoint key
/// spaces. Every logical operation owns exactly one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeySpace {
    /// `[1]` -> height. The root height indexing started from.
    First = 1,
    /// `[2]` -> height. The greatest fully indexed height.
    Last = 2,
    /// `[3][block_id:32]` -> height.
    HeightByBlock = 3,
    /// `[4][tx_id:32]` -> height.
    HeightByTx = 4,
    /// `[5][height:be64]` -> state commitment.
    Commit = 5,
    /// `[6][height:be64]` -> header.
    Header = 6,
    /// `[7][height:be64][event_type:var]` -> events of that type,
    /// ordered by `(tx_index, event_index)`. The variable suffix keeps
    /// a height's events sorted by type for prefix filtering.
    Events = 7,
    /// `[8][height:be64]` -> seal ID list.
    SealsAtHeight = 8,
    /// `[9][height:be64]` -> collection ID list.
    CollectionsAtHeight = 9,
    /// `[10][height:be64]` -> transaction ID list.
    TransactionsAtHeight = 10,
    /// `[11][height:be64]` -> transaction ID list of produced results.
    ResultsAtHeight = 11,
    /// `[12][collection_id:32]` -> collection guarantee.
    Guarantee = 12,
    /// `[13][tx_id:32]` -> transaction body.
    Transaction = 13,
    /// `[14][tx_id:32]` -> transaction result.
    Result = 14,
    /// `[15][seal_id:32]` -> seal.
    Seal = 15,
    /// `[16][collection_id:32]` -> light collection.
    Collection = 16,
}

/// Key for a singleton marker (`First`, `Last`).
pub(crate) fn marker_key(space: KeySpace) -> [u8; 1] {
    [space as u8]
}

/// Key for a per-height artifact.
pub(crate) fn height_key(space: KeySpace, height: Height) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = space as u8;
    key[1..].copy_from_slice(&height.to_be_bytes());
    key
}

/// Key for a per-ID artifact.
pub(crate) fn id_key(space: KeySpace, id: impl AsRef<[u8]>) -> Vec<u8> {
    let id = id.as_ref();
    let mut key = Vec::with_capacity(1 + id.len());
    key.push(space as u8);
    key.extend_from_slice(id);
    key
}

/// Key for the events of one type at one height.
pub(crate) fn event_key(height: Height, event_type: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(9 + event_type.len());
    key.push(KeySpace::Events as u8);
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(event_type.as_bytes());
    key
}

/// Prefix covering every event type at one height.
pub(crate) fn events_prefix(height: Height) -> [u8; 9] {
    height_key(KeySpace::Events, height)
}

/// Register tree key: `[path:32][height:be64]`. Versions of one path
/// are adjacent and height-ordered, so a point-in-time read is a
/// single reverse seek.
pub(crate) fn register_key(path: &RegisterPath, height: Height) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..32].copy_from_slice(path.as_slice());
    key[32..].copy_from_slice(&height.to_be_bytes());
    key
}
