use tessera_db::ProtocolDb;
use tessera_primitives::{ArchiveError, Height, RootCheckpoint, RootSnapshot};
use tessera_storage::IndexWriter;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, ArchiveError>;

/// Decodes a root protocol snapshot from its CBOR byte stream.
pub fn read_snapshot(bytes: &[u8]) -> Result<RootSnapshot> {
    ciborium::de::from_reader(bytes)
        .map_err(|err| ArchiveError::InvalidEncoding(format!("root snapshot: {err}")))
}

/// Decodes a root register checkpoint from its CBOR byte stream.
pub fn read_checkpoint(bytes: &[u8]) -> Result<RootCheckpoint> {
    ciborium::de::from_reader(bytes)
        .map_err(|err| ArchiveError::InvalidEncoding(format!("root checkpoint: {err}")))
}

/// Ingests the root snapshot into the protocol-state store and returns
/// the root height.
///
/// Idempotent: a store that already carries a root height is left
/// untouched, so re-running a bootstrapped node is a no-op.
pub fn initialize_protocol(snapshot: &RootSnapshot, protocol: &ProtocolDb) -> Result<Height> {
    if let Some(existing) = protocol.root_height()? {
        debug!(root = existing, "protocol state already initialized");
        return Ok(existing);
    }

    protocol.put_root(snapshot)?;
    protocol.flush()?;
    info!(
        root = snapshot.header.height,
        block = %snapshot.block_id,
        "ingested root protocol snapshot"
    );
    Ok(snapshot.header.height)
}

/// Streams a root checkpoint's registers into the index writer at the
/// root height. Returns the number of registers loaded.
pub fn load_checkpoint(
    checkpoint: &RootCheckpoint,
    writer: &IndexWriter,
    root_height: Height,
) -> Result<usize> {
    // Write in bounded slices so one oversized buffered batch does not
    // sit in memory on top of the decoded checkpoint.
    const CHUNK: usize = 4096;

    let mut loaded = 0;
    for entries in checkpoint.registers.chunks(CHUNK) {
        let paths: Vec<_> = entries.iter().map(|entry| entry.path).collect();
        let values: Vec<_> = entries.iter().map(|entry| entry.payload.clone()).collect();
        writer.payloads(root_height, &paths, &values)?;
        loaded += entries.len();
    }
    info!(registers = loaded, height = root_height, "loaded root checkpoint");
    Ok(loaded)
}
