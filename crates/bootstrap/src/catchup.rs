use tessera_primitives::{ArchiveError, BlockId, Height};
use tessera_tracker::ProtocolState;
use tracing::info;

/// Enumerates the block IDs in `(last, finalized]`, oldest first.
///
/// A warm restart pre-seeds the streamer's download queue with this
/// list, so blocks that finalized while the process was down are
/// downloaded before any new finalization callback arrives.
pub fn catchup_blocks(
    protocol: &impl ProtocolState,
    last: Height,
) -> Result<Vec<BlockId>, ArchiveError> {
    let finalized = protocol.finalized_height()?;
    if finalized <= last {
        return Ok(Vec::new());
    }

    let mut block_ids = Vec::with_capacity((finalized - last) as usize);
    for height in (last + 1)..=finalized {
        block_ids.push(protocol.block_id_at(height)?);
    }
    info!(
        from = last + 1,
        to = finalized,
        blocks = block_ids.len(),
        "enumerated catch-up blocks"
    );
    Ok(block_ids)
}
