//! One-shot initialization for the archive: root protocol-snapshot
//! ingestion, root-checkpoint register loading, and the catch-up
//! enumeration that lets a warm restart resume without skipping
//! finalized blocks.

mod catchup;
mod snapshot;

pub use catchup::catchup_blocks;
pub use snapshot::{initialize_protocol, load_checkpoint, read_checkpoint, read_snapshot};
