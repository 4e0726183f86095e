use std::{sync::Arc, time::Duration};

use tessera_db::IndexDb;
use tessera_primitives::Height;
use tessera_storage::IndexWriter;
use tessera_streamer::BlobSource;
use tessera_tracker::{ConsensusTracker, ExecutionTracker, ProtocolState};
use tokio::sync::watch;

/// Shared handles and tunables for the mapper task.
pub(crate) struct MapperCtx<P, S> {
    pub(crate) index: Arc<IndexDb>,
    pub(crate) writer: Arc<IndexWriter>,
    pub(crate) consensus: Arc<ConsensusTracker<P, S>>,
    pub(crate) execution: Arc<ExecutionTracker<S>>,
    /// Persist commits and chain artifacts but skip register mapping.
    pub(crate) skip_registers: bool,
    /// Backoff before retrying a transition that hit `Unavailable`.
    pub(crate) wait_interval: Duration,
    pub(crate) height_tx: watch::Sender<Height>,
}

impl<P: ProtocolState, S: BlobSource> MapperCtx<P, S> {
    /// Notifies watchers that `height` is fully indexed.
    pub(crate) fn notify_indexed(&self, height: Height) {
        let _ = self.height_tx.send(height);
    }
}
