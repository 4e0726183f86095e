use std::{future::Future, sync::Arc, time::Duration};

use tessera_db::IndexDb;
use tessera_primitives::{Height, RootCheckpoint};
use tessera_storage::IndexWriter;
use tessera_streamer::BlobSource;
use tessera_tracker::{ConsensusTracker, ExecutionTracker, ProtocolState};
use tokio::sync::watch;

use crate::{
    ctx::MapperCtx,
    error::MapperError,
    state::MapperState,
    task::mapper_task,
};

/// Default backoff before retrying a transition that hit
/// `Unavailable`.
const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_millis(250);

/// Handle for observing and stopping a running mapper.
#[derive(Debug)]
pub struct MapperHandle {
    height_rx: watch::Receiver<Height>,
    shutdown_tx: watch::Sender<bool>,
}

impl MapperHandle {
    /// Watcher over the indexed-height frontier. The initial value is
    /// 0 until the mapper bootstraps or resumes.
    pub fn height_watcher(&self) -> watch::Receiver<Height> {
        self.height_rx.clone()
    }

    /// Asks the mapper to stop after its current transition.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Builder wiring the mapper task to its collaborators.
#[expect(
    missing_debug_implementations,
    reason = "the trackers have no Debug implementation"
)]
pub struct MapperBuilder<P, S> {
    index: Arc<IndexDb>,
    writer: Arc<IndexWriter>,
    consensus: Arc<ConsensusTracker<P, S>>,
    execution: Arc<ExecutionTracker<S>>,
    checkpoint: Option<RootCheckpoint>,
    skip_registers: bool,
    wait_interval: Option<Duration>,
}

impl<P, S> MapperBuilder<P, S> {
    pub fn new(
        index: Arc<IndexDb>,
        writer: Arc<IndexWriter>,
        consensus: Arc<ConsensusTracker<P, S>>,
        execution: Arc<ExecutionTracker<S>>,
    ) -> Self {
        Self {
            index,
            writer,
            consensus,
            execution,
            checkpoint: None,
            skip_registers: false,
            wait_interval: None,
        }
    }

    /// Root register checkpoint to load during bootstrap.
    pub fn with_checkpoint(mut self, checkpoint: Option<RootCheckpoint>) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Skip the register states, keeping only commits and chain
    /// artifacts.
    pub fn with_skip_registers(mut self, skip: bool) -> Self {
        self.skip_registers = skip;
        self
    }

    pub fn with_wait_interval(mut self, interval: Duration) -> Self {
        self.wait_interval = Some(interval);
        self
    }

    /// Builds the handle and the task future to spawn.
    pub fn build(self) -> (MapperHandle, impl Future<Output = Result<(), MapperError>>)
    where
        P: ProtocolState,
        S: BlobSource,
    {
        let (height_tx, height_rx) = watch::channel(0);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = MapperHandle {
            height_rx,
            shutdown_tx,
        };
        let ctx = MapperCtx {
            index: self.index,
            writer: self.writer,
            consensus: self.consensus,
            execution: self.execution,
            skip_registers: self.skip_registers,
            wait_interval: self.wait_interval.unwrap_or(DEFAULT_WAIT_INTERVAL),
            height_tx,
        };
        let state = MapperState::new(self.checkpoint);
        let task = mapper_task(state, ctx, shutdown_rx);

        (handle, task)
    }
}
