use std::collections::BTreeMap;

use tessera_bootstrap::load_checkpoint;
use tessera_primitives::{
    ArchiveError, Height, RegisterPath, RootCheckpoint, StateCommitment,
};
use tessera_streamer::BlobSource;
use tessera_tracker::ProtocolState;
use tracing::{debug, info};

use crate::{ctx::MapperCtx, error::Result};

/// The mapper's position in its processing cycle.
///
/// `Initialize` runs once and picks `Bootstrap` (empty index) or
/// `Resume` (markers present); after that the machine cycles
/// `Index -> Update -> Collect -> Map -> Forward` once per height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Initialize,
    Bootstrap,
    Resume,
    Index,
    Update,
    Collect,
    Map,
    Forward,
}

/// Mutable state carried across transitions.
pub(crate) struct MapperState {
    pub(crate) step: Step,
    pub(crate) last: Height,
    /// Root register checkpoint, consumed by `Bootstrap`.
    pub(crate) checkpoint: Option<RootCheckpoint>,
    /// Whether the current height's record carries trie updates.
    pub(crate) expect_updates: bool,
    /// State commitment of the last indexed height; the next trie
    /// update batch must start from this root.
    pub(crate) prev_commit: Option<StateCommitment>,
    /// State commitment of the height currently being indexed, staged
    /// in `Update` and promoted to `prev_commit` by `Forward`.
    pub(crate) commit: Option<StateCommitment>,
    /// Register writes accumulated for the current height,
    /// last-write-wins per path.
    pub(crate) registers: BTreeMap<RegisterPath, Vec<u8>>,
}

impl MapperState {
    pub(crate) fn new(checkpoint: Option<RootCheckpoint>) -> Self {
        Self {
            step: Step::Initialize,
            last: 0,
            checkpoint,
            expect_updates: false,
            prev_commit: None,
            commit: None,
            registers: BTreeMap::new(),
        }
    }

    /// The height currently being indexed.
    fn current(&self) -> Height {
        self.last + 1
    }
}

/// Runs one transition, mutating the state on success. A transient
/// error leaves the state untouched so the retry repeats the same
/// transition.
pub(crate) fn run_transition<P, S>(state: &mut MapperState, ctx: &MapperCtx<P, S>) -> Result<()>
where
    P: ProtocolState,
    S: BlobSource,
{
    match state.step {
        Step::Initialize => initialize(state, ctx),
        Step::Bootstrap => bootstrap(state, ctx),
        Step::Resume => resume(state, ctx),
        Step::Index => index(state, ctx),
        Step::Update => update(state, ctx),
        Step::Collect => collect(state, ctx),
        Step::Map => map(state, ctx),
        Step::Forward => forward(state, ctx),
    }
}

/// Chooses bootstrap or resume based on the presence of `last`.
fn initialize<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    match ctx.index.read_last().map_err(ArchiveError::from)? {
        Some(last) => {
            debug!(last, "index has history, resuming");
            state.step = Step::Resume;
        }
        None => {
            debug!("index is empty, bootstrapping");
            state.step = Step::Bootstrap;
        }
    }
    Ok(())
}

/// Indexes the sealed root block and loads the register checkpoint.
/// The root is the only height whose artifacts come from the synthetic
/// record instead of a downloaded one.
fn bootstrap<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    let root = ctx.consensus.root()?;
    let block_id = ctx.consensus.block_id(root)?;
    let header = ctx.consensus.header(root)?;
    let seals = ctx.consensus.seals(root)?;
    let commit = ctx.consensus.commit(root)?;

    ctx.writer.first(root)?;
    ctx.writer.header(root, &header)?;
    ctx.writer.commit(root, &commit)?;
    ctx.writer.height_for_block(&block_id, root)?;
    ctx.writer.seals(root, &seals)?;
    ctx.writer.events(root, &[])?;
    ctx.writer.collections(root, &[])?;
    ctx.writer.transactions(root, &[])?;
    ctx.writer.results(root, &[])?;

    if let Some(checkpoint) = state.checkpoint.take() {
        load_checkpoint(&checkpoint, &ctx.writer, root)?;
    }

    ctx.writer.last(root)?;
    state.last = root;
    state.prev_commit = Some(commit);
    ctx.notify_indexed(root);
    info!(root, %block_id, "bootstrapped archive at root height");

    state.step = Step::Index;
    Ok(())
}

/// Picks the indexing frontier back up from the stored markers.
fn resume<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    let last = ctx
        .index
        .read_last()
        .map_err(ArchiveError::from)?
        .ok_or(ArchiveError::NotFound)?;
    // The frontier height's commit anchors the trie-update chain for
    // the next height.
    let commit = ctx
        .index
        .commit(last)
        .map_err(ArchiveError::from)?
        .ok_or(ArchiveError::NotFound)?;
    state.last = last;
    state.prev_commit = Some(commit);
    ctx.notify_indexed(last);
    info!(last, "resumed archive from stored frontier");

    state.step = Step::Index;
    Ok(())
}

/// Writes every chain artifact for the next height.
fn index<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    let height = state.current();

    let block_id = ctx.consensus.block_id(height)?;
    let header = ctx.consensus.header(height)?;
    let guarantees = ctx.consensus.guarantees(height)?;
    let seals = ctx.consensus.seals(height)?;
    let collections = ctx.consensus.collections(height)?;
    let transactions = ctx.consensus.transactions(height)?;
    let results = ctx.consensus.results(height)?;
    let events = ctx.consensus.events(height)?;

    let light: Vec<_> = collections.iter().map(|coll| coll.to_light()).collect();

    ctx.writer.header(height, &header)?;
    ctx.writer.height_for_block(&block_id, height)?;
    ctx.writer.guarantees(&guarantees)?;
    ctx.writer.seals(height, &seals)?;
    ctx.writer.collections(height, &light)?;
    ctx.writer.transactions(height, &transactions)?;
    ctx.writer.results(height, &results)?;
    ctx.writer.events(height, &events)?;

    debug!(
        height,
        collections = light.len(),
        transactions = transactions.len(),
        events = events.len(),
        "indexed chain artifacts"
    );

    state.step = Step::Update;
    Ok(())
}

/// Writes the execution commit and decides whether register mapping
/// applies to this height.
fn update<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    let height = state.current();

    let commit = ctx.consensus.commit(height)?;
    ctx.writer.commit(height, &commit)?;
    state.commit = Some(commit);

    if ctx.skip_registers {
        // The records consumed above still queued their updates; drop
        // them so the queue does not grow with the chain.
        ctx.execution.drain_updates();
        state.step = Step::Forward;
        return Ok(());
    }

    let block_id = ctx.consensus.block_id(height)?;
    let record = ctx.execution.record(&block_id)?;
    state.expect_updates = !record.trie_updates.is_empty();

    state.step = Step::Collect;
    Ok(())
}

/// Pulls this height's trie-update batch and accumulates the register
/// writes, later updates overriding earlier ones within the height.
fn collect<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    state.registers.clear();

    if !state.expect_updates {
        state.step = Step::Map;
        return Ok(());
    }

    let batch = ctx.execution.all_updates()?;

    // The batch must pick up exactly where the previous height's
    // sealed state left off; anything else means the record stream
    // and the chain view diverged.
    let expected = state
        .prev_commit
        .ok_or_else(|| ArchiveError::storage("previous state commitment unknown"))?;
    let actual = batch
        .first()
        .map(|update| update.root_hash)
        .unwrap_or_default();
    if actual != *expected.inner() {
        return Err(ArchiveError::MismatchedRootHash {
            expected: *expected.inner(),
            actual,
        }
        .into());
    }

    for update in &batch {
        for (path, payload) in update.paths.iter().zip(&update.payloads) {
            state.registers.insert(*path, payload.clone());
        }
    }

    state.step = Step::Map;
    Ok(())
}

/// Flushes the accumulated register map to the store, one physical
/// version per `(path, height)`.
fn map<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    let height = state.current();

    if !state.registers.is_empty() {
        let paths: Vec<_> = state.registers.keys().copied().collect();
        let values: Vec<_> = state.registers.values().cloned().collect();
        ctx.writer.payloads(height, &paths, &values)?;
        debug!(height, registers = paths.len(), "mapped register writes");
    }
    state.registers.clear();

    state.step = Step::Forward;
    Ok(())
}

/// Advances the frontier; the commit point for the height.
fn forward<P: ProtocolState, S: BlobSource>(
    state: &mut MapperState,
    ctx: &MapperCtx<P, S>,
) -> Result<()> {
    let height = state.current();

    ctx.writer.last(height)?;
    state.last = height;
    state.expect_updates = false;
    state.prev_commit = state.commit.take();
    ctx.notify_indexed(height);
    info!(height, "forwarded indexing frontier");

    state.step = Step::Index;
    Ok(())
}
