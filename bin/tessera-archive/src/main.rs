//! Archive node binary: wires the databases, trackers, streamer,
//! mapper, and RPC server together and supervises shutdown.

mod args;
mod follower;

use std::{fs, num::NonZeroUsize, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use tessera_bootstrap::{catchup_blocks, initialize_protocol, read_checkpoint, read_snapshot};
use tessera_db::{IndexDb, ProtocolDb};
use tessera_mapper::MapperBuilder;
use tessera_rpc::start_rpc_server;
use tessera_storage::{IndexReader, IndexWriter};
use tessera_streamer::{HttpBucket, Streamer};
use tessera_tracker::{ConsensusTracker, ExecutionTracker};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{args::Args, follower::follower_task};

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        error!("fatal: {err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // --- databases ---

    let protocol =
        Arc::new(ProtocolDb::open(&args.protocol_dir).context("open protocol-state database")?);

    if protocol.root_height()?.is_none() {
        let bootstrap_file = args
            .bootstrap_file
            .as_ref()
            .context("protocol state is empty and no --bootstrap-file was given")?;
        let bytes = fs::read(bootstrap_file).context("read root snapshot")?;
        let snapshot = read_snapshot(&bytes)?;
        initialize_protocol(&snapshot, &protocol)?;
    }

    let index = Arc::new(
        IndexDb::open_with_cache(&args.index_dir, args.db_cache_bytes)
            .context("open index database")?,
    );
    let writer = Arc::new(IndexWriter::new(
        index.clone(),
        Duration::from_millis(args.flush_interval_ms),
    ));
    let reader = IndexReader::new(index.clone());

    // --- streamer and trackers ---

    let source = Arc::new(HttpBucket::new(args.bucket_base_url.clone(), args.bucket.clone()));
    let streamer = Arc::new(Streamer::new(source, args.buffer_size));
    let cache_size =
        NonZeroUsize::new(args.record_cache_size.max(1)).expect("record cache size is positive");
    let execution = Arc::new(ExecutionTracker::new(
        streamer.clone(),
        protocol.as_ref(),
        cache_size,
    )?);
    let consensus = Arc::new(ConsensusTracker::new(protocol.clone(), execution.clone())?);

    // --- catch-up: download everything finalized while we were down ---

    let last = index.read_last()?;
    let root = protocol
        .root_height()?
        .context("protocol state lost its root marker")?;
    let catchup_from = last.unwrap_or(root);
    let catchup = catchup_blocks(protocol.as_ref(), catchup_from)?;
    streamer.seed(catchup);

    // The register checkpoint only matters for a fresh bootstrap.
    let checkpoint = match (&last, &args.root_checkpoint) {
        (None, Some(path)) => {
            let bytes = fs::read(path).context("read root checkpoint")?;
            Some(read_checkpoint(&bytes)?)
        }
        (Some(_), Some(_)) => {
            warn!("index already bootstrapped, ignoring --root-checkpoint");
            None
        }
        _ => None,
    };

    // --- tasks ---

    let (mapper_handle, mapper_task) = MapperBuilder::new(
        index.clone(),
        writer.clone(),
        consensus.clone(),
        execution.clone(),
    )
    .with_checkpoint(checkpoint)
    .with_skip_registers(args.skip_registers)
    .with_wait_interval(Duration::from_millis(args.wait_interval_ms))
    .build();
    let mut mapper = tokio::spawn(mapper_task);

    let (follower_shutdown_tx, follower_shutdown_rx) = watch::channel(false);
    let delivered = protocol
        .finalized_height()?
        .context("protocol state lost its finalized marker")?;
    let follower = tokio::spawn(follower_task(
        protocol.clone(),
        consensus.clone(),
        streamer.clone(),
        delivered,
        Duration::from_millis(args.poll_interval_ms),
        follower_shutdown_rx,
    ));

    let rpc = start_rpc_server(&args.rpc_addr, reader)
        .await
        .context("start rpc server")?;

    info!(
        index = %args.index_dir.display(),
        bucket = %args.bucket,
        rpc = %args.rpc_addr,
        "archive running"
    );

    // --- supervise ---

    let mut fatal = None;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
        result = &mut mapper => {
            match result {
                // The mapper only returns cleanly when recorded
                // history is complete.
                Ok(Ok(())) => info!("mapper completed"),
                Ok(Err(err)) => {
                    error!(%err, "mapper failed");
                    fatal = Some(anyhow::Error::new(err));
                }
                Err(err) => fatal = Some(anyhow::anyhow!("mapper task panicked: {err}")),
            }
        }
    }

    // Cancel the follower first, then the mapper (which drains its
    // current transition), then stop serving, then flush storage. A
    // second interrupt skips the orderly path.
    let _ = follower_shutdown_tx.send(true);
    mapper_handle.shutdown();

    let drain = async {
        let _ = follower.await;
        if !mapper.is_finished() {
            let _ = mapper.await;
        }
    };
    tokio::select! {
        _ = drain => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("second interrupt, terminating immediately");
            std::process::exit(1);
        }
    }

    if rpc.stop().is_err() {
        warn!("rpc server already stopped");
    }
    rpc.stopped().await;

    writer.close().await.context("close index writer")?;
    protocol.flush()?;

    match fatal {
        Some(err) => Err(err),
        None => {
            info!("clean shutdown");
            Ok(())
        }
    }
}
