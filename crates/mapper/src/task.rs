use tessera_streamer::BlobSource;
use tessera_tracker::ProtocolState;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::{
    ctx::MapperCtx,
    error::Result,
    state::{run_transition, MapperState},
};

/// The mapper's run loop: one transition per iteration, wait-and-retry
/// on transient errors, stop on anything fatal.
///
/// Shutdown is cooperative: the current transition always completes
/// before the flag is observed, so a height is never left half-staged
/// in a way a restart could not repeat.
pub(crate) async fn mapper_task<P, S>(
    mut state: MapperState,
    ctx: MapperCtx<P, S>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    P: ProtocolState,
    S: BlobSource,
{
    loop {
        if *shutdown.borrow() {
            info!(last = state.last, "mapper stopped");
            return Ok(());
        }

        match run_transition(&mut state, &ctx) {
            Ok(()) => {}
            Err(err) if err.is_transient() => {
                debug!(step = ?state.step, "dependency unavailable, waiting");
                tokio::select! {
                    _ = tokio::time::sleep(ctx.wait_interval) => {}
                    _ = shutdown.changed() => {}
                }
            }
            Err(err) if err.is_finished() => {
                info!(last = state.last, "reached end of recorded history");
                return Ok(());
            }
            Err(err) => {
                error!(step = ?state.step, %err, "fatal mapper error");
                return Err(err);
            }
        }
    }
}
