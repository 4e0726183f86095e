use std::{sync::Arc, time::Duration};

use tessera_db::ProtocolDb;
use tessera_primitives::Height;
use tessera_streamer::{BlobSource, Streamer};
use tessera_tracker::ConsensusTracker;
use tokio::sync::watch;
use tracing::{info, trace, warn};

/// Adapter between the external consensus follower and the archive.
///
/// The follower itself is a black box that appends to the
/// protocol-state store; this task watches the finalized marker and
/// replays each newly finalized block, in height order, as the
/// `on_block_finalized` callbacks the trackers and streamer expect.
pub(crate) async fn follower_task<S: BlobSource>(
    protocol: Arc<ProtocolDb>,
    consensus: Arc<ConsensusTracker<ProtocolDb, S>>,
    streamer: Arc<Streamer<S>>,
    mut delivered: Height,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = shutdown.changed() => {}
        }
        if *shutdown.borrow() {
            return;
        }

        let finalized = match protocol.finalized_height() {
            Ok(Some(finalized)) => finalized,
            Ok(None) => continue,
            Err(err) => {
                warn!(%err, "failed to read finalized height");
                continue;
            }
        };

        while delivered < finalized {
            let next = delivered + 1;
            let block_id = match protocol.block_id_at(next) {
                Ok(Some(block_id)) => block_id,
                Ok(None) => {
                    // The follower bumped the marker before the block
                    // row landed; pick it up on the next poll.
                    warn!(height = next, "finalized block not in protocol state yet");
                    break;
                }
                Err(err) => {
                    warn!(height = next, %err, "failed to resolve finalized block");
                    break;
                }
            };

            streamer.on_block_finalized(block_id);
            if let Err(err) = consensus.on_block_finalized(&block_id) {
                warn!(height = next, %err, "consensus tracker rejected finalization");
                break;
            }
            trace!(height = next, %block_id, "delivered finalization");
            delivered = next;
        }

        // A bounded history has nothing to poll for once every block
        // up to its end has been delivered.
        if let Ok(Some(end)) = protocol.end_of_history() {
            if delivered >= end {
                info!(end, "recorded history fully delivered, follower done");
                return;
            }
        }
    }
}
