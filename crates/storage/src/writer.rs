use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tessera_db::{IndexBatch, IndexDb};
use tessera_primitives::{
    BlockId, CollectionGuarantee, Event, Header, Height, LightCollection, RegisterPath, Seal,
    StateCommitment, Transaction, TransactionResult,
};
use tracing::{debug, error, trace};

use crate::error::StorageError;

type Result<T> = std::result::Result<T, StorageError>;

/// Buffered writer in front of the index database.
///
/// Mutations accumulate in memory and are applied in one atomic batch
/// per tree, either when the background flusher's interval elapses or
/// when [`IndexWriter::close`] runs. The mapper is the only caller;
/// `close` is safe to race with the flusher and with itself.
#[derive(Debug)]
pub struct IndexWriter {
    inner: Arc<WriterInner>,
    flusher: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[derive(Debug)]
struct WriterInner {
    db: Arc<IndexDb>,
    pending: Mutex<IndexBatch>,
    /// Serializes drain-and-apply so a periodic flush racing a close
    /// cannot apply batches out of order.
    flush_lock: Mutex<()>,
    closed: AtomicBool,
}

impl WriterInner {
    /// Drains the pending buffer and applies it, followed by a durable
    /// engine flush. No-op when nothing is buffered.
    fn flush_once(&self) -> Result<()> {
        let _guard = self.flush_lock.lock();
        let batch = {
            let mut pending = self.pending.lock();
            if pending.is_empty() {
                return Ok(());
            }
            std::mem::take(&mut *pending)
        };
        let staged = batch.len();
        self.db.apply(batch)?;
        self.db.flush()?;
        trace!(mutations = staged, "flushed index batch");
        Ok(())
    }

    fn buffer<F>(&self, stage: F) -> Result<()>
    where
        F: FnOnce(&mut IndexBatch) -> std::result::Result<(), tessera_db::DbError>,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        let mut pending = self.pending.lock();
        stage(&mut pending)?;
        Ok(())
    }
}

impl IndexWriter {
    /// Creates the writer and spawns its background flusher.
    pub fn new(db: Arc<IndexDb>, flush_interval: Duration) -> Self {
        let inner = Arc::new(WriterInner {
            db,
            pending: Mutex::new(IndexBatch::new()),
            flush_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        });

        let flusher = tokio::spawn(flusher_task(inner.clone(), flush_interval));

        Self {
            inner,
            flusher: Mutex::new(Some(flusher)),
        }
    }

    // --- height markers ---

    pub fn first(&self, height: Height) -> Result<()> {
        self.inner.buffer(|batch| batch.put_first(height))
    }

    pub fn last(&self, height: Height) -> Result<()> {
        self.inner.buffer(|batch| batch.put_last(height))
    }

    // --- per-height artifacts ---

    pub fn height_for_block(&self, block_id: &BlockId, height: Height) -> Result<()> {
        self.inner
            .buffer(|batch| batch.put_height_for_block(block_id, height))
    }

    pub fn commit(&self, height: Height, commit: &StateCommitment) -> Result<()> {
        self.inner.buffer(|batch| batch.put_commit(height, commit))
    }

    pub fn header(&self, height: Height, header: &Header) -> Result<()> {
        self.inner.buffer(|batch| batch.put_header(height, header))
    }

    pub fn events(&self, height: Height, events: &[Event]) -> Result<()> {
        self.inner.buffer(|batch| batch.put_events(height, events))
    }

    /// Buffers one register version per path for this height.
    pub fn payloads(
        &self,
        height: Height,
        paths: &[RegisterPath],
        values: &[Vec<u8>],
    ) -> Result<()> {
        if paths.len() != values.len() {
            return Err(StorageError::MismatchedColumns(paths.len(), values.len()));
        }
        self.inner.buffer(|batch| {
            for (path, value) in paths.iter().zip(values) {
                batch.put_register(path, height, value)?;
            }
            Ok(())
        })
    }

    /// Buffers the light collections and the per-height collection
    /// list.
    pub fn collections(&self, height: Height, collections: &[LightCollection]) -> Result<()> {
        self.inner.buffer(|batch| {
            let ids = collections.iter().map(|coll| coll.id).collect();
            batch.put_collections_at_height(height, &ids)?;
            for collection in collections {
                batch.put_collection(collection)?;
            }
            Ok(())
        })
    }

    pub fn guarantees(&self, guarantees: &[CollectionGuarantee]) -> Result<()> {
        self.inner.buffer(|batch| {
            for guarantee in guarantees {
                batch.put_guarantee(guarantee)?;
            }
            Ok(())
        })
    }

    /// Buffers transaction bodies, the per-height list, and the
    /// tx-to-height lookup index.
    pub fn transactions(&self, height: Height, transactions: &[Transaction]) -> Result<()> {
        self.inner.buffer(|batch| {
            let ids: Vec<_> = transactions.iter().map(|tx| tx.id).collect();
            batch.put_transactions_at_height(height, &ids)?;
            for transaction in transactions {
                batch.put_transaction(transaction)?;
                batch.put_height_for_tx(&transaction.id, height)?;
            }
            Ok(())
        })
    }

    pub fn results(&self, height: Height, results: &[TransactionResult]) -> Result<()> {
        self.inner.buffer(|batch| {
            let ids = results.iter().map(|result| result.tx_id).collect();
            batch.put_results_at_height(height, &ids)?;
            for result in results {
                batch.put_result(result)?;
            }
            Ok(())
        })
    }

    pub fn seals(&self, height: Height, seals: &[Seal]) -> Result<()> {
        self.inner.buffer(|batch| {
            let ids = seals.iter().map(|seal| seal.id).collect();
            batch.put_seals_at_height(height, &ids)?;
            for seal in seals {
                batch.put_seal(seal)?;
            }
            Ok(())
        })
    }

    /// Forces the buffered mutations to disk now.
    pub async fn flush(&self) -> Result<()> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.flush_once())
            .await
            .map_err(|err| StorageError::Background(err.to_string()))?
    }

    /// Drains the buffer, blocks on the final batch, and stops the
    /// flusher. Idempotent: a second close returns without flushing
    /// again.
    pub async fn close(&self) -> Result<()> {
        if self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("index writer already closed");
            return Ok(());
        }

        // A flush already running inside the task completes; the flush
        // lock keeps it ordered before the final drain below.
        if let Some(handle) = self.flusher.lock().take() {
            handle.abort();
        }

        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            inner.flush_once()?;
            inner.db.close()?;
            Ok(())
        })
        .await
        .map_err(|err| StorageError::Background(err.to_string()))?
    }
}

async fn flusher_task(inner: Arc<WriterInner>, flush_interval: Duration) {
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if inner.closed.load(Ordering::Acquire) {
            return;
        }
        let flush = {
            let inner = inner.clone();
            tokio::task::spawn_blocking(move || inner.flush_once()).await
        };
        match flush {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(%err, "periodic index flush failed"),
            Err(err) => error!(%err, "index flusher task join failed"),
        }
    }
}
