use std::path::PathBuf;

use clap::Parser;

/// Historical chain archive and query service.
#[derive(Debug, Parser)]
#[command(name = "tessera-archive", version)]
pub(crate) struct Args {
    /// Directory for the index database.
    #[arg(long, default_value = "data/index")]
    pub index_dir: PathBuf,

    /// Directory of the consensus follower's protocol-state database.
    #[arg(long, default_value = "data/protocol")]
    pub protocol_dir: PathBuf,

    /// Blob-store bucket holding the execution records.
    #[arg(long)]
    pub bucket: String,

    /// Base URL of the blob store.
    #[arg(long, default_value = "https://storage.googleapis.com")]
    pub bucket_base_url: String,

    /// Root protocol snapshot (CBOR file). Required on first start
    /// against an empty protocol-state store.
    #[arg(long)]
    pub bootstrap_file: Option<PathBuf>,

    /// Root register checkpoint (CBOR file), loaded during bootstrap.
    #[arg(long)]
    pub root_checkpoint: Option<PathBuf>,

    /// Interval between index flushes, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub flush_interval_ms: u64,

    /// Backoff before retrying an unavailable dependency, in
    /// milliseconds.
    #[arg(long, default_value_t = 250)]
    pub wait_interval_ms: u64,

    /// Index commits and chain artifacts but skip execution registers.
    #[arg(long)]
    pub skip_registers: bool,

    /// Bound on cached execution records.
    #[arg(long, default_value_t = 60)]
    pub record_cache_size: usize,

    /// Engine cache budget for the index database, in bytes.
    #[arg(long, default_value_t = 1 << 30)]
    pub db_cache_bytes: u64,

    /// Bound on downloaded-but-unconsumed execution records.
    #[arg(long, default_value_t = 8)]
    pub buffer_size: usize,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:9000")]
    pub rpc_addr: String,

    /// Interval between protocol-state polls by the follower adapter,
    /// in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub poll_interval_ms: u64,
}
