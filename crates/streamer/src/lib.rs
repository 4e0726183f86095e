//! Best-effort downloader of execution records from a blob store,
//! preserving block finalization order end to end.

mod blob;
mod streamer;

pub use blob::{BlobError, BlobSource, HttpBucket};
pub use streamer::Streamer;

#[cfg(any(test, feature = "test-utils"))]
pub use blob::MockBlobSource;
