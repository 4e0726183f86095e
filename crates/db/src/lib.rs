//! On-disk layout for the archive: an ordered key/value schema over
//! sled, split into an index tree (chain artifacts, height markers,
//! lookup indexes) and a register tree (versioned execution state).
//!
//! All multi-byte integers in keys are big-endian so lexicographic key
//! order equals numeric order, which makes every range scan monotone.

mod batch;
mod db;
mod error;
mod keys;
mod protocol;

pub use batch::IndexBatch;
pub use db::IndexDb;
pub use error::{DbError, DbResult};
pub use keys::KeySpace;
pub use protocol::ProtocolDb;
