//! Trackers feeding the mapper: the execution tracker turns the
//! streamed records into sequential trie updates and a per-block
//! record lookup, and the consensus tracker exposes the finalized
//! chain's artifacts per height.

mod consensus;
mod execution;
mod protocol;

pub use consensus::ConsensusTracker;
pub use execution::ExecutionTracker;
pub use protocol::ProtocolState;

#[cfg(any(test, feature = "test-utils"))]
pub use protocol::MockProtocolState;
