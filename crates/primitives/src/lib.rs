//! Core data model for the Tessera archive: identifiers, chain
//! artifacts, execution records, and the shared error kinds.

mod buf;
mod chain;
mod errors;
mod execution;
mod identifiers;

pub use buf::Buf32;
pub use chain::{
    CollectionGuarantee, Event, Header, LightCollection, Seal, Transaction, TransactionResult,
};
pub use errors::ArchiveError;
pub use execution::{
    Block, BlockPayload, Collection, ExecutionRecord, RegisterEntry, RootCheckpoint, RootSnapshot,
    TrieUpdate,
};
pub use identifiers::{BlockId, CollectionId, RegisterPath, SealId, StateCommitment, TxId};

/// Height of a finalized block within the chain.
pub type Height = u64;
