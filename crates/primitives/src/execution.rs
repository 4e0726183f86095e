use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    buf::Buf32,
    chain::{CollectionGuarantee, Event, Header, LightCollection, Seal, Transaction,
        TransactionResult},
    errors::ArchiveError,
    identifiers::{BlockId, RegisterPath, StateCommitment},
};

/// A batch of register writes produced by executing one block.
///
/// Consecutive updates chain by `root_hash`: the root an update starts
/// from is the root the previous update produced.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TrieUpdate {
    pub root_hash: Buf32,
    pub paths: Vec<RegisterPath>,
    pub payloads: Vec<Vec<u8>>,
}

impl TrieUpdate {
    /// Checks the structural invariant that paths and payloads pair up.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.paths.len() != self.payloads.len() {
            return Err(ArchiveError::InvalidEncoding(format!(
                "trie update has {} paths but {} payloads",
                self.paths.len(),
                self.payloads.len()
            )));
        }
        Ok(())
    }
}

/// The consensus payload carried inside an execution record's block.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BlockPayload {
    pub guarantees: Vec<CollectionGuarantee>,
    pub seals: Vec<Seal>,
}

/// A block as transported inside an execution record: the header plus
/// the ID the chain assigned to it and the consensus payload.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub header: Header,
    pub payload: BlockPayload,
}

/// A guaranteed collection together with its transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Collection {
    pub guarantee: CollectionGuarantee,
    pub transactions: Vec<Transaction>,
}

impl Collection {
    /// Reduces the collection to its transaction IDs.
    pub fn to_light(&self) -> LightCollection {
        LightCollection {
            id: self.guarantee.collection_id,
            transaction_ids: self.transactions.iter().map(|tx| tx.id).collect(),
        }
    }
}

/// The per-block bundle of execution outputs transported out-of-band
/// from consensus.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub block: Block,
    pub collections: Vec<Collection>,
    pub tx_results: Vec<TransactionResult>,
    pub events: Vec<Event>,
    pub trie_updates: Vec<TrieUpdate>,
    pub final_state_commitment: StateCommitment,
}

impl ExecutionRecord {
    pub fn block_id(&self) -> BlockId {
        self.block.id
    }

    pub fn height(&self) -> u64 {
        self.block.header.height
    }

    /// Validates the mandatory wire-format constraints: a non-zero
    /// final state commitment, a non-zero height, and paired trie
    /// update columns. Other fields may be empty.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.final_state_commitment.is_zero() {
            return Err(ArchiveError::InvalidEncoding(
                "execution record carries a zero final state commitment".into(),
            ));
        }
        if self.block.header.height == 0 {
            return Err(ArchiveError::InvalidEncoding(
                "execution record carries a zero block height".into(),
            ));
        }
        for update in &self.trie_updates {
            update.validate()?;
        }
        Ok(())
    }
}

/// A single `(path, payload)` register cell, as serialized in root
/// checkpoints and returned from register queries.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RegisterEntry {
    pub path: RegisterPath,
    pub payload: Vec<u8>,
}

/// The root protocol snapshot: the sealed block the chain history
/// starts from. Ingested once into an empty protocol-state store.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RootSnapshot {
    pub block_id: BlockId,
    pub header: Header,
    pub seal: Seal,
}

/// A serialized snapshot of the full register set at the root height.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RootCheckpoint {
    pub registers: Vec<RegisterEntry>,
}
