use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    buf::Buf32,
    identifiers::{BlockId, CollectionId, SealId, StateCommitment, TxId},
};

/// Metadata of a finalized block.
///
/// The header does not carry its own identifier; a block's ID is the
/// content hash of the header, computed by the producing chain and
/// carried alongside wherever a header travels.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Header {
    pub chain_id: String,
    pub height: u64,
    pub parent_id: BlockId,
    /// Millisecond unix timestamp assigned by the proposer.
    pub timestamp_ms: u64,
    pub payload_hash: Buf32,
    pub proposer_id: Buf32,
    pub proposer_sig: Vec<u8>,
}

/// A signed commitment to a collection of transactions.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct CollectionGuarantee {
    pub collection_id: CollectionId,
    pub reference_block_id: BlockId,
    pub signer_indices: Vec<u8>,
    pub signature: Vec<u8>,
}

/// A collection reduced to the transaction IDs it contains.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct LightCollection {
    pub id: CollectionId,
    pub transaction_ids: Vec<TxId>,
}

/// A submitted transaction body.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub reference_block_id: BlockId,
    pub script: Vec<u8>,
    pub arguments: Vec<Vec<u8>>,
    pub gas_limit: u64,
    pub payer: Vec<u8>,
}

/// The execution outcome of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TransactionResult {
    pub tx_id: TxId,
    /// Empty on success, the execution error message otherwise.
    pub error_message: String,
}

impl TransactionResult {
    pub fn succeeded(&self) -> bool {
        self.error_message.is_empty()
    }
}

/// A structured log entry emitted during block execution.
///
/// Events are totally ordered within their block by
/// `(event_type, tx_index, event_index)`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub tx_index: u32,
    pub event_index: u32,
    pub tx_id: TxId,
    pub payload: Vec<u8>,
}

/// A consensus attestation that an executed block reached a given final
/// state commitment.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Seal {
    pub id: SealId,
    pub block_id: BlockId,
    pub final_state: StateCommitment,
}
