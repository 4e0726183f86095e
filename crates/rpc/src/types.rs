use serde::{Deserialize, Serialize};
use tessera_primitives::{
    BlockId, Buf32, CollectionGuarantee, CollectionId, Event, Header, LightCollection, Seal,
    SealId, Transaction, TransactionResult, TxId,
};

/// Wire form of a block header. Identifiers are hex strings; opaque
/// byte payloads are hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    pub chain_id: String,
    pub height: u64,
    pub parent_id: BlockId,
    pub timestamp_ms: u64,
    pub payload_hash: Buf32,
    pub proposer_id: Buf32,
    #[serde(with = "hex")]
    pub proposer_sig: Vec<u8>,
}

impl From<Header> for RpcHeader {
    fn from(header: Header) -> Self {
        Self {
            chain_id: header.chain_id,
            height: header.height,
            parent_id: header.parent_id,
            timestamp_ms: header.timestamp_ms,
            payload_hash: header.payload_hash,
            proposer_id: header.proposer_id,
            proposer_sig: header.proposer_sig,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcGuarantee {
    pub collection_id: CollectionId,
    pub reference_block_id: BlockId,
    #[serde(with = "hex")]
    pub signer_indices: Vec<u8>,
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

impl From<CollectionGuarantee> for RpcGuarantee {
    fn from(guarantee: CollectionGuarantee) -> Self {
        Self {
            collection_id: guarantee.collection_id,
            reference_block_id: guarantee.reference_block_id,
            signer_indices: guarantee.signer_indices,
            signature: guarantee.signature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLightCollection {
    pub id: CollectionId,
    pub transaction_ids: Vec<TxId>,
}

impl From<LightCollection> for RpcLightCollection {
    fn from(collection: LightCollection) -> Self {
        Self {
            id: collection.id,
            transaction_ids: collection.transaction_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub id: TxId,
    pub reference_block_id: BlockId,
    #[serde(with = "hex")]
    pub script: Vec<u8>,
    pub arguments: Vec<String>,
    pub gas_limit: u64,
    #[serde(with = "hex")]
    pub payer: Vec<u8>,
}

impl From<Transaction> for RpcTransaction {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            reference_block_id: transaction.reference_block_id,
            script: transaction.script,
            arguments: transaction
                .arguments
                .iter()
                .map(hex::encode)
                .collect(),
            gas_limit: transaction.gas_limit,
            payer: transaction.payer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransactionResult {
    pub tx_id: TxId,
    pub error_message: String,
    pub succeeded: bool,
}

impl From<TransactionResult> for RpcTransactionResult {
    fn from(result: TransactionResult) -> Self {
        let succeeded = result.succeeded();
        Self {
            tx_id: result.tx_id,
            error_message: result.error_message,
            succeeded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcSeal {
    pub id: SealId,
    pub block_id: BlockId,
    pub final_state: Buf32,
}

impl From<Seal> for RpcSeal {
    fn from(seal: Seal) -> Self {
        Self {
            id: seal.id,
            block_id: seal.block_id,
            final_state: *seal.final_state.inner(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEvent {
    pub event_type: String,
    pub tx_index: u32,
    pub event_index: u32,
    pub tx_id: TxId,
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
}

impl From<Event> for RpcEvent {
    fn from(event: Event) -> Self {
        Self {
            event_type: event.event_type,
            tx_index: event.tx_index,
            event_index: event.event_index,
            tx_id: event.tx_id,
            payload: event.payload,
        }
    }
}
