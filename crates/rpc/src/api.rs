use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::{
    RpcEvent, RpcGuarantee, RpcHeader, RpcLightCollection, RpcSeal, RpcTransaction,
    RpcTransactionResult,
};

/// The archive's query surface. All identifiers travel as hex strings;
/// nothing here mutates.
#[cfg_attr(not(feature = "client"), rpc(server, namespace = "archive"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "archive"))]
pub trait TesseraApi {
    /// The root height indexing started from.
    #[method(name = "first")]
    async fn first(&self) -> RpcResult<u64>;

    /// The greatest fully indexed height.
    #[method(name = "last")]
    async fn last(&self) -> RpcResult<u64>;

    #[method(name = "headerByHeight")]
    async fn header_by_height(&self, height: u64) -> RpcResult<RpcHeader>;

    /// The execution state commitment a height was sealed with.
    #[method(name = "commitByHeight")]
    async fn commit_by_height(&self, height: u64) -> RpcResult<String>;

    #[method(name = "heightForBlock")]
    async fn height_for_block(&self, block_id: String) -> RpcResult<u64>;

    #[method(name = "heightForTransaction")]
    async fn height_for_transaction(&self, tx_id: String) -> RpcResult<u64>;

    #[method(name = "collection")]
    async fn collection(&self, collection_id: String) -> RpcResult<RpcLightCollection>;

    #[method(name = "guarantee")]
    async fn guarantee(&self, collection_id: String) -> RpcResult<RpcGuarantee>;

    #[method(name = "transaction")]
    async fn transaction(&self, tx_id: String) -> RpcResult<RpcTransaction>;

    #[method(name = "result")]
    async fn result(&self, tx_id: String) -> RpcResult<RpcTransactionResult>;

    #[method(name = "seal")]
    async fn seal(&self, seal_id: String) -> RpcResult<RpcSeal>;

    #[method(name = "sealsByHeight")]
    async fn seals_by_height(&self, height: u64) -> RpcResult<Vec<RpcSeal>>;

    #[method(name = "collectionsByHeight")]
    async fn collections_by_height(&self, height: u64) -> RpcResult<Vec<RpcLightCollection>>;

    /// Events at a height, optionally filtered by event type.
    #[method(name = "eventsByHeight")]
    async fn events_by_height(
        &self,
        height: u64,
        types: Option<Vec<String>>,
    ) -> RpcResult<Vec<RpcEvent>>;

    /// Point-in-time register reads; hex payloads, one per path.
    #[method(name = "valuesByHeight")]
    async fn values_by_height(&self, paths: Vec<String>, height: u64) -> RpcResult<Vec<String>>;
}
