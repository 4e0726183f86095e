use jsonrpsee::{
    core::{async_trait, RpcResult},
    server::{ServerBuilder, ServerHandle},
    types::{ErrorObject, ErrorObjectOwned},
};
use tessera_primitives::{ArchiveError, Buf32};
use tessera_storage::IndexReader;
use tracing::info;

use crate::{
    api::TesseraApiServer,
    types::{
        RpcEvent, RpcGuarantee, RpcHeader, RpcLightCollection, RpcSeal, RpcTransaction,
        RpcTransactionResult,
    },
};

/// `archive_*` error codes, in the server-defined range.
const CODE_NOT_FOUND: i32 = -32004;
const CODE_UNAVAILABLE: i32 = -32005;
const CODE_INTERNAL: i32 = -32099;
const CODE_INVALID_ID: i32 = -32602;

fn rpc_error(err: ArchiveError) -> ErrorObjectOwned {
    match err {
        ArchiveError::NotFound => ErrorObject::owned(CODE_NOT_FOUND, "not found", None::<()>),
        ArchiveError::Unavailable | ArchiveError::Timeout => {
            ErrorObject::owned(CODE_UNAVAILABLE, "not yet available", None::<()>)
        }
        other => ErrorObject::owned(CODE_INTERNAL, other.to_string(), None::<()>),
    }
}

fn parse_id<T: From<Buf32>>(value: &str) -> Result<T, ErrorObjectOwned> {
    Buf32::from_hex(value)
        .map(T::from)
        .map_err(|err| ErrorObject::owned(CODE_INVALID_ID, format!("bad identifier: {err}"), None::<()>))
}

/// The api implementation, a thin hex-translation layer over the
/// index reader.
#[derive(Debug, Clone)]
pub struct ArchiveRpc {
    reader: IndexReader,
}

impl ArchiveRpc {
    pub fn new(reader: IndexReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl TesseraApiServer for ArchiveRpc {
    async fn first(&self) -> RpcResult<u64> {
        self.reader.first().map_err(rpc_error)
    }

    async fn last(&self) -> RpcResult<u64> {
        self.reader.last().map_err(rpc_error)
    }

    async fn header_by_height(&self, height: u64) -> RpcResult<RpcHeader> {
        self.reader
            .header_by_height(height)
            .map(RpcHeader::from)
            .map_err(rpc_error)
    }

    async fn commit_by_height(&self, height: u64) -> RpcResult<String> {
        self.reader
            .commit_by_height(height)
            .map(|commit| commit.to_string())
            .map_err(rpc_error)
    }

    async fn height_for_block(&self, block_id: String) -> RpcResult<u64> {
        let block_id = parse_id(&block_id)?;
        self.reader.height_for_block(&block_id).map_err(rpc_error)
    }

    async fn height_for_transaction(&self, tx_id: String) -> RpcResult<u64> {
        let tx_id = parse_id(&tx_id)?;
        self.reader
            .height_for_transaction(&tx_id)
            .map_err(rpc_error)
    }

    async fn collection(&self, collection_id: String) -> RpcResult<RpcLightCollection> {
        let collection_id = parse_id(&collection_id)?;
        self.reader
            .collection(&collection_id)
            .map(RpcLightCollection::from)
            .map_err(rpc_error)
    }

    async fn guarantee(&self, collection_id: String) -> RpcResult<RpcGuarantee> {
        let collection_id = parse_id(&collection_id)?;
        self.reader
            .guarantee(&collection_id)
            .map(RpcGuarantee::from)
            .map_err(rpc_error)
    }

    async fn transaction(&self, tx_id: String) -> RpcResult<RpcTransaction> {
        let tx_id = parse_id(&tx_id)?;
        self.reader
            .transaction(&tx_id)
            .map(RpcTransaction::from)
            .map_err(rpc_error)
    }

    async fn result(&self, tx_id: String) -> RpcResult<RpcTransactionResult> {
        let tx_id = parse_id(&tx_id)?;
        self.reader
            .result(&tx_id)
            .map(RpcTransactionResult::from)
            .map_err(rpc_error)
    }

    async fn seal(&self, seal_id: String) -> RpcResult<RpcSeal> {
        let seal_id = parse_id(&seal_id)?;
        self.reader.seal(&seal_id).map(RpcSeal::from).map_err(rpc_error)
    }

    async fn seals_by_height(&self, height: u64) -> RpcResult<Vec<RpcSeal>> {
        self.reader
            .seals_by_height(height)
            .map(|seals| seals.into_iter().map(RpcSeal::from).collect())
            .map_err(rpc_error)
    }

    async fn collections_by_height(&self, height: u64) -> RpcResult<Vec<RpcLightCollection>> {
        self.reader
            .collections_by_height(height)
            .map(|colls| colls.into_iter().map(RpcLightCollection::from).collect())
            .map_err(rpc_error)
    }

    async fn events_by_height(
        &self,
        height: u64,
        types: Option<Vec<String>>,
    ) -> RpcResult<Vec<RpcEvent>> {
        let types = types.unwrap_or_default();
        self.reader
            .events_by_height(height, &types)
            .map(|events| events.into_iter().map(RpcEvent::from).collect())
            .map_err(rpc_error)
    }

    async fn values_by_height(&self, paths: Vec<String>, height: u64) -> RpcResult<Vec<String>> {
        let paths = paths
            .iter()
            .map(|path| parse_id(path))
            .collect::<Result<Vec<_>, _>>()?;
        self.reader
            .values_by_height(&paths, height)
            .map(|values| values.iter().map(hex::encode).collect())
            .map_err(rpc_error)
    }
}

/// Builds and starts the RPC server; the returned handle stops it.
pub async fn start_rpc_server(addr: &str, reader: IndexReader) -> anyhow::Result<ServerHandle> {
    let server = ServerBuilder::default().build(addr).await?;
    let handle = server.start(ArchiveRpc::new(reader).into_rpc());
    info!(%addr, "rpc server listening");
    Ok(handle)
}
