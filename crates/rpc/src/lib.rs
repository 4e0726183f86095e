//! JSON-RPC surface of the archive: the api trait, hex-encoded wire
//! types, and the server wiring over the index reader.

mod api;
mod server;
mod types;

#[cfg(feature = "client")]
pub use api::TesseraApiClient;
pub use api::TesseraApiServer;
pub use server::{start_rpc_server, ArchiveRpc};
pub use types::{
    RpcEvent, RpcGuarantee, RpcHeader, RpcLightCollection, RpcSeal, RpcTransaction,
    RpcTransactionResult,
};
