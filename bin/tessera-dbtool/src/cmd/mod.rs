pub(crate) mod block;
pub(crate) mod collection;
pub(crate) mod events;
pub(crate) mod height;
pub(crate) mod register;
pub(crate) mod summary;
pub(crate) mod transaction;

use anyhow::Context;
use tessera_primitives::Buf32;

/// Parses a 64-character hex identifier argument.
pub(crate) fn parse_id<T: From<Buf32>>(value: &str) -> anyhow::Result<T> {
    Buf32::from_hex(value)
        .map(T::from)
        .with_context(|| format!("invalid identifier {value:?}"))
}
