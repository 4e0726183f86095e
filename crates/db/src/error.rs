use tessera_codec::CodecError;
use tessera_primitives::ArchiveError;
use thiserror::Error;

/// Errors surfaced by the index and protocol-state databases.
#[derive(Debug, Error)]
pub enum DbError {
    /// The underlying engine failed.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A stored value failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for ArchiveError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Codec(codec) => codec.into(),
            DbError::Sled(sled) => ArchiveError::storage(sled.to_string()),
        }
    }
}
