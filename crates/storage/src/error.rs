use tessera_db::DbError;
use tessera_primitives::ArchiveError;
use thiserror::Error;

/// Errors surfaced by the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying index database failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A write was attempted after the writer was closed.
    #[error("index writer is closed")]
    Closed,

    /// Paired input slices did not line up.
    #[error("mismatched input columns: {0} paths, {1} values")]
    MismatchedColumns(usize, usize),

    /// A background flush task died before reporting back.
    #[error("background flush failed: {0}")]
    Background(String),
}

impl From<StorageError> for ArchiveError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Db(db) => db.into(),
            other => ArchiveError::storage(other.to_string()),
        }
    }
}
