use tessera_primitives::ArchiveError;
use tessera_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the mapper's transitions.
///
/// Transient errors (`Unavailable`, `Timeout`) are absorbed by the run
/// loop's wait-and-retry; everything else stops the state machine
/// without advancing or discarding anything.
#[derive(Debug, Error)]
pub enum MapperError {
    /// A dependency failed or has nothing to serve yet.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The index writer rejected a write.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MapperError {
    /// Whether the run loop should wait and retry the same transition.
    pub fn is_transient(&self) -> bool {
        matches!(self, MapperError::Archive(err) if err.is_transient())
    }

    /// Whether the error marks the clean end of recorded history.
    pub fn is_finished(&self) -> bool {
        matches!(self, MapperError::Archive(ArchiveError::Finished))
    }
}

pub(crate) type Result<T> = std::result::Result<T, MapperError>;
