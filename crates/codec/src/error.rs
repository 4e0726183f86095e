use tessera_primitives::ArchiveError;
use thiserror::Error;

/// Errors produced by the storage codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame is truncated, mislabeled, or fails to decompress or
    /// deserialize.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

impl From<CodecError> for ArchiveError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidEncoding(msg) => ArchiveError::InvalidEncoding(msg),
        }
    }
}
