//! Storage codec for the archive: canonical borsh encoding wrapped in
//! dictionary-aware zstd compression.
//!
//! Every stored value is a two-byte frame header (magic + dictionary
//! id) followed by a zstd frame. The dictionary is chosen by the type
//! being encoded; decoding reads the dictionary id back from the frame,
//! so a reader never has to guess which dictionary produced the bytes.

mod dict;
mod error;
mod frame;

pub use dict::Dictionary;
pub use error::CodecError;
pub use frame::{decode, encode, Encodable};
