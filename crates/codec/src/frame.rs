use std::io::{Read, Write};

use borsh::{BorshDeserialize, BorshSerialize};
use tessera_primitives::{
    Block, BlockId, BlockPayload, Buf32, Collection, CollectionGuarantee, CollectionId, Event,
    ExecutionRecord, Header, LightCollection, RegisterEntry, RegisterPath, RootCheckpoint,
    RootSnapshot, Seal, SealId, StateCommitment, Transaction, TransactionResult, TrieUpdate, TxId,
};

use crate::{dict::Dictionary, error::CodecError};

/// Marker byte prefixing every stored frame.
const FRAME_MAGIC: u8 = 0xa7;

/// Compression level used for all dictionaries.
const COMPRESSION_LEVEL: i32 = 3;

/// A type that can be stored through the codec.
///
/// The dictionary association is the only per-type knob; borsh gives
/// the canonical byte layout.
pub trait Encodable: BorshSerialize + BorshDeserialize {
    const DICTIONARY: Dictionary = Dictionary::Default;
}

macro_rules! impl_encodable {
    ($($ty:ty),+ $(,)?) => {
        $(impl Encodable for $ty {})+
    };
    ($dict:expr => $($ty:ty),+ $(,)?) => {
        $(impl Encodable for $ty {
            const DICTIONARY: Dictionary = $dict;
        })+
    };
}

impl_encodable!(
    u64,
    Buf32,
    BlockId,
    TxId,
    CollectionId,
    SealId,
    StateCommitment,
    RegisterPath,
    CollectionGuarantee,
    LightCollection,
    Transaction,
    TransactionResult,
    Seal,
    Block,
    BlockPayload,
    Collection,
    ExecutionRecord,
    TrieUpdate,
    RegisterEntry,
    RootSnapshot,
    RootCheckpoint,
    Vec<TxId>,
    Vec<CollectionId>,
    Vec<SealId>,
    Vec<BlockId>,
    Vec<Seal>,
    Vec<CollectionGuarantee>,
);

impl_encodable!(Dictionary::Header => Header);
impl_encodable!(Dictionary::Events => Vec<Event>);
impl_encodable!(Dictionary::Payload => Vec<u8>);

/// Encodes a value into a compressed storage frame.
pub fn encode<T: Encodable>(value: &T) -> Result<Vec<u8>, CodecError> {
    let dict = T::DICTIONARY;
    let plain = borsh::to_vec(value)
        .map_err(|err| CodecError::InvalidEncoding(format!("borsh serialize: {err}")))?;

    let prepared = zstd::dict::EncoderDictionary::copy(dict.content(), COMPRESSION_LEVEL);
    let mut out = Vec::with_capacity(plain.len() / 2 + 2);
    out.push(FRAME_MAGIC);
    out.push(dict.id());
    let mut encoder = zstd::stream::Encoder::with_prepared_dictionary(&mut out, &prepared)
        .map_err(|err| CodecError::InvalidEncoding(format!("zstd encoder: {err}")))?;
    encoder
        .write_all(&plain)
        .map_err(|err| CodecError::InvalidEncoding(format!("zstd compress: {err}")))?;
    encoder
        .finish()
        .map_err(|err| CodecError::InvalidEncoding(format!("zstd finish: {err}")))?;

    Ok(out)
}

/// Decodes a storage frame back into a value.
///
/// The dictionary is detected from the frame, not assumed from `T`, so
/// frames written by older dictionary assignments remain readable.
pub fn decode<T: Encodable>(bytes: &[u8]) -> Result<T, CodecError> {
    let (magic, rest) = bytes
        .split_first()
        .ok_or_else(|| CodecError::InvalidEncoding("empty frame".into()))?;
    if *magic != FRAME_MAGIC {
        return Err(CodecError::InvalidEncoding(format!(
            "bad frame magic {magic:#04x}"
        )));
    }
    let (dict_id, compressed) = rest
        .split_first()
        .ok_or_else(|| CodecError::InvalidEncoding("frame missing dictionary id".into()))?;
    let dict = Dictionary::from_id(*dict_id)?;

    let prepared = zstd::dict::DecoderDictionary::copy(dict.content());
    let mut decoder = zstd::stream::Decoder::with_prepared_dictionary(compressed, &prepared)
        .map_err(|err| CodecError::InvalidEncoding(format!("zstd decoder: {err}")))?;
    let mut plain = Vec::new();
    decoder
        .read_to_end(&mut plain)
        .map_err(|err| CodecError::InvalidEncoding(format!("zstd decompress: {err}")))?;

    T::try_from_slice(&plain)
        .map_err(|err| CodecError::InvalidEncoding(format!("borsh deserialize: {err}")))
}
