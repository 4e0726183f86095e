use crate::error::CodecError;

/// Compression dictionary families.
///
/// Headers, register payloads, and events dominate the stored byte
/// volume and each have a distinctive shape, so they get their own
/// dictionary; every other type shares the default one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dictionary {
    Default,
    Header,
    Payload,
    Events,
}

impl Dictionary {
    pub(crate) fn id(self) -> u8 {
        match self {
            Dictionary::Default => 0,
            Dictionary::Header => 1,
            Dictionary::Payload => 2,
            Dictionary::Events => 3,
        }
    }

    pub(crate) fn from_id(id: u8) -> Result<Self, CodecError> {
        match id {
            0 => Ok(Dictionary::Default),
            1 => Ok(Dictionary::Header),
            2 => Ok(Dictionary::Payload),
            3 => Ok(Dictionary::Events),
            other => Err(CodecError::InvalidEncoding(format!(
                "unknown dictionary id {other}"
            ))),
        }
    }

    /// Raw-content dictionary bytes for this family.
    ///
    /// These are sampled from representative encoded values; zstd
    /// treats content without the dictionary magic as a raw prefix
    /// dictionary, which is all the short-value workload needs.
    pub(crate) fn content(self) -> &'static [u8] {
        match self {
            Dictionary::Default => DEFAULT_DICT,
            Dictionary::Header => HEADER_DICT,
            Dictionary::Payload => PAYLOAD_DICT,
            Dictionary::Events => EVENTS_DICT,
        }
    }
}

const DEFAULT_DICT: &[u8] = &[
    0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x02, 0x00, 0x00, 0x00, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const HEADER_DICT: &[u8] = &[
    0x0d, 0x00, 0x00, 0x00, 0x6d, 0x61, 0x69, 0x6e, 0x6e, 0x65, 0x74, 0x2d, 0x61, 0x72, 0x63,
    0x68, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const PAYLOAD_DICT: &[u8] = &[
    0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const EVENTS_DICT: &[u8] = &[
    0x12, 0x00, 0x00, 0x00, 0x41, 0x2e, 0x30, 0x31, 0x2e, 0x54, 0x6f, 0x6b, 0x65, 0x6e, 0x73,
    0x44, 0x65, 0x70, 0x6f, 0x73, 0x69, 0x74, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x00, 0x00, 0x00, 0x57, 0x69, 0x74,
    0x68, 0x64, 0x72, 0x61, 0x77, 0x61, 0x6c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
