use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::buf::Buf32;

macro_rules! define_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy,
            Clone,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            BorshSerialize,
            BorshDeserialize,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Buf32);

        impl $name {
            pub const fn new(inner: Buf32) -> Self {
                Self(inner)
            }

            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(Buf32::new(bytes))
            }

            pub fn inner(&self) -> &Buf32 {
                &self.0
            }

            pub fn as_slice(&self) -> &[u8] {
                self.0.as_slice()
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }

        impl From<Buf32> for $name {
            fn from(buf: Buf32) -> Self {
                Self(buf)
            }
        }

        impl From<$name> for Buf32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0)
            }
        }
    };
}

define_identifier!(
    /// Content hash of a block header, identifying a finalized block.
    BlockId
);

define_identifier!(
    /// Content hash of a transaction body.
    TxId
);

define_identifier!(
    /// Content hash of a collection of transactions.
    CollectionId
);

define_identifier!(
    /// Content hash of a block seal.
    SealId
);

define_identifier!(
    /// Address of a single execution register.
    RegisterPath
);

define_identifier!(
    /// Commitment to the execution state after a block was executed.
    StateCommitment
);
