//! Fixed-length byte buffer newtypes.

use std::{fmt, str};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing a buf from its hex form.
#[derive(Debug, Error)]
pub enum BufError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

macro_rules! impl_buf_common {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Length of the buffer in bytes.
            pub const LEN: usize = $len;

            /// Returns a zeroed buffer.
            pub const fn zero() -> Self {
                Self([0; $len])
            }

            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Parses from a hex string, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, BufError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let raw = hex::decode(s)?;
                if raw.len() != $len {
                    return Err(BufError::InvalidLength {
                        expected: $len,
                        got: raw.len(),
                    });
                }
                let mut buf = [0u8; $len];
                buf.copy_from_slice(&raw);
                Ok(Self(buf))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // Abbreviated for log readability, full value via to_hex().
                let h = hex::encode(&self.0[..4]);
                write!(f, "{h}..")
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl str::FromStr for $name {
            type Err = BufError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as Deserialize>::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(de::Error::custom)
            }
        }
    };
}

/// A 20-byte buffer, used for foreign-chain (EVM) account and contract
/// addresses.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, BorshSerialize, BorshDeserialize,
)]
pub struct Buf20(pub [u8; 20]);

impl_buf_common!(Buf20, 20);

/// A 32-byte buffer, used for hashes, transaction ids and public keys.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, BorshSerialize, BorshDeserialize,
)]
pub struct Buf32(pub [u8; 32]);

impl_buf_common!(Buf32, 32);
