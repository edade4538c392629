//! 256-bit unsigned integer wrapper.
//!
//! Foreign-chain amounts and nonces are 256-bit. We wrap [`ethnum::U256`]
//! so the type can flow through borsh and serde alongside the rest of the
//! state model; borsh encodes the fixed 32-byte big-endian form, serde the
//! decimal string form.

use std::{
    fmt,
    io::{Read, Write},
    ops::{Add, Sub},
    str::FromStr,
};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error parsing a [`U256`] from its decimal string form.
#[derive(Debug, Error)]
#[error("invalid u256 literal")]
pub struct ParseU256Error;

/// An unsigned 256-bit integer.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct U256(ethnum::U256);

impl U256 {
    pub const ZERO: Self = Self(ethnum::U256::ZERO);
    pub const ONE: Self = Self(ethnum::U256::ONE);

    pub const fn new(v: u128) -> Self {
        Self(ethnum::U256::new(v))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == ethnum::U256::ZERO
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(buf: [u8; 32]) -> Self {
        Self(ethnum::U256::from_be_bytes(buf))
    }
}

impl From<u64> for U256 {
    fn from(v: u64) -> Self {
        Self(ethnum::U256::from(v))
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        Self(ethnum::U256::from(v))
    }
}

impl Add for U256 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for U256 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for U256 {
    type Err = ParseU256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ethnum::U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|_| ParseU256Error)
    }
}

impl BorshSerialize for U256 {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_be_bytes())
    }
}

impl BorshDeserialize for U256 {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; 32];
        reader.read_exact(&mut buf)?;
        Ok(Self::from_be_bytes(buf))
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borsh_round_trip() {
        let v = U256::from(u128::MAX) + U256::ONE;
        let buf = borsh::to_vec(&v).unwrap();
        assert_eq!(buf.len(), 32);
        let back: U256 = borsh::from_slice(&buf).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_decimal_serde() {
        let v = U256::from(12345u64);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"12345\"");
        let back: U256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert!(U256::ZERO.checked_sub(U256::ONE).is_none());
    }
}
