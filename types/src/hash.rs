//! Block hash type.
//!
//! A hash is the 32-byte SHA-256 digest of a block's canonical encoding and is
//! rendered as 64 lowercase hex characters. The all-zero hash doubles as the
//! "no predecessor" sentinel carried by a genesis block, and is rendered as
//! the literal string `"0"` on the wire and on disk.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 32-byte block hash identifying a block in a node's chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHash([u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    /// Sentinel used as `previous_hash` of the genesis block.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Textual form of [`BlockHash::ZERO`].
    pub const GENESIS_SENTINEL: &'static str = "0";

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "BlockHash(0)");
        }
        write!(f, "BlockHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            f.write_str(Self::GENESIS_SENTINEL)
        } else {
            f.write_str(&hex::encode(self.0))
        }
    }
}

impl FromStr for BlockHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::GENESIS_SENTINEL {
            return Ok(Self::ZERO);
        }
        if s.len() != 64 || s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(TypesError::InvalidHash(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| TypesError::InvalidHash(s.to_string()))?;
        // The zero hash has exactly one text form, the sentinel.
        if bytes == [0u8; 32] {
            return Err(TypesError::InvalidHash(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_renders_as_sentinel() {
        assert_eq!(BlockHash::ZERO.to_string(), "0");
        assert_eq!("0".parse::<BlockHash>().unwrap(), BlockHash::ZERO);
    }

    #[test]
    fn non_zero_renders_as_lowercase_hex() {
        let hash = BlockHash::new([0xab; 32]);
        let s = hash.to_string();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c == 'a' || c == 'b'));
        assert_eq!(s.parse::<BlockHash>().unwrap(), hash);
    }

    #[test]
    fn rejects_malformed_hashes() {
        assert!("".parse::<BlockHash>().is_err());
        assert!("abc".parse::<BlockHash>().is_err());
        assert!("zz".repeat(32).parse::<BlockHash>().is_err());
        assert!("AB".repeat(32).parse::<BlockHash>().is_err());
    }

    #[test]
    fn zero_hash_only_parses_from_sentinel() {
        assert!("0".repeat(64).parse::<BlockHash>().is_err());
        assert!(serde_json::from_str::<BlockHash>(&format!("\"{}\"", "0".repeat(64))).is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let hash = BlockHash::new([1; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: BlockHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert_eq!(serde_json::to_string(&BlockHash::ZERO).unwrap(), "\"0\"");
    }
}
