use std::fmt;

use chrono::Utc;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::hash::hash_block;
use crate::transaction::Transaction;

/// Link from a block to its predecessor.
///
/// The genesis block has no predecessor and carries a sentinel instead of a
/// digest. On the wire the sentinel is the integer `1`, every other link is
/// the lowercase hex SHA-256 of the previous block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviousHash {
    Genesis,
    Digest(String),
}

impl PreviousHash {
    /// Wire value of the genesis sentinel.
    pub const GENESIS_SENTINEL: u64 = 1;

    /// True when this link points at a block hashing to `digest`.
    pub fn points_to(&self, digest: &str) -> bool {
        match self {
            PreviousHash::Genesis => false,
            PreviousHash::Digest(d) => d == digest,
        }
    }
}

impl Serialize for PreviousHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PreviousHash::Genesis => serializer.serialize_u64(Self::GENESIS_SENTINEL),
            PreviousHash::Digest(d) => serializer.serialize_str(d),
        }
    }
}

impl<'de> Deserialize<'de> for PreviousHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinkVisitor;

        impl Visitor<'_> for LinkVisitor {
            type Value = PreviousHash;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a hex digest string or the genesis sentinel 1")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                if v == PreviousHash::GENESIS_SENTINEL {
                    Ok(PreviousHash::Genesis)
                } else {
                    Err(E::invalid_value(de::Unexpected::Unsigned(v), &self))
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(PreviousHash::Digest(v.to_string()))
            }
        }

        deserializer.deserialize_any(LinkVisitor)
    }
}

/// A forged block. Never mutated once appended to a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Seconds since the Unix epoch (UTC), fractional.
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    /// Proof-of-Work nonce, checked against the previous block's proof.
    pub proof: u64,
    pub previous_hash: PreviousHash,
}

impl Block {
    /// Create a block stamped with the current time.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: PreviousHash,
    ) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Create the genesis block (first block in the chain).
    pub fn genesis(proof: u64) -> Self {
        Self::new(1, Vec::new(), proof, PreviousHash::Genesis)
    }

    /// SHA-256 of the canonical encoding, lowercase hex.
    pub fn hash(&self) -> String {
        hash_block(self)
    }
}

fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
