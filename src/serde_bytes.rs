//! Serde helpers for byte strings
//!
//! Byte fields travel as `0x`-prefixed hex strings in JSON (requests, CLI
//! output, decode reports). Deserialization accepts the prefix as optional.

use serde::{Deserialize, Deserializer, Serializer};

fn decode_hex<E: serde::de::Error>(s: &str) -> Result<Vec<u8>, E> {
    let cleaned = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(cleaned).map_err(E::custom)
}

/// Serialize/deserialize Vec<u8> as `0x` hex string
pub mod hex_vec {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        decode_hex(&s)
    }
}

/// Serialize/deserialize [u8; 32] as `0x` hex string
pub mod hex32 {
    use super::*;

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_hex::<D::Error>(&s)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}
