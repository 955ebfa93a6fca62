//! Account Address Derivation
//!
//! An account address is the last 20 bytes of keccak256 over the raw
//! uncompressed public key (X ‖ Y, no `0x04` prefix). Addresses have two
//! textual forms: lowercase hex and the EIP-55 mixed-case checksum form,
//! whose casing is a function of the keccak hash of the lowercase hex text.

use crate::error::{TxError, TxResult};
use crate::utils::crypto::keccak256;
use crate::utils::json::strip_hex_prefix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address length in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Raw public key length in bytes (X and Y coordinates, no format prefix)
pub const PUBLIC_KEY_LENGTH: usize = 64;

/// A 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// Build from a byte slice that must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> TxResult<Self> {
        if bytes.len() != ADDRESS_LENGTH {
            return Err(TxError::invalid_length("address", ADDRESS_LENGTH, bytes.len()));
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Address(out))
    }

    /// Derive the address of a raw 64-byte public key
    pub fn from_public_key(public_key: &[u8]) -> TxResult<Self> {
        address_from_public_key(public_key)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Canonical lowercase form, `0x`-prefixed
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum form, `0x`-prefixed
    pub fn to_checksum(&self) -> String {
        to_checksum_address(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TxError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_address(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_checksum()
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }
}

/// Derive an address from a raw uncompressed public key (64 bytes, X ‖ Y)
pub fn address_from_public_key(public_key: &[u8]) -> TxResult<Address> {
    if public_key.len() != PUBLIC_KEY_LENGTH {
        return Err(TxError::invalid_length(
            "public key",
            PUBLIC_KEY_LENGTH,
            public_key.len(),
        ));
    }

    let hash = keccak256(public_key);
    let mut address = [0u8; ADDRESS_LENGTH];
    address.copy_from_slice(&hash[32 - ADDRESS_LENGTH..]);
    Ok(Address(address))
}

/// Convert raw address bytes to checksummed address text
pub fn to_checksum_address(address: &[u8; ADDRESS_LENGTH]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::with_capacity(2 + lower.len());
    result.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Re-derive the checksum form of any address text (case-insensitive input)
pub fn checksum_address_str(address: &str) -> TxResult<String> {
    let bytes = decode_address_hex(address)?;
    Ok(to_checksum_address(&bytes))
}

/// Parse address text.
///
/// All-lowercase and all-uppercase input carries no checksum and is accepted
/// as-is. Mixed-case input must match its checksum form exactly.
pub fn parse_address(address: &str) -> TxResult<Address> {
    let bytes = decode_address_hex(address)?;
    let hex_part = strip_hex_prefix(address.trim());

    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let expected = to_checksum_address(&bytes);
        if expected[2..] != *hex_part {
            return Err(TxError::ChecksumMismatch {
                given: format!("0x{}", hex_part),
                expected,
            });
        }
    }

    Ok(Address(bytes))
}

/// Whether the text is a mixed-case address with a valid checksum
pub fn is_valid_checksum(address: &str) -> bool {
    match decode_address_hex(address) {
        Ok(bytes) => to_checksum_address(&bytes)[2..] == *strip_hex_prefix(address.trim()),
        Err(_) => false,
    }
}

fn decode_address_hex(address: &str) -> TxResult<[u8; ADDRESS_LENGTH]> {
    let hex_part = strip_hex_prefix(address.trim());
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TxError::invalid_input(format!(
            "Address contains non-hex characters: {}",
            address
        )));
    }
    if hex_part.len() % 2 != 0 {
        return Err(TxError::invalid_input(format!(
            "Address has an odd number of hex digits: {}",
            address
        )));
    }

    let bytes = hex::decode(hex_part.to_ascii_lowercase())?;
    Address::from_slice(&bytes).map(|a| a.0)
}
