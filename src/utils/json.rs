//! Input Parsing Utilities
//!
//! Hex and decimal parsing for request fields, RPC responses and CLI flags.

use crate::error::{TxError, TxResult};
use ethers_core::types::U256;

/// Strip a single `0x`/`0X` prefix, if present
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse hex string to bytes safely (`0x` optional, empty allowed)
pub fn parse_hex_bytes(hex_str: &str) -> TxResult<Vec<u8>> {
    let cleaned = strip_hex_prefix(hex_str.trim());
    hex::decode(cleaned)
        .map_err(|e| TxError::invalid_input(format!("Invalid hex '{}': {}", hex_str, e)))
}

/// Parse a hex string into exactly `N` bytes
pub fn parse_hex_array<const N: usize>(hex_str: &str, field: &'static str) -> TxResult<[u8; N]> {
    let bytes = parse_hex_bytes(hex_str)?;
    if bytes.len() != N {
        return Err(TxError::invalid_length(field, N, bytes.len()));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse hex string to u64 safely (JSON-RPC quantity)
pub fn parse_hex_u64(hex_str: &str) -> TxResult<u64> {
    let cleaned = strip_hex_prefix(hex_str.trim());
    u64::from_str_radix(cleaned, 16)
        .map_err(|e| TxError::invalid_input(format!("Invalid hex u64 '{}': {}", hex_str, e)))
}

/// Parse a 256-bit quantity given either as `0x`-hex or as a decimal string
pub fn parse_u256(s: &str) -> TxResult<U256> {
    let s = s.trim();
    if s.starts_with("0x") || s.starts_with("0X") {
        let digits = strip_hex_prefix(s);
        if digits.is_empty() {
            return Ok(U256::zero());
        }
        U256::from_str_radix(digits, 16)
            .map_err(|e| TxError::invalid_input(format!("Invalid hex quantity '{}': {:?}", s, e)))
    } else {
        U256::from_dec_str(s)
            .map_err(|e| TxError::invalid_input(format!("Invalid decimal quantity '{}': {:?}", s, e)))
    }
}

/// Format a 256-bit value as a minimal `0x` hex quantity
pub fn u256_to_hex(value: &U256) -> String {
    format!("{:#x}", value)
}
