//! Hashing Utilities
//!
//! Keccak-256 is the only hash the signing pipeline uses: for the signing
//! digest, for address derivation and for the checksum casing.

use tiny_keccak::{Hasher, Keccak};

/// Keccak256 hash (pre-standard SHA-3 padding, as used by Ethereum)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
