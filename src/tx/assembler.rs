//! Raw transaction assembly

use crate::tx::codec::{encode_broadcast_fields, encode_broadcast_payload};
use crate::types::{SignedTransaction, UnsignedTransaction};
use crate::utils::crypto::keccak256;
use ethers_core::types::U256;

/// Broadcast bytes for unsigned fields plus `(v, r, s)`
pub fn assemble(tx: &UnsignedTransaction, v: u64, r: &U256, s: &U256) -> Vec<u8> {
    encode_broadcast_fields(tx, v, r, s)
}

/// Broadcast bytes of a signed transaction
pub fn assemble_signed(signed: &SignedTransaction) -> Vec<u8> {
    encode_broadcast_payload(signed)
}

/// `0x`-prefixed hex of the broadcast bytes, as JSON-RPC expects it
pub fn assemble_hex(signed: &SignedTransaction) -> String {
    format!("0x{}", hex::encode(assemble_signed(signed)))
}

/// Transaction hash: keccak256 of the broadcast bytes
pub fn transaction_hash(raw: &[u8]) -> [u8; 32] {
    keccak256(raw)
}

/// Assemble and hash in one step
pub fn assemble_with_hash(signed: &SignedTransaction) -> (Vec<u8>, [u8; 32]) {
    let raw = assemble_signed(signed);
    let hash = transaction_hash(&raw);
    (raw, hash)
}
