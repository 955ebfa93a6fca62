//! Signature Verification
//!
//! Confirms who signed a transaction without ever touching a private key:
//! the sender is recovered from the digest and `(r, s, recoveryId)` and then
//! run through the same address derivation as the device's public key.

use crate::address::{address_from_public_key, Address};
use crate::crypto::{is_low_s, recover_public_key};
use crate::error::{TxError, TxResult};
use crate::tx::assembler::transaction_hash;
use crate::tx::codec::{decode_broadcast_payload, signing_hash};
use crate::types::{Signature, SignedTransaction, DIGEST_LENGTH};
use crate::utils::json::u256_to_hex;
use serde::{Deserialize, Serialize};

/// Recover the address that produced `signature` over `digest`
pub fn recover_address(digest: &[u8; DIGEST_LENGTH], signature: &Signature) -> TxResult<Address> {
    let public_key = recover_public_key(digest, signature)?;
    address_from_public_key(&public_key)
}

/// Decode broadcast bytes and recover the sender.
///
/// The signing digest is recomputed from the decoded fields, with the chain
/// id taken back out of v. High-s signatures are rejected.
pub fn decode_broadcast_transaction(raw: &[u8]) -> TxResult<(SignedTransaction, Address)> {
    let signed = decode_broadcast_payload(raw)?;
    let signature = signed.signature()?;
    if !is_low_s(&signature.s) {
        return Err(TxError::invalid_signature("s is in the upper half of the curve order"));
    }

    let digest = signing_hash(&signed.tx);
    let from = recover_address(&digest, &signature)?;

    crate::log_debug!(
        "verifier",
        "Recovered sender",
        sender = from,
        chain_id = signed.tx.chain_id,
    );
    Ok((signed, from))
}

/// Decode broadcast bytes and require that `expected` signed them
pub fn verify_sender(raw: &[u8], expected: &Address) -> TxResult<SignedTransaction> {
    let (signed, from) = decode_broadcast_transaction(raw)?;
    if from != *expected {
        return Err(TxError::verification_failed(format!(
            "transaction was signed by {}, expected {}",
            from, expected
        )));
    }
    Ok(signed)
}

/// Human-readable view of a decoded raw transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    pub hash: String,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub gas_price: String,
    pub gas: u64,
    pub value: String,
    pub data: String,
    pub chain_id: u64,
    pub v: u64,
    pub r: String,
    pub s: String,
}

impl DecodedTransaction {
    /// Decode, recover the sender and describe the transaction
    pub fn from_raw(raw: &[u8]) -> TxResult<Self> {
        let (signed, from) = decode_broadcast_transaction(raw)?;
        let tx = &signed.tx;

        Ok(Self {
            hash: format!("0x{}", hex::encode(transaction_hash(raw))),
            from,
            to: tx.to,
            nonce: tx.nonce,
            gas_price: u256_to_hex(&tx.gas_price),
            gas: tx.gas_limit,
            value: u256_to_hex(&tx.value),
            data: format!("0x{}", hex::encode(&tx.data)),
            chain_id: tx.chain_id,
            v: signed.v,
            r: u256_to_hex(&signed.r),
            s: u256_to_hex(&signed.s),
        })
    }
}
