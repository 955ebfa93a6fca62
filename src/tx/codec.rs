//! Legacy Transaction Codec
//!
//! Both payloads are a 9-item RLP list sharing the first six fields:
//!
//! ```text
//! signing:   [nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]
//! broadcast: [nonce, gasPrice, gasLimit, to, value, data, v, r, s]
//! ```
//!
//! `to` is the empty string for contract creation. The signing payload's
//! trailing `chainId, 0, 0` is the EIP-155 replay-protection suffix.

use crate::address::{Address, ADDRESS_LENGTH};
use crate::error::{TxError, TxResult};
use crate::rlp::{self, encode_bytes, encode_list, encode_u256, encode_u64, RlpItem};
use crate::tx::replay_protection::decode_v;
use crate::types::{SignedTransaction, UnsignedTransaction, DIGEST_LENGTH};
use crate::utils::crypto::keccak256;
use ethers_core::types::U256;

/// Number of list items in either payload
pub const FIELD_COUNT: usize = 9;

/// RLP of `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`
pub fn encode_signing_payload(tx: &UnsignedTransaction) -> Vec<u8> {
    let mut fields = common_fields(tx);
    fields.push(encode_u64(tx.chain_id));
    fields.push(encode_u64(0));
    fields.push(encode_u64(0));
    encode_list(&fields)
}

/// keccak256 of the signing payload; the digest handed to the signer
pub fn signing_hash(tx: &UnsignedTransaction) -> [u8; DIGEST_LENGTH] {
    keccak256(&encode_signing_payload(tx))
}

/// RLP of `[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`
pub fn encode_broadcast_payload(signed: &SignedTransaction) -> Vec<u8> {
    encode_broadcast_fields(&signed.tx, signed.v, &signed.r, &signed.s)
}

pub fn encode_broadcast_fields(tx: &UnsignedTransaction, v: u64, r: &U256, s: &U256) -> Vec<u8> {
    let mut fields = common_fields(tx);
    fields.push(encode_u64(v));
    fields.push(encode_u256(r));
    fields.push(encode_u256(s));
    encode_list(&fields)
}

/// Decode a signing payload back into unsigned fields.
///
/// The two trailing items must be zero.
pub fn decode_signing_payload(bytes: &[u8]) -> TxResult<UnsignedTransaction> {
    let item = rlp::decode(bytes)?;
    let fields = transaction_fields(&item)?;

    let chain_id = fields[6].as_u64()?;
    if !fields[7].as_u256()?.is_zero() || !fields[8].as_u256()?.is_zero() {
        return Err(TxError::rlp("signing payload must end in chainId, 0, 0"));
    }

    decode_common_fields(fields, chain_id)
}

/// Decode a broadcast payload; the chain id is taken back out of v
pub fn decode_broadcast_payload(bytes: &[u8]) -> TxResult<SignedTransaction> {
    let item = rlp::decode(bytes)?;
    let fields = transaction_fields(&item)?;

    let v = fields[6].as_u64()?;
    let r = fields[7].as_u256()?;
    let s = fields[8].as_u256()?;
    let (chain_id, _) = decode_v(v)?;

    Ok(SignedTransaction {
        tx: decode_common_fields(fields, chain_id)?,
        v,
        r,
        s,
    })
}

fn common_fields(tx: &UnsignedTransaction) -> Vec<Vec<u8>> {
    let to: &[u8] = match &tx.to {
        Some(address) => address.as_bytes(),
        None => &[],
    };

    let mut fields = Vec::with_capacity(FIELD_COUNT);
    fields.push(encode_u64(tx.nonce));
    fields.push(encode_u256(&tx.gas_price));
    fields.push(encode_u64(tx.gas_limit));
    fields.push(encode_bytes(to));
    fields.push(encode_u256(&tx.value));
    fields.push(encode_bytes(&tx.data));
    fields
}

fn transaction_fields<'i, 'a>(item: &'i RlpItem<'a>) -> TxResult<&'i [RlpItem<'a>]> {
    let fields = item.as_list()?;
    if fields.len() != FIELD_COUNT {
        return Err(TxError::rlp(format!(
            "expected {} transaction fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }
    Ok(fields)
}

fn decode_common_fields(fields: &[RlpItem<'_>], chain_id: u64) -> TxResult<UnsignedTransaction> {
    let to_bytes = fields[3].as_bytes()?;
    let to = match to_bytes.len() {
        0 => None,
        ADDRESS_LENGTH => Some(Address::from_slice(to_bytes)?),
        n => return Err(TxError::invalid_length("to", ADDRESS_LENGTH, n)),
    };

    Ok(UnsignedTransaction {
        nonce: fields[0].as_u64()?,
        gas_price: fields[1].as_u256()?,
        gas_limit: fields[2].as_u64()?,
        to,
        value: fields[4].as_u256()?,
        data: fields[5].as_bytes()?.to_vec(),
        chain_id,
    })
}
