//! Transaction Replay Protection
//!
//! EIP-155 folds the chain id into the signature's v value,
//! `v = 2 * chainId + 35 + recoveryId`, so a signature made for one network
//! is rejected everywhere else. Both directions are computed from that single
//! relation; [`decode_v`] re-encodes its answer and compares.

use crate::error::{TxError, TxResult};

/// Smallest replay-protected v (chain id 0, recovery id 0)
pub const EIP155_V_OFFSET: u64 = 35;

/// Well-known chain ids
pub mod chain_ids {
    pub const ETHEREUM: u64 = 1;
    pub const ROPSTEN: u64 = 3;
    pub const GOERLI: u64 = 5;
    pub const SEPOLIA: u64 = 11155111;
    pub const DEV: u64 = 1337;
}

/// `v = 2 * chainId + 35 + recoveryId`
pub fn encode_v(chain_id: u64, recovery_id: u8) -> TxResult<u64> {
    if recovery_id > 1 {
        return Err(TxError::invalid_signature(format!(
            "recovery id must be 0 or 1, got {}",
            recovery_id
        )));
    }

    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(EIP155_V_OFFSET))
        .and_then(|v| v.checked_add(recovery_id as u64))
        .ok_or_else(|| TxError::invalid_input(format!("chain id {} overflows v", chain_id)))
}

/// Split a replay-protected v into `(chainId, recoveryId)`
pub fn decode_v(v: u64) -> TxResult<(u64, u8)> {
    if v < EIP155_V_OFFSET {
        return Err(TxError::invalid_input(format!(
            "v = {} carries no chain id (replay-protected v starts at {})",
            v, EIP155_V_OFFSET
        )));
    }

    let offset = v - EIP155_V_OFFSET;
    let recovery_id = (offset % 2) as u8;
    let chain_id = (offset - recovery_id as u64) / 2;

    if encode_v(chain_id, recovery_id)? != v {
        return Err(TxError::invalid_input(format!(
            "v = {} is inconsistent with chain id {}",
            v, chain_id
        )));
    }

    Ok((chain_id, recovery_id))
}

/// Recovery id of v, given the chain the transaction claims to be for
pub fn recovery_id_for_chain(v: u64, chain_id: u64) -> TxResult<u8> {
    let (decoded_chain, recovery_id) = decode_v(v)?;
    if decoded_chain != chain_id {
        return Err(TxError::verification_failed(format!(
            "v = {} belongs to chain {}, expected chain {}",
            v, decoded_chain, chain_id
        )));
    }
    Ok(recovery_id)
}
