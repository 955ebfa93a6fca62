//! Transaction Types
//!
//! Data model of the signing pipeline: the unsigned transaction handed in by
//! the caller, the raw and canonical signatures, and the signed transaction
//! handed to broadcast.

use crate::address::{Address, ADDRESS_LENGTH};
use crate::error::{TxError, TxResult};
use crate::tx::replay_protection;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest length in bytes
pub const DIGEST_LENGTH: usize = 32;

/// Length of each of r and s as returned by the signer
pub const SIGNATURE_COMPONENT_LENGTH: usize = 32;

/// Gas used by a plain value transfer
pub const TRANSFER_GAS: u64 = 21_000;

/// Identifies a key slot on the signing device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyHandle(pub u32);

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Legacy transaction fields before signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    /// Sender account sequence number
    pub nonce: u64,

    /// Price per gas unit in wei
    pub gas_price: U256,

    /// Gas limit
    pub gas_limit: u64,

    /// Recipient (None for contract creation)
    pub to: Option<Address>,

    /// Value in wei
    pub value: U256,

    /// Call data
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub data: Vec<u8>,

    /// Network identifier bound into the signature
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// Create a zero-value transfer skeleton for a chain
    pub fn new(chain_id: u64) -> Self {
        Self {
            nonce: 0,
            gas_price: U256::zero(),
            gas_limit: TRANSFER_GAS,
            to: None,
            value: U256::zero(),
            data: Vec::new(),
            chain_id,
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = gas_price.into();
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the recipient from raw bytes; empty means contract creation
    pub fn with_to_bytes(mut self, to: &[u8]) -> TxResult<Self> {
        self.to = match to.len() {
            0 => None,
            ADDRESS_LENGTH => Some(Address::from_slice(to)?),
            n => return Err(TxError::invalid_length("to", ADDRESS_LENGTH, n)),
        };
        Ok(self)
    }

    pub fn with_value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Whether this transaction deploys a contract
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Signature exactly as the device returned it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSignature {
    #[serde(with = "crate::serde_bytes::hex32")]
    pub r: [u8; SIGNATURE_COMPONENT_LENGTH],
    #[serde(with = "crate::serde_bytes::hex32")]
    pub s: [u8; SIGNATURE_COMPONENT_LENGTH],
    pub recovery_id: u8,
}

impl RawSignature {
    pub fn new(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Self {
        Self { r, s, recovery_id }
    }

    /// Build from a 64-byte `r ‖ s` blob, the layout most devices return
    pub fn from_compact(compact: &[u8], recovery_id: u8) -> TxResult<Self> {
        if compact.len() != 2 * SIGNATURE_COMPONENT_LENGTH {
            return Err(TxError::invalid_length(
                "signature",
                2 * SIGNATURE_COMPONENT_LENGTH,
                compact.len(),
            ));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Ok(Self::new(r, s, recovery_id))
    }

    /// `r ‖ s`
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }
}

/// Range-checked, low-s signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub r: U256,
    pub s: U256,
    pub recovery_id: u8,
}

impl Signature {
    /// `r ‖ s` as 64 big-endian bytes
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        self.r.to_big_endian(&mut out[..32]);
        self.s.to_big_endian(&mut out[32..]);
        out
    }

    /// Replay-protected v for the given chain
    pub fn v(&self, chain_id: u64) -> TxResult<u64> {
        replay_protection::encode_v(chain_id, self.recovery_id)
    }
}

/// A signed legacy transaction, the unit handed to broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The signed fields
    pub tx: UnsignedTransaction,

    /// `2 * chainId + 35 + recoveryId`
    pub v: u64,

    /// Signature r value
    pub r: U256,

    /// Signature s value
    pub s: U256,
}

impl SignedTransaction {
    /// Combine signed fields with a canonical signature
    pub fn new(tx: UnsignedTransaction, signature: &Signature) -> TxResult<Self> {
        let v = signature.v(tx.chain_id)?;
        Ok(Self {
            tx,
            v,
            r: signature.r,
            s: signature.s,
        })
    }

    /// Signature triple with the recovery id taken back out of v
    pub fn signature(&self) -> TxResult<Signature> {
        let (_, recovery_id) = replay_protection::decode_v(self.v)?;
        Ok(Signature {
            r: self.r,
            s: self.s,
            recovery_id,
        })
    }
}

/// Logical transaction request as supplied by a caller
///
/// Quantities accept decimal or `0x`-hex strings. Missing gas or nonce are
/// filled from the network when a client is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Recipient address text; None for contract creation
    #[serde(default)]
    pub to: Option<String>,

    /// Value in wei
    #[serde(default)]
    pub value: Option<String>,

    /// Call data as hex
    #[serde(default)]
    pub data: Option<String>,

    /// Gas limit
    #[serde(default)]
    pub gas: Option<u64>,

    /// Gas price in wei
    #[serde(default)]
    pub gas_price: Option<String>,

    /// Sender nonce
    #[serde(default)]
    pub nonce: Option<u64>,

    /// Network identifier; the configured chain when absent
    #[serde(default)]
    pub chain_id: Option<u64>,
}
