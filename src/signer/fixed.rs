//! Deterministic signer double: fixed digest in, fixed signature out

use super::DigestSigner;
use crate::address::PUBLIC_KEY_LENGTH;
use crate::error::{TxError, TxResult};
use crate::types::{KeyHandle, RawSignature, DIGEST_LENGTH};
use std::collections::HashMap;

/// Replays pre-recorded signatures.
///
/// Signing an unknown digest fails with a signer error, which makes the
/// double usable for device-rejection paths too.
#[derive(Debug, Clone)]
pub struct FixedSigner {
    public_key: [u8; PUBLIC_KEY_LENGTH],
    signatures: HashMap<[u8; DIGEST_LENGTH], RawSignature>,
    verify_result: bool,
}

impl FixedSigner {
    pub fn new(public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self {
            public_key,
            signatures: HashMap::new(),
            verify_result: true,
        }
    }

    /// Answer `digest` with `signature`
    pub fn with_signature(mut self, digest: [u8; DIGEST_LENGTH], signature: RawSignature) -> Self {
        self.signatures.insert(digest, signature);
        self
    }

    /// Fixed answer of [`DigestSigner::verify`]
    pub fn with_verify_result(mut self, result: bool) -> Self {
        self.verify_result = result;
        self
    }
}

impl DigestSigner for FixedSigner {
    fn public_key(&self, _key: KeyHandle) -> TxResult<[u8; PUBLIC_KEY_LENGTH]> {
        Ok(self.public_key)
    }

    fn sign(&self, digest: &[u8; DIGEST_LENGTH], key: KeyHandle) -> TxResult<RawSignature> {
        self.signatures.get(digest).copied().ok_or_else(|| {
            TxError::signer(format!(
                "{} rejected digest 0x{}",
                key,
                hex::encode(digest)
            ))
        })
    }

    fn verify(
        &self,
        _digest: &[u8; DIGEST_LENGTH],
        _signature: &RawSignature,
        _key: KeyHandle,
    ) -> TxResult<bool> {
        Ok(self.verify_result)
    }
}
