//! In-process software signer
//!
//! Stands in for the device during development and in tests. Secrets are
//! handed in by the caller, one per key slot; this type never generates or
//! persists keys.

use super::DigestSigner;
use crate::address::PUBLIC_KEY_LENGTH;
use crate::crypto::{parse_raw_signature, strip_uncompressed_prefix, verify_signature, SECP256K1_ORDER};
use crate::error::{TxError, TxResult};
use crate::types::{KeyHandle, RawSignature, DIGEST_LENGTH};
use crate::utils::json::parse_hex_bytes;
use ethers_core::types::U256;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroizing;

/// Software implementation of [`DigestSigner`] over secp256k1
pub struct LocalKeySigner {
    secp: Secp256k1<All>,
    keys: HashMap<KeyHandle, SecretKey>,
    high_s_output: bool,
}

impl LocalKeySigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
            keys: HashMap::new(),
            high_s_output: false,
        }
    }

    /// Install a 32-byte secret into a key slot
    pub fn with_key(mut self, key: KeyHandle, secret: &[u8]) -> TxResult<Self> {
        if secret.len() != 32 {
            return Err(TxError::invalid_length("secret key", 32, secret.len()));
        }
        let secret_key = SecretKey::from_slice(secret)
            .map_err(|_| TxError::invalid_input("secret key is zero or not below the curve order"))?;

        if let Some(mut replaced) = self.keys.insert(key, secret_key) {
            replaced.non_secure_erase();
        }
        Ok(self)
    }

    /// Install a hex-encoded secret into a key slot
    pub fn with_hex_key(self, key: KeyHandle, secret_hex: &str) -> TxResult<Self> {
        let secret = Zeroizing::new(parse_hex_bytes(secret_hex)?);
        self.with_key(key, &secret)
    }

    /// Return the high-s twin of every signature, the way some devices do
    pub fn with_high_s_output(mut self, enabled: bool) -> Self {
        self.high_s_output = enabled;
        self
    }

    fn secret(&self, key: KeyHandle) -> TxResult<&SecretKey> {
        self.keys
            .get(&key)
            .ok_or_else(|| TxError::signer(format!("no key installed in {}", key)))
    }
}

impl Default for LocalKeySigner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("slots", &self.keys.len())
            .field("high_s_output", &self.high_s_output)
            .finish()
    }
}

impl Drop for LocalKeySigner {
    fn drop(&mut self) {
        for secret in self.keys.values_mut() {
            secret.non_secure_erase();
        }
    }
}

impl DigestSigner for LocalKeySigner {
    fn public_key(&self, key: KeyHandle) -> TxResult<[u8; PUBLIC_KEY_LENGTH]> {
        let public_key = PublicKey::from_secret_key(&self.secp, self.secret(key)?);
        Ok(strip_uncompressed_prefix(&public_key))
    }

    fn sign(&self, digest: &[u8; DIGEST_LENGTH], key: KeyHandle) -> TxResult<RawSignature> {
        let message = Message::from_digest(*digest);
        let signature = self.secp.sign_ecdsa_recoverable(&message, self.secret(key)?);
        let (recovery_id, compact) = signature.serialize_compact();

        let recovery_id = u8::try_from(recovery_id.to_i32())
            .map_err(|_| TxError::signer("recovery id out of range"))?;
        let mut raw = RawSignature::from_compact(&compact, recovery_id)?;

        if self.high_s_output {
            let s = SECP256K1_ORDER - U256::from_big_endian(&raw.s);
            s.to_big_endian(&mut raw.s);
            raw.recovery_id ^= 1;
        }

        crate::log_debug!("local_signer", "Signed digest", digest = hex::encode(digest));
        Ok(raw)
    }

    fn verify(
        &self,
        digest: &[u8; DIGEST_LENGTH],
        signature: &RawSignature,
        key: KeyHandle,
    ) -> TxResult<bool> {
        let public_key = self.public_key(key)?;
        match parse_raw_signature(signature) {
            Ok(parsed) => verify_signature(&public_key, digest, &parsed),
            Err(_) => Ok(false),
        }
    }
}
