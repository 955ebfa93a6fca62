//! Signer Capability
//!
//! The private key lives on an external device that only ever sees 32-byte
//! digests. The pipeline talks to it through [`DigestSigner`]; everything the
//! device returns is treated as untrusted until range-checked and normalized.

mod exclusive;
mod fixed;
mod local;

pub use exclusive::ExclusiveSigner;
pub use fixed::FixedSigner;
pub use local::LocalKeySigner;

use crate::address::PUBLIC_KEY_LENGTH;
use crate::error::TxResult;
use crate::types::{KeyHandle, RawSignature, DIGEST_LENGTH};

/// Interface to a device that signs digests with a key it never exports
pub trait DigestSigner {
    /// Raw uncompressed public key (X ‖ Y) of a key slot
    fn public_key(&self, key: KeyHandle) -> TxResult<[u8; PUBLIC_KEY_LENGTH]>;

    /// Sign a digest. May block; may fail if the device is busy or rejects the key.
    fn sign(&self, digest: &[u8; DIGEST_LENGTH], key: KeyHandle) -> TxResult<RawSignature>;

    /// Ask the device whether a signature over a digest is valid for a key slot
    fn verify(
        &self,
        digest: &[u8; DIGEST_LENGTH],
        signature: &RawSignature,
        key: KeyHandle,
    ) -> TxResult<bool>;
}

impl<S: DigestSigner + ?Sized> DigestSigner for &S {
    fn public_key(&self, key: KeyHandle) -> TxResult<[u8; PUBLIC_KEY_LENGTH]> {
        (**self).public_key(key)
    }

    fn sign(&self, digest: &[u8; DIGEST_LENGTH], key: KeyHandle) -> TxResult<RawSignature> {
        (**self).sign(digest, key)
    }

    fn verify(
        &self,
        digest: &[u8; DIGEST_LENGTH],
        signature: &RawSignature,
        key: KeyHandle,
    ) -> TxResult<bool> {
        (**self).verify(digest, signature, key)
    }
}

impl<S: DigestSigner + ?Sized> DigestSigner for Box<S> {
    fn public_key(&self, key: KeyHandle) -> TxResult<[u8; PUBLIC_KEY_LENGTH]> {
        (**self).public_key(key)
    }

    fn sign(&self, digest: &[u8; DIGEST_LENGTH], key: KeyHandle) -> TxResult<RawSignature> {
        (**self).sign(digest, key)
    }

    fn verify(
        &self,
        digest: &[u8; DIGEST_LENGTH],
        signature: &RawSignature,
        key: KeyHandle,
    ) -> TxResult<bool> {
        (**self).verify(digest, signature, key)
    }
}
