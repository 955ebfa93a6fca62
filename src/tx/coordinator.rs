//! Signing Coordinator
//!
//! Drives one transaction through the signing protocol:
//!
//! 1. **Build**: RLP-encode the signing payload and hash it to a digest
//! 2. **Sign**: hand the digest to the device and take back `(r, s, recoveryId)`
//! 3. **Normalize**: range-check, fold s into the low half of the curve order,
//!    have the device confirm the signature, and derive the replay-protected v
//!
//! Nothing is emitted unless every stage succeeds.

use crate::address::{address_from_public_key, Address};
use crate::crypto::{normalize_s, parse_raw_signature};
use crate::error::{TxError, TxResult};
use crate::signer::DigestSigner;
use crate::tx::codec::signing_hash;
use crate::tx::replay_protection::encode_v;
use crate::types::{KeyHandle, RawSignature, Signature, SignedTransaction, UnsignedTransaction, DIGEST_LENGTH};
use std::fmt;

/// Stage of the signing protocol, reported in logs and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    Build,
    Sign,
    Normalize,
}

impl fmt::Display for SigningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningStage::Build => write!(f, "build"),
            SigningStage::Sign => write!(f, "sign"),
            SigningStage::Normalize => write!(f, "normalize"),
        }
    }
}

/// Everything produced by one signing round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutcome {
    /// The digest the device signed
    pub digest: [u8; DIGEST_LENGTH],

    /// What the device returned
    pub raw: RawSignature,

    /// Canonical low-s signature
    pub signature: Signature,

    /// Whether normalization had to flip s
    pub normalized: bool,

    /// `2 * chainId + 35 + recoveryId`
    pub v: u64,
}

/// Turn a raw device signature into its canonical form.
///
/// Fails with `SignatureInvalid` if r or s is zero or not below the curve order.
pub fn canonicalize_signature(raw: &RawSignature) -> TxResult<(Signature, bool)> {
    let signature = parse_raw_signature(raw)?;
    Ok(normalize_s(signature))
}

/// Runs the build, sign and normalize stages against one device key
pub struct SigningCoordinator<S> {
    signer: S,
    key: KeyHandle,
}

impl<S: DigestSigner> SigningCoordinator<S> {
    pub fn new(signer: S, key: KeyHandle) -> Self {
        Self { signer, key }
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn key_handle(&self) -> KeyHandle {
        self.key
    }

    /// Address of the device key this coordinator signs with
    pub fn sender_address(&self) -> TxResult<Address> {
        let public_key = self.signer.public_key(self.key).map_err(into_signer_error)?;
        address_from_public_key(&public_key)
    }

    /// Sign and return the transaction ready for assembly
    pub fn sign_transaction(&self, tx: UnsignedTransaction) -> TxResult<SignedTransaction> {
        let outcome = self.sign(&tx)?;
        Ok(SignedTransaction {
            tx,
            v: outcome.v,
            r: outcome.signature.r,
            s: outcome.signature.s,
        })
    }

    /// Run all three stages for one transaction
    pub fn sign(&self, tx: &UnsignedTransaction) -> TxResult<SigningOutcome> {
        // v must be representable before the device is ever asked
        encode_v(tx.chain_id, 1)?;

        let digest = self.build(tx);
        let raw = self.request_signature(&digest)?;
        self.normalize(tx, digest, raw)
    }

    fn build(&self, tx: &UnsignedTransaction) -> [u8; DIGEST_LENGTH] {
        let digest = signing_hash(tx);
        crate::log_debug!(
            "coordinator",
            "Built signing digest",
            stage = SigningStage::Build,
            chain_id = tx.chain_id,
            nonce = tx.nonce,
            digest = hex::encode(digest),
        );
        digest
    }

    fn request_signature(&self, digest: &[u8; DIGEST_LENGTH]) -> TxResult<RawSignature> {
        self.signer.sign(digest, self.key).map_err(|e| {
            crate::log_error!(
                "coordinator",
                "Signer call failed",
                stage = SigningStage::Sign,
                key_handle = self.key,
                error = e,
            );
            into_signer_error(e)
        })
    }

    fn normalize(
        &self,
        tx: &UnsignedTransaction,
        digest: [u8; DIGEST_LENGTH],
        raw: RawSignature,
    ) -> TxResult<SigningOutcome> {
        let (signature, normalized) = canonicalize_signature(&raw)?;
        if normalized {
            crate::log_info!(
                "coordinator",
                "Normalized high-s signature",
                stage = SigningStage::Normalize,
                recovery_id = signature.recovery_id,
            );
        }

        let confirmed = self
            .signer
            .verify(&digest, &raw, self.key)
            .map_err(into_signer_error)?;
        if !confirmed {
            return Err(TxError::verification_failed(format!(
                "device did not confirm its signature over 0x{}",
                hex::encode(digest)
            )));
        }

        let v = encode_v(tx.chain_id, signature.recovery_id)?;
        crate::log_info!(
            "coordinator",
            "Transaction signed",
            chain_id = tx.chain_id,
            v = v,
            digest = hex::encode(digest),
        );

        Ok(SigningOutcome {
            digest,
            raw,
            signature,
            normalized,
            v,
        })
    }
}

fn into_signer_error(e: TxError) -> TxError {
    match e {
        TxError::Signer(_) => e,
        other => TxError::signer(other.to_string()),
    }
}
