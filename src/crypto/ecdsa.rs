//! secp256k1 ECDSA helpers
//!
//! Everything the pipeline needs to reason about a signature it did not
//! produce itself: the curve order bounds, the low-s canonical form, and
//! recovery of the signing public key from `(digest, r, s, recoveryId)`.

use crate::address::PUBLIC_KEY_LENGTH;
use crate::error::{TxError, TxResult};
use crate::types::{RawSignature, Signature, DIGEST_LENGTH};
use ethers_core::types::U256;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature as EcdsaSignature};
use secp256k1::{Message, PublicKey, Secp256k1};

/// Curve order N
pub const SECP256K1_ORDER: U256 = U256([
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
]);

/// floor(N / 2), the largest canonical s
pub const SECP256K1_HALF_ORDER: U256 = U256([
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
]);

/// Check `0 < r < N`, `0 < s < N` and `recoveryId ∈ {0, 1}`
pub fn check_signature_range(r: &U256, s: &U256, recovery_id: u8) -> TxResult<()> {
    if r.is_zero() || *r >= SECP256K1_ORDER {
        return Err(TxError::invalid_signature("r is zero or not below the curve order"));
    }
    if s.is_zero() || *s >= SECP256K1_ORDER {
        return Err(TxError::invalid_signature("s is zero or not below the curve order"));
    }
    if recovery_id > 1 {
        return Err(TxError::invalid_signature(format!(
            "recovery id must be 0 or 1, got {}",
            recovery_id
        )));
    }
    Ok(())
}

/// Range-check a raw device signature and lift it into 256-bit components
pub fn parse_raw_signature(raw: &RawSignature) -> TxResult<Signature> {
    let r = U256::from_big_endian(&raw.r);
    let s = U256::from_big_endian(&raw.s);
    check_signature_range(&r, &s, raw.recovery_id)?;
    Ok(Signature {
        r,
        s,
        recovery_id: raw.recovery_id,
    })
}

/// Whether s is already in canonical low form
pub fn is_low_s(s: &U256) -> bool {
    *s <= SECP256K1_HALF_ORDER
}

/// Low-s normalization.
///
/// `(r, s, y)` and `(r, N - s, y ^ 1)` are both valid signatures of the same
/// digest under the same key; only the one with `s <= N/2` is canonical.
/// Returns the canonical signature and whether it was flipped.
pub fn normalize_s(signature: Signature) -> (Signature, bool) {
    if is_low_s(&signature.s) {
        return (signature, false);
    }

    let normalized = Signature {
        r: signature.r,
        s: SECP256K1_ORDER - signature.s,
        recovery_id: signature.recovery_id ^ 1,
    };
    (normalized, true)
}

/// Recover the raw 64-byte public key (X ‖ Y) that produced a signature
pub fn recover_public_key(
    digest: &[u8; DIGEST_LENGTH],
    signature: &Signature,
) -> TxResult<[u8; PUBLIC_KEY_LENGTH]> {
    check_signature_range(&signature.r, &signature.s, signature.recovery_id)?;

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);

    let recovery_id = RecoveryId::from_i32(signature.recovery_id as i32)?;
    let recoverable = RecoverableSignature::from_compact(&signature.to_compact(), recovery_id)?;

    let public_key = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| TxError::verification_failed(format!("public key recovery failed: {}", e)))?;

    Ok(strip_uncompressed_prefix(&public_key))
}

/// Verify a signature against a raw 64-byte public key.
///
/// High-s signatures are normalized first; the signature's own parity is
/// irrelevant to verification.
pub fn verify_signature(
    public_key: &[u8; PUBLIC_KEY_LENGTH],
    digest: &[u8; DIGEST_LENGTH],
    signature: &Signature,
) -> TxResult<bool> {
    check_signature_range(&signature.r, &signature.s, signature.recovery_id)?;

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);

    let mut prefixed = [0u8; PUBLIC_KEY_LENGTH + 1];
    prefixed[0] = 0x04;
    prefixed[1..].copy_from_slice(public_key);
    let public_key = PublicKey::from_slice(&prefixed)
        .map_err(|e| TxError::invalid_input(format!("public key not on curve: {}", e)))?;

    let mut sig = EcdsaSignature::from_compact(&signature.to_compact())?;
    sig.normalize_s();

    Ok(secp.verify_ecdsa(&message, &sig, &public_key).is_ok())
}

/// Serialize a public key as X ‖ Y without the `0x04` format byte
pub fn strip_uncompressed_prefix(public_key: &PublicKey) -> [u8; PUBLIC_KEY_LENGTH] {
    let serialized = public_key.serialize_uncompressed();
    let mut out = [0u8; PUBLIC_KEY_LENGTH];
    out.copy_from_slice(&serialized[1..]);
    out
}
