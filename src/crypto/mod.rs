//! Cryptographic primitives
//!
//! Curve-level operations on secp256k1 ECDSA signatures: range checks,
//! low-s normalization, public-key recovery and verification.

pub mod ecdsa;

pub use ecdsa::*;
