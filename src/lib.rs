//! HSM Transaction Signer
//!
//! Builds, signs and serializes legacy replay-protected (EIP-155) account
//! transactions whose private key stays on an external signing device.
//!
//! # Architecture
//!
//! This crate provides:
//! - **address**: public key → address derivation and EIP-55 checksums
//! - **rlp**: canonical length-prefixed encoding with a strict decoder
//! - **crypto**: secp256k1 range checks, low-s normalization and key recovery
//! - **signer**: the device capability trait plus software and test signers
//! - **tx**: codec, signing coordinator, assembler, verifier, RPC client and
//!   the end-to-end send pipeline
//! - **utils**: hashing, hex parsing, logging and configuration
//!
//! # Security
//!
//! The device only ever sees 32-byte digests. Every signature it returns is
//! range-checked, normalized to low-s and confirmed before a transaction is
//! assembled. [`LocalKeySigner`] erases its secrets on drop.
//!
//! # Example
//!
//! ```rust,ignore
//! use hsm_tx_signer::{KeyHandle, LocalKeySigner, SigningCoordinator, TransactionBuilder, TransactionPipeline};
//!
//! let signer = LocalKeySigner::new().with_key(KeyHandle(16), &secret)?;
//! let pipeline = TransactionPipeline::offline(
//!     SigningCoordinator::new(signer, KeyHandle(16)),
//!     TransactionBuilder::new(),
//! );
//! let outcome = pipeline.prepare(&request)?;
//! println!("{}", outcome.raw_hex());
//! ```

pub mod address;
pub mod crypto;
pub mod error;
pub mod rlp;
pub mod serde_bytes;
pub mod signer;
pub mod tx;
pub mod types;
pub mod utils;

pub use address::{
    address_from_public_key, checksum_address_str, is_valid_checksum, parse_address,
    to_checksum_address, Address,
};
pub use error::{ErrorCode, ErrorReport, TxError, TxResult};
pub use signer::{DigestSigner, ExclusiveSigner, FixedSigner, LocalKeySigner};
pub use tx::{
    assemble, decode_broadcast_transaction, recover_address, transaction_hash,
    DecodedTransaction, JsonRpcClient, NetworkClient, SendOutcome, SigningCoordinator,
    TransactionBuilder, TransactionPipeline,
};
pub use types::*;
pub use utils::crypto::keccak256;
pub use utils::SignerConfig;
