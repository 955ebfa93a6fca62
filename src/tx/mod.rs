//! Transaction Module
//!
//! Encoding, signing, assembly, verification and broadcast of legacy
//! replay-protected transactions.

pub mod assembler;
pub mod broadcaster;
pub mod builder;
pub mod codec;
pub mod coordinator;
pub mod pipeline;
pub mod replay_protection;
pub mod verifier;

pub use assembler::{assemble, assemble_hex, assemble_signed, assemble_with_hash, transaction_hash};
pub use broadcaster::{JsonRpcClient, NetworkClient};
pub use builder::TransactionBuilder;
pub use codec::{
    decode_broadcast_payload, decode_signing_payload, encode_broadcast_payload,
    encode_signing_payload, signing_hash,
};
pub use coordinator::{canonicalize_signature, SigningCoordinator, SigningOutcome, SigningStage};
pub use pipeline::{NoNetwork, SendOutcome, TransactionPipeline};
pub use replay_protection::{chain_ids, decode_v, encode_v};
pub use verifier::{decode_broadcast_transaction, recover_address, verify_sender, DecodedTransaction};
