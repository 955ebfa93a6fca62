//! Send Pipeline
//!
//! request → build → sign → assemble → self-check → broadcast
//!
//! The self-check decodes the assembled bytes again and requires that the
//! fields and the recovered sender match what was signed. A transaction that
//! fails it is never broadcast.

use crate::address::Address;
use crate::error::{TxError, TxResult};
use crate::signer::DigestSigner;
use crate::tx::assembler::assemble_with_hash;
use crate::tx::broadcaster::NetworkClient;
use crate::tx::builder::TransactionBuilder;
use crate::tx::coordinator::SigningCoordinator;
use crate::tx::verifier::decode_broadcast_transaction;
use crate::types::{SignedTransaction, TransactionRequest, UnsignedTransaction};
use serde::Serialize;

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    /// Device account that signed
    pub from: Address,

    /// Signed fields
    pub transaction: SignedTransaction,

    /// Broadcast bytes
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub raw: Vec<u8>,

    /// keccak256 of `raw`
    #[serde(with = "crate::serde_bytes::hex32")]
    pub hash: [u8; 32],

    /// Hash reported by the node, once broadcast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast_hash: Option<String>,
}

impl SendOutcome {
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

/// Stand-in client for pipelines that never touch the network
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

impl NetworkClient for NoNetwork {
    fn estimate_gas(&self, _tx: &UnsignedTransaction, _from: &Address) -> TxResult<u64> {
        Err(TxError::network("no network client configured; gas must be given"))
    }

    fn get_transaction_count(&self, _address: &Address) -> TxResult<u64> {
        Err(TxError::network("no network client configured; nonce must be given"))
    }

    fn send_raw_transaction(&self, _raw: &[u8]) -> TxResult<[u8; 32]> {
        Err(TxError::network("no network client configured; cannot broadcast"))
    }
}

/// Builds, signs, checks and optionally broadcasts transactions
pub struct TransactionPipeline<S, N> {
    coordinator: SigningCoordinator<S>,
    builder: TransactionBuilder,
    client: N,
}

impl<S: DigestSigner> TransactionPipeline<S, NoNetwork> {
    pub fn offline(coordinator: SigningCoordinator<S>, builder: TransactionBuilder) -> Self {
        Self::new(coordinator, builder, NoNetwork)
    }
}

impl<S: DigestSigner, N: NetworkClient> TransactionPipeline<S, N> {
    pub fn new(coordinator: SigningCoordinator<S>, builder: TransactionBuilder, client: N) -> Self {
        Self {
            coordinator,
            builder,
            client,
        }
    }

    pub fn coordinator(&self) -> &SigningCoordinator<S> {
        &self.coordinator
    }

    /// Build and sign a request without broadcasting it
    pub fn prepare(&self, request: &TransactionRequest) -> TxResult<SendOutcome> {
        let from = self.coordinator.sender_address()?;
        let tx = self.builder.build_with_network(request, &self.client, &from)?;
        self.sign_checked(tx, from)
    }

    /// Sign already-built fields without broadcasting
    pub fn prepare_unsigned(&self, tx: UnsignedTransaction) -> TxResult<SendOutcome> {
        let from = self.coordinator.sender_address()?;
        self.sign_checked(tx, from)
    }

    /// Build, sign and broadcast a request
    pub fn send(&self, request: &TransactionRequest) -> TxResult<SendOutcome> {
        let mut outcome = self.prepare(request)?;

        let reported = self.client.send_raw_transaction(&outcome.raw)?;
        if reported != outcome.hash {
            crate::log_warn!(
                "pipeline",
                "Node reported a different transaction hash",
                tx_hash = outcome.hash_hex(),
                reported_hash = hex::encode(reported),
            );
        }
        outcome.broadcast_hash = Some(format!("0x{}", hex::encode(reported)));
        Ok(outcome)
    }

    fn sign_checked(&self, tx: UnsignedTransaction, from: Address) -> TxResult<SendOutcome> {
        let signed = self.coordinator.sign_transaction(tx)?;
        let (raw, hash) = assemble_with_hash(&signed);

        let (decoded, recovered) = decode_broadcast_transaction(&raw)?;
        if decoded != signed {
            return Err(TxError::verification_failed(
                "assembled transaction does not decode to the signed fields",
            ));
        }
        if recovered != from {
            return Err(TxError::verification_failed(format!(
                "signature recovers {}, device key is {}",
                recovered, from
            )));
        }

        crate::log_info!(
            "pipeline",
            "Transaction ready",
            from = from,
            nonce = signed.tx.nonce,
            tx_hash = hex::encode(hash),
        );

        Ok(SendOutcome {
            from,
            transaction: signed,
            raw,
            hash,
            broadcast_hash: None,
        })
    }
}
