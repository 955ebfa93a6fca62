//! Transaction Builder
//!
//! Turns a caller's [`TransactionRequest`] into an [`UnsignedTransaction`].
//! Offline builds need every field; network builds fill a missing nonce and
//! gas limit from the node. A request without a chain id takes the builder's
//! default chain.

use crate::address::{parse_address, Address};
use crate::error::{TxError, TxResult};
use crate::tx::broadcaster::NetworkClient;
use crate::types::{TransactionRequest, UnsignedTransaction};
use crate::utils::config::SignerConfig;
use crate::utils::json::{parse_hex_bytes, parse_u256};
use ethers_core::types::U256;

/// Builds unsigned transactions from requests
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    default_gas_price: Option<U256>,
    default_chain_id: Option<u64>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gas price used when a request carries none
    pub fn with_default_gas_price(mut self, gas_price: U256) -> Self {
        self.default_gas_price = Some(gas_price);
        self
    }

    pub fn with_default_chain_id(mut self, chain_id: u64) -> Self {
        self.default_chain_id = Some(chain_id);
        self
    }

    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new()
            .with_default_gas_price(config.gas_price_wei)
            .with_default_chain_id(config.chain_id)
    }

    /// Build without a network; nonce and gas must be present
    pub fn build(&self, request: &TransactionRequest) -> TxResult<UnsignedTransaction> {
        let nonce = request
            .nonce
            .ok_or_else(|| TxError::invalid_input("Nonce required when building offline"))?;
        let gas = request
            .gas
            .ok_or_else(|| TxError::invalid_input("Gas limit required when building offline"))?;

        Ok(self.base(request)?.with_nonce(nonce).with_gas_limit(gas))
    }

    /// Build, asking the node for a missing nonce or gas limit
    pub fn build_with_network<N: NetworkClient>(
        &self,
        request: &TransactionRequest,
        client: &N,
        sender: &Address,
    ) -> TxResult<UnsignedTransaction> {
        let mut tx = self.base(request)?;

        tx.nonce = match request.nonce {
            Some(nonce) => nonce,
            None => {
                let nonce = client.get_transaction_count(sender)?;
                crate::log_debug!("builder", "Fetched nonce", sender = sender, nonce = nonce);
                nonce
            }
        };

        tx.gas_limit = match request.gas {
            Some(gas) => gas,
            None => {
                let gas = client.estimate_gas(&tx, sender)?;
                crate::log_debug!("builder", "Estimated gas", gas = gas);
                gas
            }
        };

        Ok(tx)
    }

    fn base(&self, request: &TransactionRequest) -> TxResult<UnsignedTransaction> {
        let chain_id = request
            .chain_id
            .or(self.default_chain_id)
            .ok_or_else(|| TxError::invalid_input("chainId required"))?;
        if chain_id == 0 {
            return Err(TxError::invalid_input("chainId must be greater than zero"));
        }

        let gas_price = match (&request.gas_price, self.default_gas_price) {
            (Some(text), _) => parse_u256(text)?,
            (None, Some(default)) => default,
            (None, None) => return Err(TxError::invalid_input("Gas price required")),
        };

        let mut tx = UnsignedTransaction::new(chain_id).with_gas_price(gas_price);

        if let Some(to) = request.to.as_deref().filter(|s| !s.trim().is_empty()) {
            tx = tx.with_to(parse_address(to)?);
        }
        if let Some(value) = &request.value {
            tx = tx.with_value(parse_u256(value)?);
        }
        if let Some(data) = &request.data {
            tx = tx.with_data(parse_hex_bytes(data)?);
        }

        if tx.is_contract_creation() && tx.data.is_empty() {
            crate::log_warn!("builder", "Contract creation with empty init code", chain_id = chain_id);
        }

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn request() -> TransactionRequest {
        TransactionRequest {
            to: Some("0x15C25E6EB5dE729d7e310d059e59659cCB86E6f6".into()),
            value: Some("1".into()),
            data: None,
            gas: Some(21_000),
            gas_price: Some("5000000".into()),
            nonce: Some(0),
            chain_id: Some(3),
        }
    }

    /// Counts calls and answers with fixed values
    #[derive(Default)]
    struct StubNode {
        estimates: Cell<u32>,
        nonce_lookups: Cell<u32>,
    }

    impl NetworkClient for StubNode {
        fn estimate_gas(&self, _tx: &UnsignedTransaction, _from: &Address) -> TxResult<u64> {
            self.estimates.set(self.estimates.get() + 1);
            Ok(21_000)
        }

        fn get_transaction_count(&self, _address: &Address) -> TxResult<u64> {
            self.nonce_lookups.set(self.nonce_lookups.get() + 1);
            Ok(12)
        }

        fn send_raw_transaction(&self, _raw: &[u8]) -> TxResult<[u8; 32]> {
            Err(TxError::network("not used"))
        }
    }

    #[test]
    fn test_build_offline() {
        let tx = TransactionBuilder::new().build(&request()).unwrap();
        assert_eq!(tx.nonce, 0);
        assert_eq!(tx.gas_price, U256::from(5_000_000u64));
        assert_eq!(tx.gas_limit, 21_000);
        assert_eq!(tx.value, U256::one());
        assert_eq!(tx.chain_id, 3);
        assert!(tx.data.is_empty());
    }

    #[test]
    fn test_build_offline_requires_nonce_and_gas() {
        let mut req = request();
        req.nonce = None;
        assert!(TransactionBuilder::new().build(&req).is_err());

        let mut req = request();
        req.gas = None;
        assert!(TransactionBuilder::new().build(&req).is_err());
    }

    #[test]
    fn test_default_gas_price() {
        let mut req = request();
        req.gas_price = None;
        assert!(TransactionBuilder::new().build(&req).is_err());

        let tx = TransactionBuilder::new()
            .with_default_gas_price(U256::from(7u64))
            .build(&req)
            .unwrap();
        assert_eq!(tx.gas_price, U256::from(7u64));
    }

    #[test]
    fn test_bad_checksum_in_request() {
        let mut req = request();
        req.to = Some("0x15C25E6EB5dE729d7e310d059e59659cCB86E6F6".into());
        assert!(matches!(
            TransactionBuilder::new().build(&req),
            Err(TxError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_creation_without_code_allowed() {
        let mut req = request();
        req.to = None;
        let tx = TransactionBuilder::new().build(&req).unwrap();
        assert!(tx.is_contract_creation());
        assert!(tx.data.is_empty());

        req.data = Some("0x6080".into());
        let tx = TransactionBuilder::new().build(&req).unwrap();
        assert!(tx.is_contract_creation());
        assert_eq!(tx.data, vec![0x60, 0x80]);
    }

    #[test]
    fn test_chain_id_falls_back_to_default() {
        let mut req = request();
        req.chain_id = None;
        assert!(matches!(
            TransactionBuilder::new().build(&req),
            Err(TxError::InvalidInput(_))
        ));

        let tx = TransactionBuilder::new()
            .with_default_chain_id(1)
            .build(&req)
            .unwrap();
        assert_eq!(tx.chain_id, 1);

        req.chain_id = Some(5);
        let tx = TransactionBuilder::new()
            .with_default_chain_id(1)
            .build(&req)
            .unwrap();
        assert_eq!(tx.chain_id, 5);
    }

    #[test]
    fn test_zero_chain_id_rejected() {
        let mut req = request();
        req.chain_id = Some(0);
        assert!(TransactionBuilder::new().build(&req).is_err());

        req.chain_id = None;
        assert!(TransactionBuilder::new().with_default_chain_id(0).build(&req).is_err());
    }

    #[test]
    fn test_from_config_defaults() {
        let config = SignerConfig {
            chain_id: 11_155_111,
            gas_price_wei: U256::from(9u64),
            ..SignerConfig::default()
        };
        let mut req = request();
        req.chain_id = None;
        req.gas_price = None;

        let tx = TransactionBuilder::from_config(&config).build(&req).unwrap();
        assert_eq!(tx.chain_id, 11_155_111);
        assert_eq!(tx.gas_price, U256::from(9u64));
    }

    #[test]
    fn test_network_fill() {
        let node = StubNode::default();
        let mut req = request();
        req.nonce = None;
        req.gas = None;

        let tx = TransactionBuilder::new()
            .build_with_network(&req, &node, &Address([0xaa; 20]))
            .unwrap();
        assert_eq!(tx.nonce, 12);
        assert_eq!(tx.gas_limit, 21_000);
        assert_eq!(node.estimates.get(), 1);
        assert_eq!(node.nonce_lookups.get(), 1);
    }

    #[test]
    fn test_network_not_consulted_when_fields_present() {
        let node = StubNode::default();
        TransactionBuilder::new()
            .build_with_network(&request(), &node, &Address([0xaa; 20]))
            .unwrap();
        assert_eq!(node.estimates.get(), 0);
        assert_eq!(node.nonce_lookups.get(), 0);
    }
}
