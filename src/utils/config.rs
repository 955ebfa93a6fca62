//! Signer Configuration
//!
//! Settings are read from an optional JSON file, then overridden from the
//! environment, then validated once before use:
//!
//! | variable            | field            |
//! |---------------------|------------------|
//! | `HSM_TX_RPC_URL`    | `rpc_url`        |
//! | `HSM_TX_CHAIN_ID`   | `chain_id`       |
//! | `HSM_TX_GAS_PRICE`  | `gas_price_wei`  |
//! | `HSM_TX_DEBUG`      | `debug`          |

use crate::error::{TxError, TxResult};
use crate::utils::json::parse_u256;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const ENV_RPC_URL: &str = "HSM_TX_RPC_URL";
pub const ENV_CHAIN_ID: &str = "HSM_TX_CHAIN_ID";
pub const ENV_GAS_PRICE: &str = "HSM_TX_GAS_PRICE";
pub const ENV_DEBUG: &str = "HSM_TX_DEBUG";

/// Runtime configuration for the signing pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignerConfig {
    /// JSON-RPC endpoint for gas estimation, nonce lookup and broadcast
    pub rpc_url: String,

    /// Chain used for requests that do not name one
    pub chain_id: u64,

    /// Gas price used when a request does not carry one
    pub gas_price_wei: U256,

    /// Per-request network timeout
    pub request_timeout_secs: u64,

    /// Enable debug-level logging
    pub debug: bool,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 3,
            gas_price_wei: U256::from(5_000_000u64),
            request_timeout_secs: 15,
            debug: false,
        }
    }
}

impl SignerConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> TxResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TxError::config(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| TxError::config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> TxResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> TxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(chain_id) = lookup(ENV_CHAIN_ID) {
            self.chain_id = parse_env_number(ENV_CHAIN_ID, &chain_id)?;
        }
        if let Some(price) = lookup(ENV_GAS_PRICE) {
            self.gas_price_wei = parse_u256(&price)
                .map_err(|e| TxError::config(format!("{}: {}", ENV_GAS_PRICE, e)))?;
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = matches!(debug.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(self)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> TxResult<()> {
        let parsed = Url::parse(&self.rpc_url)
            .map_err(|e| TxError::config(format!("Invalid RPC URL '{}': {}", self.rpc_url, e)))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                let local = matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"));
                if !local {
                    crate::log_warn!("config", "Plain HTTP RPC endpoint", rpc_host = parsed.host_str().unwrap_or(""));
                }
            }
            other => {
                return Err(TxError::config(format!("Unsupported RPC URL scheme: {}", other)));
            }
        }

        if self.chain_id == 0 {
            return Err(TxError::config("chain id must be greater than zero"));
        }
        let fits = self
            .chain_id
            .checked_mul(2)
            .and_then(|c| c.checked_add(36))
            .is_some();
        if !fits {
            return Err(TxError::config(format!(
                "chain id {} is too large for a 64-bit v",
                self.chain_id
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(TxError::config("request timeout must be at least one second"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_env_number(name: &str, value: &str) -> TxResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| TxError::config(format!("{} is not a number: {}", name, value)))
}
