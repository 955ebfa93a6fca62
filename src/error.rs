//! Unified error types for the signing pipeline
//!
//! Every encode/decode, signing and verification failure flows through
//! [`TxError`]. Errors carry a stable [`ErrorCode`] so callers (and the CLI)
//! can report them in machine-readable form.

use serde::{Deserialize, Serialize};

/// Main error type for all pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// An address, public key or signature component has the wrong byte length
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidFieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Malformed length prefix, wrong field count, trailing bytes, non-canonical integer
    #[error("RLP decode error: {0}")]
    RlpDecode(String),

    /// The signing device failed, was busy, or rejected the request
    #[error("Signer error: {0}")]
    Signer(String),

    /// r or s is zero or not below the curve order
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// Recovered or device-verified signer does not match the expected one
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// A mixed-case address string does not carry a valid checksum
    #[error("Checksum mismatch: got {given}, expected {expected}")]
    ChecksumMismatch { given: String, expected: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TxError {
    pub fn invalid_length(field: &'static str, expected: usize, actual: usize) -> Self {
        TxError::InvalidFieldLength {
            field,
            expected,
            actual,
        }
    }

    pub fn rlp(msg: impl Into<String>) -> Self {
        TxError::RlpDecode(msg.into())
    }

    pub fn signer(msg: impl Into<String>) -> Self {
        TxError::Signer(msg.into())
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        TxError::SignatureInvalid(msg.into())
    }

    pub fn verification_failed(msg: impl Into<String>) -> Self {
        TxError::VerificationFailed(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TxError::InvalidInput(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        TxError::Network(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        TxError::Config(msg.into())
    }

    /// Stable category of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TxError::InvalidFieldLength { .. } => ErrorCode::InvalidFieldLength,
            TxError::RlpDecode(_) => ErrorCode::RlpDecodeError,
            TxError::Signer(_) => ErrorCode::SignerError,
            TxError::SignatureInvalid(_) => ErrorCode::SignatureInvalid,
            TxError::VerificationFailed(_) => ErrorCode::VerificationFailed,
            TxError::ChecksumMismatch { .. } => ErrorCode::ChecksumMismatch,
            TxError::InvalidInput(_) => ErrorCode::InvalidInput,
            TxError::Network(_) => ErrorCode::NetworkError,
            TxError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Encoding errors
    InvalidFieldLength,
    RlpDecodeError,
    InvalidInput,

    // Crypto errors
    SignerError,
    SignatureInvalid,
    VerificationFailed,
    ChecksumMismatch,

    // Environment
    NetworkError,
    ConfigError,
}

/// Serializable error body, as emitted by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&TxError> for ErrorReport {
    fn from(e: &TxError) -> Self {
        ErrorReport {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

/// Result type alias for pipeline operations
pub type TxResult<T> = Result<T, TxError>;

// Conversions from common error types

impl From<hex::FromHexError> for TxError {
    fn from(e: hex::FromHexError) -> Self {
        TxError::InvalidInput(format!("Invalid hex: {}", e))
    }
}

impl From<serde_json::Error> for TxError {
    fn from(e: serde_json::Error) -> Self {
        TxError::InvalidInput(format!("Invalid JSON: {}", e))
    }
}

impl From<std::io::Error> for TxError {
    fn from(e: std::io::Error) -> Self {
        TxError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for TxError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TxError::Network("Request timed out".to_string())
        } else if e.is_connect() {
            TxError::Network("Connection failed".to_string())
        } else {
            TxError::Network(e.to_string())
        }
    }
}

impl From<secp256k1::Error> for TxError {
    fn from(e: secp256k1::Error) -> Self {
        TxError::SignatureInvalid(format!("secp256k1: {}", e))
    }
}
