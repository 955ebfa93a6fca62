//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod json;
pub mod config;
pub mod crypto;
pub mod logging;

pub use config::SignerConfig;
pub use crypto::*;
pub use json::*;
