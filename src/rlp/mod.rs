//! Recursive Length Prefix (RLP) Codec
//!
//! Canonical length-prefixed serialization used for both hashing and network
//! transmission of transactions. Only the two item kinds of the format are
//! modelled: byte strings and lists of items.
//!
//! Encoding is always minimal; decoding is strict and rejects anything the
//! encoder would not have produced, so `decode(encode(x)) == x` and
//! `encode(decode(b)) == b` for every accepted `b`.

pub mod decoder;
pub mod encoder;

pub use decoder::{decode, RlpItem};
pub use encoder::*;

/// Offset of a short string prefix (0x80 + length)
pub const STRING_OFFSET: u8 = 0x80;

/// Offset of a short list prefix (0xc0 + length)
pub const LIST_OFFSET: u8 = 0xc0;

/// Payloads shorter than this use the single-byte short form
pub const SHORT_PAYLOAD_LIMIT: usize = 56;
