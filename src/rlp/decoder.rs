//! RLP decoding
//!
//! Decodes into borrowed [`RlpItem`]s. Every length prefix is checked against
//! the remaining buffer before any slicing happens.

use super::{LIST_OFFSET, SHORT_PAYLOAD_LIMIT, STRING_OFFSET};
use crate::error::{TxError, TxResult};
use ethers_core::types::U256;

/// Nesting limit; transactions only ever use one level
const MAX_DEPTH: usize = 16;

/// A decoded RLP item borrowing from the input buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem<'a> {
    String(&'a [u8]),
    List(Vec<RlpItem<'a>>),
}

impl<'a> RlpItem<'a> {
    pub fn as_bytes(&self) -> TxResult<&'a [u8]> {
        match self {
            RlpItem::String(bytes) => Ok(*bytes),
            RlpItem::List(_) => Err(TxError::rlp("expected a byte string, found a list")),
        }
    }

    pub fn as_list(&self) -> TxResult<&[RlpItem<'a>]> {
        match self {
            RlpItem::List(items) => Ok(items.as_slice()),
            RlpItem::String(_) => Err(TxError::rlp("expected a list, found a byte string")),
        }
    }

    /// Interpret as a canonical unsigned integer that fits in 64 bits
    pub fn as_u64(&self) -> TxResult<u64> {
        let bytes = self.as_integer_bytes(8)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Interpret as a canonical unsigned integer that fits in 256 bits
    pub fn as_u256(&self) -> TxResult<U256> {
        let bytes = self.as_integer_bytes(32)?;
        Ok(U256::from_big_endian(bytes))
    }

    fn as_integer_bytes(&self, max_len: usize) -> TxResult<&'a [u8]> {
        let bytes = self.as_bytes()?;
        if bytes.len() > max_len {
            return Err(TxError::rlp(format!(
                "integer of {} bytes exceeds {} bytes",
                bytes.len(),
                max_len
            )));
        }
        if bytes.first() == Some(&0) {
            return Err(TxError::rlp("integer has leading zero bytes"));
        }
        Ok(bytes)
    }
}

/// Decode exactly one item; trailing bytes are an error
pub fn decode(input: &[u8]) -> TxResult<RlpItem<'_>> {
    if input.is_empty() {
        return Err(TxError::rlp("empty input"));
    }

    let (item, consumed) = decode_item(input, 0)?;
    if consumed != input.len() {
        return Err(TxError::rlp(format!(
            "{} trailing bytes after top-level item",
            input.len() - consumed
        )));
    }
    Ok(item)
}

/// Decode one item from the front of `buf`, returning it and the bytes consumed
fn decode_item(buf: &[u8], depth: usize) -> TxResult<(RlpItem<'_>, usize)> {
    if depth > MAX_DEPTH {
        return Err(TxError::rlp("nesting too deep"));
    }

    let prefix = *buf.first().ok_or_else(|| TxError::rlp("unexpected end of input"))?;

    match prefix {
        0x00..=0x7f => Ok((RlpItem::String(&buf[..1]), 1)),
        0x80..=0xbf => {
            let (header_len, payload_len) = read_header(buf, STRING_OFFSET)?;
            let payload = &buf[header_len..header_len + payload_len];
            if payload_len == 1 && payload[0] < STRING_OFFSET {
                return Err(TxError::rlp(
                    "single byte below 0x80 must be encoded as itself",
                ));
            }
            Ok((RlpItem::String(payload), header_len + payload_len))
        }
        0xc0..=0xff => {
            let (header_len, payload_len) = read_header(buf, LIST_OFFSET)?;
            let mut payload = &buf[header_len..header_len + payload_len];

            let mut items = Vec::new();
            while !payload.is_empty() {
                let (item, consumed) = decode_item(payload, depth + 1)?;
                items.push(item);
                payload = &payload[consumed..];
            }
            Ok((RlpItem::List(items), header_len + payload_len))
        }
    }
}

/// Parse a string or list header starting at `buf[0]`.
///
/// Returns `(header_len, payload_len)` and guarantees that
/// `header_len + payload_len <= buf.len()`.
fn read_header(buf: &[u8], offset: u8) -> TxResult<(usize, usize)> {
    let prefix = buf[0];
    let short_max = offset + 55;

    let (header_len, payload_len) = if prefix <= short_max {
        (1, (prefix - offset) as usize)
    } else {
        let len_of_len = (prefix - short_max) as usize;
        let len_bytes = buf
            .get(1..1 + len_of_len)
            .ok_or_else(|| TxError::rlp("length prefix runs past end of input"))?;

        if len_bytes[0] == 0 {
            return Err(TxError::rlp("length prefix has leading zero bytes"));
        }
        if len_of_len > std::mem::size_of::<usize>() {
            return Err(TxError::rlp("length prefix too large"));
        }

        let payload_len = len_bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        if payload_len < SHORT_PAYLOAD_LIMIT {
            return Err(TxError::rlp("long-form length used for a short payload"));
        }
        (1 + len_of_len, payload_len)
    };

    let available = buf.len() - header_len;
    if payload_len > available {
        return Err(TxError::rlp(format!(
            "length prefix declares {} bytes but only {} remain",
            payload_len, available
        )));
    }

    Ok((header_len, payload_len))
}
