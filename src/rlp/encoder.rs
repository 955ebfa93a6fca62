//! RLP encoding helpers

use super::{LIST_OFFSET, SHORT_PAYLOAD_LIMIT, STRING_OFFSET};
use ethers_core::types::U256;

/// RLP encode a byte string
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < STRING_OFFSET {
        return data.to_vec();
    }

    let mut encoded = encode_header(data.len(), STRING_OFFSET);
    encoded.extend_from_slice(data);
    encoded
}

/// RLP encode an unsigned integer (minimal big-endian, zero is the empty string)
pub fn encode_u64(val: u64) -> Vec<u8> {
    encode_bytes(trim_leading_zeros(&val.to_be_bytes()))
}

/// RLP encode a 256-bit unsigned integer
pub fn encode_u256(val: &U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    val.to_big_endian(&mut bytes);
    encode_bytes(trim_leading_zeros(&bytes))
}

/// RLP encode a list of already-encoded items
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_len: usize = items.iter().map(Vec::len).sum();

    let mut encoded = encode_header(payload_len, LIST_OFFSET);
    encoded.reserve(payload_len);
    for item in items {
        encoded.extend_from_slice(item);
    }
    encoded
}

/// Build the prefix for a payload of `len` bytes.
///
/// Short form is `offset + len`; long form is `offset + 55 + len(len)`
/// followed by the big-endian length.
pub fn encode_header(len: usize, offset: u8) -> Vec<u8> {
    if len < SHORT_PAYLOAD_LIMIT {
        vec![offset + len as u8]
    } else {
        let len_bytes = encode_length(len);
        let mut header = Vec::with_capacity(1 + len_bytes.len());
        header.push(offset + 55 + len_bytes.len() as u8);
        header.extend_from_slice(&len_bytes);
        header
    }
}

/// Minimal big-endian bytes of a length
fn encode_length(len: usize) -> Vec<u8> {
    trim_leading_zeros(&len.to_be_bytes()).to_vec()
}

/// Drop leading zero bytes
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
