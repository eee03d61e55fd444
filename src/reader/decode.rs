//! Primitive decoders for the Avro binary format.
//!
//! Each decoder takes a cursor over the input and advances it past the
//! bytes it consumed.

use super::varint::decode_zigzag;
use crate::error::DecodeError;

#[inline]
fn take<'a>(data: &mut &'a [u8], len: usize) -> Result<&'a [u8], DecodeError> {
    if data.len() < len {
        return Err(DecodeError::UnexpectedEof);
    }
    let (head, rest) = data.split_at(len);
    *data = rest;
    Ok(head)
}

/// Decode a boolean: a single byte, 0 or 1.
#[inline]
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    match take(data, 1)?[0] {
        0 => Ok(false),
        1 => Ok(true),
        byte => Err(DecodeError::InvalidData(format!(
            "Invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

#[inline]
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = decode_long(data)?;
    i32::try_from(long).map_err(|_| {
        DecodeError::InvalidData(format!("Integer overflow: {} does not fit in i32", long))
    })
}

#[inline]
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    decode_zigzag(data)
}

#[inline]
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(take(data, 4)?);
    Ok(f32::from_le_bytes(bytes))
}

#[inline]
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(take(data, 8)?);
    Ok(f64::from_le_bytes(bytes))
}

/// Decode a non-negative length or count that indexes into memory.
pub fn decode_len(data: &mut &[u8], what: &str) -> Result<usize, DecodeError> {
    let len = decode_long(data)?;
    usize::try_from(len)
        .map_err(|_| DecodeError::InvalidData(format!("Negative {}: {}", what, len)))
}

/// Decode a length-prefixed byte array.
#[inline]
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = decode_len(data, "bytes length")?;
    Ok(take(data, len)?.to_vec())
}

/// Decode a length-prefixed UTF-8 string.
#[inline]
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(DecodeError::from)
}

#[inline]
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    Ok(take(data, size)?.to_vec())
}

/// Decode a zero-based index and check it against `bound`.
pub fn decode_index(data: &mut &[u8], bound: usize, what: &str) -> Result<usize, DecodeError> {
    let index = decode_int(data)?;
    match usize::try_from(index) {
        Ok(index) if index < bound => Ok(index),
        _ => Err(DecodeError::InvalidData(format!(
            "{} index {} out of range (0..{})",
            what, index, bound
        ))),
    }
}

/// Decode the item count that opens an array or map block.
///
/// A negative count is followed by the block's byte size, which is read
/// and discarded. Zero ends the container.
pub fn decode_block_count(data: &mut &[u8]) -> Result<usize, DecodeError> {
    let count = decode_long(data)?;
    if count < 0 {
        let _byte_size = decode_long(data)?;
    }
    usize::try_from(count.unsigned_abs())
        .map_err(|_| DecodeError::InvalidData(format!("Block count {} is too large", count)))
}
