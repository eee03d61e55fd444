//! Varint decoding for the Avro binary format.
//!
//! The inverse of [`crate::encoder::put_varint`] and
//! [`crate::encoder::put_zigzag`]. Zigzag decoding is `(n >> 1) ^ -(n & 1)`.

use crate::error::DecodeError;

/// Decode an unsigned variable-length integer.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
        *data = rest;

        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift += 7;
        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Decode a zigzag-encoded signed varint.
#[inline]
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let unsigned = decode_varint(data)?;
    Ok(((unsigned >> 1) as i64) ^ (-((unsigned & 1) as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_varint, encode_zigzag};

    #[test]
    fn test_decode_varint_single_byte() {
        let data = [0x00, 0x7F];
        let mut cursor = &data[..];
        assert_eq!(decode_varint(&mut cursor).unwrap(), 0);
        assert_eq!(decode_varint(&mut cursor).unwrap(), 127);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_decode_varint_multi_byte() {
        let data = [0xAC, 0x02];
        let mut cursor = &data[..];
        assert_eq!(decode_varint(&mut cursor).unwrap(), 300);
    }

    #[test]
    fn test_decode_varint_truncated() {
        let data = [0x80];
        let mut cursor = &data[..];
        assert!(matches!(
            decode_varint(&mut cursor),
            Err(DecodeError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_decode_varint_too_long() {
        let data = [0xFF; 11];
        let mut cursor = &data[..];
        assert!(matches!(
            decode_varint(&mut cursor),
            Err(DecodeError::InvalidVarint)
        ));
    }

    #[test]
    fn test_zigzag_extremes() {
        for value in [0, -1, 1, i64::MIN, i64::MAX, -64, 64] {
            let encoded = encode_zigzag(value);
            let mut cursor = &encoded[..];
            assert_eq!(decode_zigzag(&mut cursor).unwrap(), value);
        }
        let encoded = encode_varint(u64::MAX);
        let mut cursor = &encoded[..];
        assert_eq!(decode_varint(&mut cursor).unwrap(), u64::MAX);
    }
}
