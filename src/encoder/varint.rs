//! Varint and zigzag encoding for the Avro binary format.
//!
//! Avro uses the same varint encoding as Protocol Buffers: 7 data bits per
//! byte, least significant group first, with the high bit set on every byte
//! but the last. Signed values are zigzag mapped first so that small
//! negative numbers stay short: `(n << 1) ^ (n >> 63)`.

use bytes::{BufMut, BytesMut};

/// Append an unsigned varint to `buf`.
#[inline]
pub fn put_varint(buf: &mut BytesMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Append a zigzag-encoded signed varint to `buf`.
#[inline]
pub fn put_zigzag(buf: &mut BytesMut, value: i64) {
    put_varint(buf, ((value << 1) ^ (value >> 63)) as u64);
}

/// Encode an unsigned integer as a standalone varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(10);
    put_varint(&mut buf, value);
    buf.to_vec()
}

/// Encode a signed integer as a standalone zigzag varint.
pub fn encode_zigzag(value: i64) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(10);
    put_zigzag(&mut buf, value);
    buf.to_vec()
}
