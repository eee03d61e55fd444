//! Avro binary encoder.

use std::io::Write;

use bytes::{BufMut, BytesMut};

use super::varint::{put_varint, put_zigzag};
use super::Encoder;
use crate::error::EncodeError;

/// Output is pushed to the sink once the buffer grows past this size.
const DEFAULT_FLUSH_THRESHOLD: usize = 64 * 1024;

/// Encodes into the Avro binary format, buffering in memory.
///
/// Ints, longs, lengths and counts are zigzag varints; floats and doubles
/// are little-endian IEEE 754; bytes and strings are length-prefixed.
/// Arrays and maps are written as a single block followed by a zero count.
///
/// # Example
/// ```
/// use avro_generic::encoder::{BinaryEncoder, Encoder};
///
/// let mut encoder = BinaryEncoder::new(Vec::new());
/// encoder.write_long(-2).unwrap();
/// encoder.write_string("ab").unwrap();
/// assert_eq!(encoder.into_inner().unwrap(), vec![0x03, 0x04, b'a', b'b']);
/// ```
#[derive(Debug)]
pub struct BinaryEncoder<W: Write> {
    sink: W,
    buffer: BytesMut,
    flush_threshold: usize,
}

impl<W: Write> BinaryEncoder<W> {
    pub fn new(sink: W) -> Self {
        Self::with_flush_threshold(sink, DEFAULT_FLUSH_THRESHOLD)
    }

    /// Create an encoder that pushes to the sink whenever `threshold` bytes are buffered.
    pub fn with_flush_threshold(sink: W, threshold: usize) -> Self {
        Self {
            sink,
            buffer: BytesMut::with_capacity(threshold.min(DEFAULT_FLUSH_THRESHOLD)),
            flush_threshold: threshold,
        }
    }

    /// Bytes encoded but not yet pushed to the sink.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flush and return the sink.
    pub fn into_inner(mut self) -> Result<W, EncodeError> {
        self.flush()?;
        Ok(self.sink)
    }

    fn maybe_drain(&mut self) -> Result<(), EncodeError> {
        if self.buffer.len() >= self.flush_threshold {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), EncodeError> {
        if !self.buffer.is_empty() {
            let chunk = self.buffer.split().freeze();
            self.sink.write_all(&chunk)?;
        }
        Ok(())
    }

    fn put_len(&mut self, len: usize) {
        put_zigzag(&mut self.buffer, len as i64);
    }
}

impl<W: Write> Encoder for BinaryEncoder<W> {
    fn write_null(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), EncodeError> {
        self.buffer.put_u8(u8::from(value));
        self.maybe_drain()
    }

    fn write_int(&mut self, value: i32) -> Result<(), EncodeError> {
        put_zigzag(&mut self.buffer, i64::from(value));
        self.maybe_drain()
    }

    fn write_long(&mut self, value: i64) -> Result<(), EncodeError> {
        put_zigzag(&mut self.buffer, value);
        self.maybe_drain()
    }

    fn write_float(&mut self, value: f32) -> Result<(), EncodeError> {
        self.buffer.put_f32_le(value);
        self.maybe_drain()
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.buffer.put_f64_le(value);
        self.maybe_drain()
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.put_len(value.len());
        self.buffer.put_slice(value);
        self.maybe_drain()
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.write_bytes(value.as_bytes())
    }

    fn write_fixed(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.buffer.put_slice(value);
        self.maybe_drain()
    }

    fn write_enum(&mut self, ordinal: usize) -> Result<(), EncodeError> {
        self.put_len(ordinal);
        self.maybe_drain()
    }

    fn write_array_start(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<(), EncodeError> {
        put_varint(&mut self.buffer, 0);
        self.maybe_drain()
    }

    fn write_map_start(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<(), EncodeError> {
        put_varint(&mut self.buffer, 0);
        self.maybe_drain()
    }

    fn write_block_count(&mut self, count: u64) -> Result<(), EncodeError> {
        if count > 0 {
            let count = i64::try_from(count).map_err(|_| {
                EncodeError::InvalidState(format!("block count {} is too large", count))
            })?;
            put_zigzag(&mut self.buffer, count);
        }
        Ok(())
    }

    fn write_index(&mut self, index: usize) -> Result<(), EncodeError> {
        self.put_len(index);
        self.maybe_drain()
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        self.drain()?;
        self.sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl FnOnce(&mut BinaryEncoder<Vec<u8>>)) -> Vec<u8> {
        let mut encoder = BinaryEncoder::new(Vec::new());
        f(&mut encoder);
        encoder.into_inner().unwrap()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(encode(|e| e.write_boolean(true).unwrap()), vec![0x01]);
        assert_eq!(encode(|e| e.write_int(-64).unwrap()), vec![0x7F]);
        assert_eq!(encode(|e| e.write_long(64).unwrap()), vec![0x80, 0x01]);
        assert_eq!(
            encode(|e| e.write_float(1.0).unwrap()),
            1.0f32.to_le_bytes().to_vec()
        );
        assert_eq!(encode(|e| e.write_null().unwrap()), Vec::<u8>::new());
        assert_eq!(encode(|e| e.write_fixed(&[1, 2]).unwrap()), vec![1, 2]);
    }

    #[test]
    fn test_array_framing() {
        let empty = encode(|e| {
            e.write_array_start().unwrap();
            e.write_block_count(0).unwrap();
            e.write_array_end().unwrap();
        });
        assert_eq!(empty, vec![0x00]);

        let two = encode(|e| {
            e.write_array_start().unwrap();
            e.write_block_count(2).unwrap();
            e.write_int(1).unwrap();
            e.write_int(2).unwrap();
            e.write_array_end().unwrap();
        });
        assert_eq!(two, vec![0x04, 0x02, 0x04, 0x00]);
    }

    #[test]
    fn test_small_threshold_drains_to_sink() {
        let mut encoder = BinaryEncoder::with_flush_threshold(Vec::new(), 4);
        encoder.write_string("hello").unwrap();
        assert!(encoder.buffered().is_empty());
        assert_eq!(encoder.get_ref().len(), 6);
    }
}
