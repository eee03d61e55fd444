//! The encoder boundary.
//!
//! The writer drives an [`Encoder`] with an ordered sequence of primitive
//! calls; the encoder decides the byte layout. [`BinaryEncoder`] produces
//! the Avro binary encoding and [`EventEncoder`] records the calls.

mod binary;
mod events;
mod varint;

pub use binary::BinaryEncoder;
pub use events::{EncoderEvent, EventEncoder};
pub use varint::{encode_varint, encode_zigzag, put_varint, put_zigzag};

use crate::error::EncodeError;

/// Primitive write operations, called in schema order.
///
/// Arrays and maps are written as a start marker, then for a non-empty
/// container a block count followed by one `start_item` plus the item's
/// writes per element, then an end marker. Union members are preceded by
/// their zero-based index.
pub trait Encoder {
    fn write_null(&mut self) -> Result<(), EncodeError>;
    fn write_boolean(&mut self, value: bool) -> Result<(), EncodeError>;
    fn write_int(&mut self, value: i32) -> Result<(), EncodeError>;
    fn write_long(&mut self, value: i64) -> Result<(), EncodeError>;
    fn write_float(&mut self, value: f32) -> Result<(), EncodeError>;
    fn write_double(&mut self, value: f64) -> Result<(), EncodeError>;
    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError>;
    fn write_string(&mut self, value: &str) -> Result<(), EncodeError>;
    fn write_fixed(&mut self, value: &[u8]) -> Result<(), EncodeError>;
    /// Write an enum symbol by its ordinal.
    fn write_enum(&mut self, ordinal: usize) -> Result<(), EncodeError>;

    fn write_array_start(&mut self) -> Result<(), EncodeError>;
    fn write_array_end(&mut self) -> Result<(), EncodeError>;
    fn write_map_start(&mut self) -> Result<(), EncodeError>;
    fn write_map_end(&mut self) -> Result<(), EncodeError>;

    /// Announce the number of items in the block that follows.
    fn write_block_count(&mut self, count: u64) -> Result<(), EncodeError>;

    /// Mark the start of one array element or map entry.
    fn start_item(&mut self) -> Result<(), EncodeError> {
        Ok(())
    }

    /// Write the index of the union member that follows.
    fn write_index(&mut self, index: usize) -> Result<(), EncodeError>;

    /// Push buffered output to the underlying sink.
    fn flush(&mut self) -> Result<(), EncodeError>;
}

impl<E: Encoder + ?Sized> Encoder for &mut E {
    fn write_null(&mut self) -> Result<(), EncodeError> {
        (**self).write_null()
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), EncodeError> {
        (**self).write_boolean(value)
    }

    fn write_int(&mut self, value: i32) -> Result<(), EncodeError> {
        (**self).write_int(value)
    }

    fn write_long(&mut self, value: i64) -> Result<(), EncodeError> {
        (**self).write_long(value)
    }

    fn write_float(&mut self, value: f32) -> Result<(), EncodeError> {
        (**self).write_float(value)
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        (**self).write_double(value)
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        (**self).write_bytes(value)
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        (**self).write_string(value)
    }

    fn write_fixed(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        (**self).write_fixed(value)
    }

    fn write_enum(&mut self, ordinal: usize) -> Result<(), EncodeError> {
        (**self).write_enum(ordinal)
    }

    fn write_array_start(&mut self) -> Result<(), EncodeError> {
        (**self).write_array_start()
    }

    fn write_array_end(&mut self) -> Result<(), EncodeError> {
        (**self).write_array_end()
    }

    fn write_map_start(&mut self) -> Result<(), EncodeError> {
        (**self).write_map_start()
    }

    fn write_map_end(&mut self) -> Result<(), EncodeError> {
        (**self).write_map_end()
    }

    fn write_block_count(&mut self, count: u64) -> Result<(), EncodeError> {
        (**self).write_block_count(count)
    }

    fn start_item(&mut self) -> Result<(), EncodeError> {
        (**self).start_item()
    }

    fn write_index(&mut self, index: usize) -> Result<(), EncodeError> {
        (**self).write_index(index)
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        (**self).flush()
    }
}
