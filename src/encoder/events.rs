//! An encoder that records the calls it receives.

use super::Encoder;
use crate::error::EncodeError;

/// One call made on an [`EventEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderEvent {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    Fixed(Vec<u8>),
    Enum(usize),
    ArrayStart,
    ArrayEnd,
    MapStart,
    MapEnd,
    BlockCount(u64),
    StartItem,
    Index(usize),
    Flush,
}

/// Records the ordered sequence of encoder calls, independent of any byte layout.
#[derive(Debug, Default, Clone)]
pub struct EventEncoder {
    events: Vec<EncoderEvent>,
}

impl EventEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[EncoderEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<EncoderEvent> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: EncoderEvent) -> Result<(), EncodeError> {
        self.events.push(event);
        Ok(())
    }
}

impl Encoder for EventEncoder {
    fn write_null(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Null)
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Boolean(value))
    }

    fn write_int(&mut self, value: i32) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Int(value))
    }

    fn write_long(&mut self, value: i64) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Long(value))
    }

    fn write_float(&mut self, value: f32) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Float(value))
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Double(value))
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Bytes(value.to_vec()))
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.record(EncoderEvent::String(value.to_string()))
    }

    fn write_fixed(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Fixed(value.to_vec()))
    }

    fn write_enum(&mut self, ordinal: usize) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Enum(ordinal))
    }

    fn write_array_start(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::ArrayStart)
    }

    fn write_array_end(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::ArrayEnd)
    }

    fn write_map_start(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::MapStart)
    }

    fn write_map_end(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::MapEnd)
    }

    fn write_block_count(&mut self, count: u64) -> Result<(), EncodeError> {
        self.record(EncoderEvent::BlockCount(count))
    }

    fn start_item(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::StartItem)
    }

    fn write_index(&mut self, index: usize) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Index(index))
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        self.record(EncoderEvent::Flush)
    }
}
