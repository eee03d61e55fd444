//! Fail-fast detection of containers modified while they are being written.
//!
//! A `PausingEncoder` stops at a chosen call and waits for the test thread,
//! which mutates the container before letting the write continue.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use avro_generic::encoder::{Encoder, EventEncoder};
use avro_generic::error::{EncodeError, WriteError};
use avro_generic::generic::{GenericArray, GenericMap, GenericValue};
use avro_generic::schema::Schema;
use avro_generic::writer::GenericDatumWriter;

#[derive(Debug, Clone, Copy, PartialEq)]
enum PausePoint {
    ContainerStart,
    /// Before the n-th item (zero based)
    Item(usize),
}

struct PausingEncoder {
    inner: EventEncoder,
    pause_at: PausePoint,
    items_seen: usize,
    paused: Sender<()>,
    resume: Receiver<()>,
}

impl PausingEncoder {
    fn new(pause_at: PausePoint) -> (Self, Receiver<()>, Sender<()>) {
        let (paused_tx, paused_rx) = channel();
        let (resume_tx, resume_rx) = channel();
        let encoder = Self {
            inner: EventEncoder::new(),
            pause_at,
            items_seen: 0,
            paused: paused_tx,
            resume: resume_rx,
        };
        (encoder, paused_rx, resume_tx)
    }

    fn pause(&mut self) -> Result<(), EncodeError> {
        self.paused
            .send(())
            .map_err(|e| EncodeError::InvalidState(e.to_string()))?;
        self.resume
            .recv()
            .map_err(|e| EncodeError::InvalidState(e.to_string()))
    }
}

impl Encoder for PausingEncoder {
    fn write_null(&mut self) -> Result<(), EncodeError> {
        self.inner.write_null()
    }

    fn write_boolean(&mut self, value: bool) -> Result<(), EncodeError> {
        self.inner.write_boolean(value)
    }

    fn write_int(&mut self, value: i32) -> Result<(), EncodeError> {
        self.inner.write_int(value)
    }

    fn write_long(&mut self, value: i64) -> Result<(), EncodeError> {
        self.inner.write_long(value)
    }

    fn write_float(&mut self, value: f32) -> Result<(), EncodeError> {
        self.inner.write_float(value)
    }

    fn write_double(&mut self, value: f64) -> Result<(), EncodeError> {
        self.inner.write_double(value)
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.inner.write_bytes(value)
    }

    fn write_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.inner.write_string(value)
    }

    fn write_fixed(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        self.inner.write_fixed(value)
    }

    fn write_enum(&mut self, ordinal: usize) -> Result<(), EncodeError> {
        self.inner.write_enum(ordinal)
    }

    fn write_array_start(&mut self) -> Result<(), EncodeError> {
        self.inner.write_array_start()?;
        if self.pause_at == PausePoint::ContainerStart {
            self.pause()?;
        }
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<(), EncodeError> {
        self.inner.write_array_end()
    }

    fn write_map_start(&mut self) -> Result<(), EncodeError> {
        self.inner.write_map_start()?;
        if self.pause_at == PausePoint::ContainerStart {
            self.pause()?;
        }
        Ok(())
    }

    fn write_map_end(&mut self) -> Result<(), EncodeError> {
        self.inner.write_map_end()
    }

    fn write_block_count(&mut self, count: u64) -> Result<(), EncodeError> {
        self.inner.write_block_count(count)
    }

    fn start_item(&mut self) -> Result<(), EncodeError> {
        if self.pause_at == PausePoint::Item(self.items_seen) {
            self.pause()?;
        }
        self.items_seen += 1;
        self.inner.start_item()
    }

    fn write_index(&mut self, index: usize) -> Result<(), EncodeError> {
        self.inner.write_index(index)
    }

    fn flush(&mut self) -> Result<(), EncodeError> {
        self.inner.flush()
    }
}

/// Write `value` on another thread, run `mutate` while the encoder is
/// paused, and return the write's outcome.
fn write_with_interference(
    schema: &Schema,
    value: GenericValue,
    pause_at: PausePoint,
    mutate: impl FnOnce(),
) -> Result<(), WriteError> {
    let (mut encoder, paused, resume) = PausingEncoder::new(pause_at);
    let writer = GenericDatumWriter::new(schema);
    let handle = thread::spawn(move || writer.write(&value, &mut encoder));

    paused.recv().expect("writer never reached the pause point");
    mutate();
    resume.send(()).expect("writer thread is gone");
    handle.join().expect("writer thread panicked")
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn test_array_grown_during_write_fails() {
    let schema = Schema::array(Schema::int());
    let array = GenericArray::new(&schema).unwrap();
    array.push(1);
    array.push(2);

    let other = array.clone();
    let err = write_with_interference(&schema, array.into(), PausePoint::ContainerStart, || {
        other.push(3)
    })
    .unwrap_err();

    match err {
        WriteError::ConcurrentModification {
            container,
            size,
            written,
            ..
        } => {
            assert_eq!(container, "array");
            assert_eq!(size, 2);
            assert_eq!(written, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_array_shrunk_mid_block_fails() {
    let schema = Schema::array(Schema::int());
    let array = GenericArray::new(&schema).unwrap();
    for i in 0..3 {
        array.push(i);
    }

    let other = array.clone();
    let err = write_with_interference(&schema, array.into(), PausePoint::Item(1), || {
        other.pop();
    })
    .unwrap_err();
    assert!(matches!(
        err,
        WriteError::ConcurrentModification { written: 2, .. }
    ));
}

#[test]
fn test_array_in_place_replacement_is_not_structural() {
    let schema = Schema::array(Schema::int());
    let array = GenericArray::new(&schema).unwrap();
    array.push(1);
    array.push(2);

    let other = array.clone();
    write_with_interference(&schema, array.into(), PausePoint::Item(1), || {
        other.set(1, 20);
    })
    .unwrap();
}

#[test]
fn test_array_mutated_after_write_completes_is_fine() {
    let schema = Schema::array(Schema::int());
    let array = GenericArray::new(&schema).unwrap();
    array.push(1);

    let mut encoder = EventEncoder::new();
    GenericDatumWriter::new(&schema)
        .write(&array.clone().into(), &mut encoder)
        .unwrap();
    array.push(2);
    array.clear();
    assert_eq!(encoder.events().len(), 5);
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn test_map_mutated_during_write_fails() {
    let schema = Schema::map(Schema::string());
    let map = GenericMap::new(&schema).unwrap();
    map.insert("a", "1");
    map.insert("b", "2");

    let other = map.clone();
    let err = write_with_interference(&schema, map.into(), PausePoint::ContainerStart, || {
        other.insert("c", "3");
    })
    .unwrap_err();
    assert!(matches!(
        err,
        WriteError::ConcurrentModification {
            container: "map",
            ..
        }
    ));
}

#[test]
fn test_map_overwrite_of_existing_key_is_not_structural() {
    let schema = Schema::map(Schema::string());
    let map = GenericMap::new(&schema).unwrap();
    map.insert("a", "1");

    let other = map.clone();
    write_with_interference(&schema, map.into(), PausePoint::ContainerStart, || {
        other.insert("a", "2");
    })
    .unwrap();
}

#[test]
fn test_map_mutated_before_write_succeeds() {
    let schema = Schema::map(Schema::string());
    let map = GenericMap::new(&schema).unwrap();
    map.insert("a", "1");
    map.clear();
    map.insert("b", "2");

    GenericDatumWriter::new(&schema)
        .write(&map.into(), &mut EventEncoder::new())
        .unwrap();
}
