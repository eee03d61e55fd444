//! Schema-driven generic data serialization for Avro
//!
//! This library parses Avro JSON schemas into an in-memory type model,
//! represents values conforming to a schema without generated types, and
//! writes those values through a pluggable [`Encoder`] by walking the
//! schema and the value in lock step.
//!
//! # Example
//! ```
//! use avro_generic::{
//!     BinaryEncoder, GenericDatumReader, GenericDatumWriter, GenericRecord, GenericValue,
//! };
//!
//! let schema = avro_generic::parse_schema(
//!     r#"{"type": "record", "name": "User", "fields": [
//!         {"name": "name", "type": "string"},
//!         {"name": "age", "type": ["null", "int"]}
//!     ]}"#,
//! ).unwrap();
//!
//! let mut user = GenericRecord::new(&schema).unwrap();
//! user.put("name", "ada").unwrap();
//! user.put("age", 36).unwrap();
//!
//! let mut encoder = BinaryEncoder::new(Vec::new());
//! GenericDatumWriter::new(&schema).write(&user.clone().into(), &mut encoder).unwrap();
//! let bytes = encoder.into_inner().unwrap();
//!
//! let read = GenericDatumReader::new(&schema).read(&mut &bytes[..]).unwrap();
//! assert_eq!(read, GenericValue::from(user));
//! ```

pub mod conversion;
pub mod encoder;
pub mod error;
pub mod generic;
pub mod reader;
pub mod schema;
pub mod writer;

// Re-export main types
pub use conversion::{Conversion, ConversionRegistry};
pub use encoder::{BinaryEncoder, Encoder, EncoderEvent, EventEncoder};
pub use error::{
    ConversionError, DatumError, DecodeError, EncodeError, NullValueError, PathElement,
    SchemaError, WriteError,
};
pub use generic::{
    validate, CustomValue, Decimal, EnumSymbol, GenericArray, GenericFixed, GenericMap,
    GenericRecord, GenericValue, ValueKind,
};
pub use reader::GenericDatumReader;
pub use schema::{
    parse_schema, Field, FieldOrder, LogicalType, Name, ParserConfig, Schema, SchemaKind,
    SchemaParser, SchemaType,
};
pub use writer::{GenericDatumWriter, WriterConfig};
