//! Schema-driven decoding of the Avro binary format into generic values.
//!
//! The read side mirrors [`crate::writer`]: [`GenericDatumReader`] walks a
//! schema, decodes the physical value at each position, and maps it to its
//! logical representation with the default conversion registered for the
//! schema's logical type.

pub mod decode;
pub mod varint;

use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use crate::conversion::{convert_from_physical, ConversionRegistry};
use crate::error::DecodeError;
use crate::generic::{EnumSymbol, GenericArray, GenericFixed, GenericMap, GenericRecord, GenericValue};
use crate::schema::{Schema, SchemaKind};

use decode::{
    decode_block_count, decode_boolean, decode_bytes, decode_double, decode_fixed, decode_float,
    decode_index, decode_int, decode_long, decode_string,
};

/// Reads binary-encoded values written against a schema.
#[derive(Debug, Clone)]
pub struct GenericDatumReader {
    schema: Schema,
    registry: Arc<ConversionRegistry>,
}

impl GenericDatumReader {
    /// Create a reader for `schema` with no conversions registered.
    pub fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
            registry: Arc::new(ConversionRegistry::new()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<ConversionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Decode one value, advancing `data` past it.
    pub fn read(&self, data: &mut &[u8]) -> Result<GenericValue, DecodeError> {
        trace!(schema = %self.schema.full_name(), "reading datum");
        self.read_datum(&self.schema, data)
    }

    /// Decode consecutive values until `data` is exhausted.
    ///
    /// Fails with `DecodeError::InvalidData` if bytes remain but a value
    /// consumes none of them, as happens for a null schema.
    pub fn read_all(&self, data: Bytes) -> Result<Vec<GenericValue>, DecodeError> {
        let mut cursor = &data[..];
        let mut values = Vec::new();
        while !cursor.is_empty() {
            let remaining = cursor.len();
            values.push(self.read(&mut cursor)?);
            if cursor.len() == remaining {
                return Err(DecodeError::InvalidData(format!(
                    "{} trailing bytes not consumed by schema '{}'",
                    remaining,
                    self.schema.full_name()
                )));
            }
        }
        Ok(values)
    }

    fn read_datum(&self, schema: &Schema, data: &mut &[u8]) -> Result<GenericValue, DecodeError> {
        let schema = schema.resolve().ok_or_else(|| {
            DecodeError::Schema(format!("Unresolved schema reference '{}'", schema.full_name()))
        })?;
        let value = self.read_physical(&schema, data)?;
        let Some(logical) = schema.logical_type() else {
            return Ok(value);
        };
        let conversion = self.registry.lookup_for_read(&schema).map(|c| c.as_ref());
        Ok(convert_from_physical(&schema, Some(logical), conversion, value)?)
    }

    fn read_physical(&self, schema: &Schema, data: &mut &[u8]) -> Result<GenericValue, DecodeError> {
        let value = match schema.kind() {
            SchemaKind::Null => GenericValue::Null,
            SchemaKind::Boolean => GenericValue::Boolean(decode_boolean(data)?),
            SchemaKind::Int => GenericValue::Int(decode_int(data)?),
            SchemaKind::Long => GenericValue::Long(decode_long(data)?),
            SchemaKind::Float => GenericValue::Float(decode_float(data)?),
            SchemaKind::Double => GenericValue::Double(decode_double(data)?),
            SchemaKind::Bytes => GenericValue::Bytes(decode_bytes(data)?),
            SchemaKind::String => GenericValue::String(decode_string(data)?),
            SchemaKind::Fixed(fixed) => {
                GenericValue::Fixed(GenericFixed::new(schema, decode_fixed(data, fixed.size())?))
            }
            SchemaKind::Enum(e) => {
                let index = decode_index(data, e.symbols().len(), "Enum")?;
                GenericValue::Enum(EnumSymbol::new(schema, e.symbols()[index].clone()))
            }
            SchemaKind::Array(items) => {
                let array = GenericArray::new(schema)?;
                loop {
                    let count = decode_block_count(data)?;
                    if count == 0 {
                        break;
                    }
                    for _ in 0..count {
                        array.push(self.read_datum(items, data)?);
                    }
                }
                GenericValue::Array(array)
            }
            SchemaKind::Map(values) => {
                let map = GenericMap::new(schema)?;
                loop {
                    let count = decode_block_count(data)?;
                    if count == 0 {
                        break;
                    }
                    for _ in 0..count {
                        let key = decode_string(data)?;
                        map.insert(key, self.read_datum(values, data)?);
                    }
                }
                GenericValue::Map(map)
            }
            SchemaKind::Union(u) => {
                let index = decode_index(data, u.members().len(), "Union")?;
                self.read_datum(&u.members()[index], data)?
            }
            SchemaKind::Record(_) => {
                let fields = schema.fields().ok_or_else(|| {
                    DecodeError::Schema(format!(
                        "Record '{}' has no fields assigned",
                        schema.full_name()
                    ))
                })?;
                let mut record = GenericRecord::new(schema)?;
                for (index, field) in fields.iter().enumerate() {
                    record.put_at(index, self.read_datum(field.schema(), data)?)?;
                }
                GenericValue::Record(record)
            }
            SchemaKind::Reference(r) => {
                return Err(DecodeError::Schema(format!(
                    "Unresolved schema reference '{}'",
                    r.name().full_name()
                )))
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BinaryEncoder;
    use crate::schema::parse_schema;
    use crate::writer::GenericDatumWriter;

    fn write(schema: &Schema, value: &GenericValue) -> Vec<u8> {
        let mut encoder = BinaryEncoder::new(Vec::new());
        GenericDatumWriter::new(schema)
            .write(value, &mut encoder)
            .unwrap();
        encoder.into_inner().unwrap()
    }

    #[test]
    fn test_read_record() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "r", "fields": [
                {"name": "id", "type": "long"},
                {"name": "tags", "type": {"type": "map", "values": "int"}},
                {"name": "kind", "type": {"type": "enum", "name": "K", "symbols": ["A", "B"]}}
            ]}"#,
        )
        .unwrap();
        let tags = GenericMap::new(schema.field("tags").unwrap().schema()).unwrap();
        tags.insert("x", 1);
        let mut record = GenericRecord::new(&schema).unwrap();
        record.put("id", 42i64).unwrap();
        record.put("tags", tags).unwrap();
        record.put("kind", "B").unwrap();

        let bytes = write(&schema, &record.clone().into());
        let reader = GenericDatumReader::new(&schema);
        let mut cursor = &bytes[..];
        let read = reader.read(&mut cursor).unwrap();
        assert!(cursor.is_empty());

        let GenericValue::Record(read) = read else {
            panic!("expected a record");
        };
        assert_eq!(read.get("id"), Some(&GenericValue::Long(42)));
        assert_eq!(
            read.get("kind"),
            Some(&GenericValue::Enum(EnumSymbol::new(
                schema.field("kind").unwrap().schema(),
                "B"
            )))
        );
    }

    #[test]
    fn test_read_all() {
        let schema = Schema::int();
        let mut bytes = write(&schema, &1.into());
        bytes.extend(write(&schema, &(-2).into()));
        let values = GenericDatumReader::new(&schema)
            .read_all(Bytes::from(bytes))
            .unwrap();
        assert_eq!(values, vec![GenericValue::Int(1), GenericValue::Int(-2)]);
    }

    #[test]
    fn test_read_all_rejects_values_that_consume_nothing() {
        let err = GenericDatumReader::new(&Schema::null())
            .read_all(Bytes::from_static(&[0x00]))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidData(_)), "{:?}", err);

        let schema = parse_schema(
            r#"{"type": "record", "name": "Empty", "fields": [{"name": "n", "type": "null"}]}"#,
        )
        .unwrap();
        let err = GenericDatumReader::new(&schema)
            .read_all(Bytes::from_static(&[0x02, 0x04]))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidData(_)), "{:?}", err);
    }

    #[test]
    fn test_read_all_empty_input() {
        let values = GenericDatumReader::new(&Schema::null())
            .read_all(Bytes::new())
            .unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_read_large_map() {
        let schema = Schema::map(Schema::int());
        let map = GenericMap::new(&schema).unwrap();
        for i in 0..10_000 {
            map.insert(format!("k{}", i), i);
        }
        let value: GenericValue = map.into();
        let bytes = write(&schema, &value);
        let read = GenericDatumReader::new(&schema).read(&mut &bytes[..]).unwrap();
        assert_eq!(read, value);
        let GenericValue::Map(read) = read else {
            panic!("expected a map");
        };
        assert_eq!(read.len(), 10_000);
        assert_eq!(read.get_str("k9999"), Some(GenericValue::Int(9_999)));
    }

    #[test]
    fn test_read_truncated() {
        let schema = Schema::string();
        let data = [0x06, b'a'];
        let mut cursor = &data[..];
        assert!(matches!(
            GenericDatumReader::new(&schema).read(&mut cursor),
            Err(DecodeError::UnexpectedEof)
        ));
    }
}
