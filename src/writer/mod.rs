//! Schema-driven writing of generic values.
//!
//! [`GenericDatumWriter`] walks a schema and a matching [`GenericValue`] in
//! lock step and drives an [`Encoder`] with one primitive call per schema
//! position, in schema order. Logical representations are mapped to their
//! physical form through the writer's [`ConversionRegistry`].

mod union;

use std::borrow::Cow;
use std::sync::Arc;

use tracing::trace;

use crate::conversion::{convert_to_physical, ConversionRegistry};
use crate::encoder::Encoder;
use crate::error::{NullValueError, PathElement, WriteError};
use crate::generic::{GenericArray, GenericMap, GenericRecord, GenericValue};
use crate::schema::{default_value, Field, Schema, SchemaKind};

/// Writer configuration
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Write a field's declared default when the record leaves it unset
    pub use_field_defaults: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            use_field_defaults: true,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_use_field_defaults(mut self, enabled: bool) -> Self {
        self.use_field_defaults = enabled;
        self
    }
}

/// Writes generic values that conform to a schema.
///
/// A writer holds no per-write state, so one instance can serve any number
/// of concurrent writes as long as each uses its own encoder.
///
/// # Example
/// ```
/// use avro_generic::encoder::BinaryEncoder;
/// use avro_generic::generic::GenericRecord;
/// use avro_generic::schema::parse_schema;
/// use avro_generic::writer::GenericDatumWriter;
///
/// let schema = parse_schema(
///     r#"{"type": "record", "name": "r", "fields": [{"name": "f1", "type": "long"}]}"#,
/// ).unwrap();
/// let mut record = GenericRecord::new(&schema).unwrap();
/// record.put("f1", 1i64).unwrap();
///
/// let writer = GenericDatumWriter::new(&schema);
/// let mut encoder = BinaryEncoder::new(Vec::new());
/// writer.write(&record.into(), &mut encoder).unwrap();
/// assert_eq!(encoder.into_inner().unwrap(), vec![0x02]);
/// ```
#[derive(Debug, Clone)]
pub struct GenericDatumWriter {
    schema: Schema,
    registry: Arc<ConversionRegistry>,
    config: WriterConfig,
}

impl GenericDatumWriter {
    /// Create a writer for `schema` with no conversions registered.
    pub fn new(schema: &Schema) -> Self {
        Self {
            schema: schema.clone(),
            registry: Arc::new(ConversionRegistry::new()),
            config: WriterConfig::default(),
        }
    }

    /// Use `registry` to map logical representations to physical values.
    pub fn with_registry(mut self, registry: Arc<ConversionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Replace the schema used by subsequent writes.
    pub fn set_schema(&mut self, schema: &Schema) {
        self.schema = schema.clone();
    }

    pub fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write `value` against the writer's schema.
    pub fn write<E: Encoder + ?Sized>(
        &self,
        value: &GenericValue,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        self.write_with_schema(&self.schema, value, encoder)
    }

    /// Write `value` against `schema`, which need not be the writer's own.
    ///
    /// Output already handed to the encoder before a failure is not
    /// retracted. A null-value error carries the path from `schema` down to
    /// the offending position.
    pub fn write_with_schema<E: Encoder + ?Sized>(
        &self,
        schema: &Schema,
        value: &GenericValue,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        trace!(schema = %schema.full_name(), "writing datum");
        self.write_datum(schema, value, encoder)
            .map_err(|err| match err {
                WriteError::NullValue(null) => {
                    WriteError::NullValue(null.with_root(schema.full_name()))
                }
                other => other,
            })
    }

    /// Apply any conversion matching the value's representation, then write
    /// the physical value.
    fn write_datum<E: Encoder + ?Sized>(
        &self,
        schema: &Schema,
        value: &GenericValue,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        let schema = resolve(schema)?;
        let logical = schema.logical_type();
        let conversion = logical
            .and_then(|_| self.registry.lookup(&schema, value.kind()))
            .map(|c| c.as_ref());
        let physical = convert_to_physical(&schema, logical, conversion, value)?;
        self.write_physical(&schema, &physical, encoder)
    }

    fn write_physical<E: Encoder + ?Sized>(
        &self,
        schema: &Schema,
        value: &GenericValue,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        if value.is_null() && !matches!(schema.kind(), SchemaKind::Null | SchemaKind::Union(_)) {
            return Err(NullValueError::new(schema.schema_type().name()).into());
        }

        match (schema.kind(), value) {
            (SchemaKind::Null, GenericValue::Null) => encoder.write_null()?,
            (SchemaKind::Boolean, GenericValue::Boolean(b)) => encoder.write_boolean(*b)?,
            (SchemaKind::Int, GenericValue::Int(i)) => encoder.write_int(*i)?,
            (SchemaKind::Long, GenericValue::Long(l)) => encoder.write_long(*l)?,
            (SchemaKind::Long, GenericValue::Int(i)) => encoder.write_long(i64::from(*i))?,
            (SchemaKind::Float, GenericValue::Float(f)) => encoder.write_float(*f)?,
            (SchemaKind::Double, GenericValue::Double(d)) => encoder.write_double(*d)?,
            (SchemaKind::Double, GenericValue::Float(f)) => encoder.write_double(f64::from(*f))?,
            (SchemaKind::Bytes, GenericValue::Bytes(b)) => encoder.write_bytes(b)?,
            (SchemaKind::String, GenericValue::String(s)) => encoder.write_string(s)?,
            (SchemaKind::Fixed(_), GenericValue::Fixed(f)) => {
                write_fixed(schema, f.bytes(), encoder)?
            }
            (SchemaKind::Fixed(_), GenericValue::Bytes(b)) => write_fixed(schema, b, encoder)?,
            (SchemaKind::Enum(_), GenericValue::Enum(e)) => {
                write_enum(schema, e.symbol(), encoder)?
            }
            (SchemaKind::Enum(_), GenericValue::String(s)) => write_enum(schema, s, encoder)?,
            (SchemaKind::Array(items), GenericValue::Array(array)) => {
                self.write_array(items, array, encoder)?
            }
            (SchemaKind::Map(values), GenericValue::Map(map)) => {
                self.write_map(values, map, encoder)?
            }
            (SchemaKind::Record(_), GenericValue::Record(record)) => {
                self.write_record(schema, record, encoder)?
            }
            (SchemaKind::Union(u), value) => {
                let index = self.resolve_union(u.members(), value).ok_or_else(|| {
                    WriteError::UnresolvedUnion {
                        options: schema.to_json(),
                        found: value.describe(),
                    }
                })?;
                encoder.write_index(index)?;
                self.write_datum(&u.members()[index], value, encoder)?
            }
            (_, value) => {
                return Err(WriteError::TypeMismatch {
                    expected: schema.full_name(),
                    found: value.describe(),
                })
            }
        }
        Ok(())
    }

    fn write_record<E: Encoder + ?Sized>(
        &self,
        schema: &Schema,
        record: &GenericRecord,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        let fields = schema.fields().ok_or_else(|| WriteError::TypeMismatch {
            expected: format!("record {} with fields", schema.full_name()),
            found: "record schema with no fields assigned".to_string(),
        })?;
        let same_layout = record.schema().ptr_eq(schema);

        for (index, field) in fields.iter().enumerate() {
            let value = if same_layout {
                record.get_at(index)
            } else {
                record.get(field.name())
            };
            self.write_field(field, value, encoder)
                .map_err(|err| err.with_path_element(PathElement::Field(field.name().to_string())))?;
        }
        Ok(())
    }

    fn write_field<E: Encoder + ?Sized>(
        &self,
        field: &Field,
        value: Option<&GenericValue>,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        let value: Cow<'_, GenericValue> = match (value, field.default()) {
            (Some(value), _) => Cow::Borrowed(value),
            (None, Some(default)) if self.config.use_field_defaults => {
                Cow::Owned(default_value(field.schema(), default)?)
            }
            (None, _) => Cow::Owned(GenericValue::Null),
        };
        self.write_datum(field.schema(), &value, encoder)
    }

    /// Write an array as one block.
    ///
    /// The size and modification count are sampled before the start marker
    /// and compared again after the end marker. A structural change made in
    /// between, including one made while the encoder is handling the start
    /// marker, fails the write once the block is closed.
    fn write_array<E: Encoder + ?Sized>(
        &self,
        items: &Schema,
        array: &GenericArray,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        let size = array.len();
        let expected = array.modification_count();

        encoder.write_array_start()?;
        if size > 0 {
            encoder.write_block_count(size as u64)?;
        }
        let mut written = 0;
        for index in 0..size {
            let Some(element) = array.get(index) else {
                break;
            };
            encoder.start_item()?;
            self.write_datum(items, &element, encoder)
                .map_err(|err| err.with_path_element(PathElement::Index(index)))?;
            written += 1;
        }
        encoder.write_array_end()?;

        check_unmodified("array", expected, array.modification_count(), size, written, array.len())
    }

    /// Write a map as one block, with the same modification check as arrays.
    fn write_map<E: Encoder + ?Sized>(
        &self,
        values: &Schema,
        map: &GenericMap,
        encoder: &mut E,
    ) -> Result<(), WriteError> {
        let size = map.len();
        let expected = map.modification_count();

        encoder.write_map_start()?;
        if size > 0 {
            encoder.write_block_count(size as u64)?;
        }
        let mut written = 0;
        for index in 0..size {
            let Some((key, value)) = map.entry_at(index) else {
                break;
            };
            encoder.start_item()?;
            let key = match key {
                GenericValue::String(key) => key,
                GenericValue::Null => return Err(WriteError::NullMapKey),
                other => return Err(WriteError::InvalidMapKey(other.describe())),
            };
            encoder.write_string(&key)?;
            self.write_datum(values, &value, encoder)
                .map_err(|err| err.with_path_element(PathElement::Key(key)))?;
            written += 1;
        }
        encoder.write_map_end()?;

        check_unmodified("map", expected, map.modification_count(), size, written, map.len())
    }
}

fn resolve(schema: &Schema) -> Result<Schema, WriteError> {
    schema
        .resolve()
        .ok_or_else(|| WriteError::UnresolvedReference(schema.full_name()))
}

fn write_fixed<E: Encoder + ?Sized>(
    schema: &Schema,
    bytes: &[u8],
    encoder: &mut E,
) -> Result<(), WriteError> {
    let expected = schema.fixed_size().unwrap_or_default();
    if bytes.len() != expected {
        return Err(WriteError::FixedSizeMismatch {
            name: schema.full_name(),
            expected,
            found: bytes.len(),
        });
    }
    encoder.write_fixed(bytes)?;
    Ok(())
}

fn write_enum<E: Encoder + ?Sized>(
    schema: &Schema,
    symbol: &str,
    encoder: &mut E,
) -> Result<(), WriteError> {
    let ordinal = schema
        .symbols()
        .and_then(|symbols| symbols.iter().position(|s| s == symbol))
        .ok_or_else(|| WriteError::UnknownSymbol {
            enum_name: schema.full_name(),
            symbol: symbol.to_string(),
        })?;
    encoder.write_enum(ordinal)?;
    Ok(())
}

fn check_unmodified(
    container: &'static str,
    expected: u64,
    observed: u64,
    size: usize,
    written: usize,
    current_len: usize,
) -> Result<(), WriteError> {
    if observed != expected || written != size || current_len != size {
        return Err(WriteError::ConcurrentModification {
            container,
            expected,
            observed,
            size,
            written,
        });
    }
    Ok(())
}
