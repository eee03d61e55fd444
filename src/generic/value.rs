//! Dynamically typed values conforming to a schema.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{Decimal, GenericArray, GenericMap, GenericRecord};
use crate::schema::Schema;

/// Represents a generic Avro value.
///
/// The first group of variants are physical values the writer can hand
/// straight to an encoder. The second group are logical representations,
/// which only reach an encoder after a registered conversion maps them to
/// their physical form.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Fixed-size byte array
    Fixed(GenericFixed),
    /// Enum symbol
    Enum(EnumSymbol),
    /// Array of values
    Array(GenericArray),
    /// Map with string keys
    Map(GenericMap),
    /// Record with named fields
    Record(GenericRecord),

    // Logical type representations
    /// Decimal number
    Decimal(Decimal),
    /// UUID
    Uuid(Uuid),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Instant on the UTC timeline
    Timestamp(DateTime<Utc>),
    /// Date and time with no timezone
    LocalTimestamp(NaiveDateTime),
    /// Application-defined representation
    Custom(CustomValue),
}

/// The in-memory representation kind of a [`GenericValue`].
///
/// Conversions are registered per (logical type name, value kind) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Fixed,
    Enum,
    Array,
    Map,
    Record,
    Decimal,
    Uuid,
    Date,
    Time,
    Timestamp,
    LocalTimestamp,
    Custom(TypeId),
}

impl ValueKind {
    /// The kind of a custom representation type.
    pub fn custom<T: Any>() -> Self {
        ValueKind::Custom(TypeId::of::<T>())
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Bytes => "bytes",
            ValueKind::String => "string",
            ValueKind::Fixed => "fixed",
            ValueKind::Enum => "enum",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Record => "record",
            ValueKind::Decimal => "decimal",
            ValueKind::Uuid => "uuid",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::Timestamp => "timestamp",
            ValueKind::LocalTimestamp => "local-timestamp",
            ValueKind::Custom(_) => "custom",
        };
        f.write_str(name)
    }
}

impl GenericValue {
    /// The representation kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            GenericValue::Null => ValueKind::Null,
            GenericValue::Boolean(_) => ValueKind::Boolean,
            GenericValue::Int(_) => ValueKind::Int,
            GenericValue::Long(_) => ValueKind::Long,
            GenericValue::Float(_) => ValueKind::Float,
            GenericValue::Double(_) => ValueKind::Double,
            GenericValue::Bytes(_) => ValueKind::Bytes,
            GenericValue::String(_) => ValueKind::String,
            GenericValue::Fixed(_) => ValueKind::Fixed,
            GenericValue::Enum(_) => ValueKind::Enum,
            GenericValue::Array(_) => ValueKind::Array,
            GenericValue::Map(_) => ValueKind::Map,
            GenericValue::Record(_) => ValueKind::Record,
            GenericValue::Decimal(_) => ValueKind::Decimal,
            GenericValue::Uuid(_) => ValueKind::Uuid,
            GenericValue::Date(_) => ValueKind::Date,
            GenericValue::Time(_) => ValueKind::Time,
            GenericValue::Timestamp(_) => ValueKind::Timestamp,
            GenericValue::LocalTimestamp(_) => ValueKind::LocalTimestamp,
            GenericValue::Custom(c) => ValueKind::Custom(c.type_id),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GenericValue::Null)
    }

    /// The schema a container value was built against, if it carries one.
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            GenericValue::Fixed(f) => Some(f.schema()),
            GenericValue::Enum(e) => Some(e.schema()),
            GenericValue::Array(a) => Some(a.schema()),
            GenericValue::Map(m) => Some(m.schema()),
            GenericValue::Record(r) => Some(r.schema()),
            _ => None,
        }
    }

    /// Short description used in error messages, e.g. `string "abc"`.
    pub fn describe(&self) -> String {
        match self {
            GenericValue::Record(r) => format!("record {}", r.schema().full_name()),
            GenericValue::Enum(e) => format!("enum {} {}", e.schema().full_name(), e.symbol()),
            GenericValue::Fixed(f) => format!("fixed {}", f.schema().full_name()),
            GenericValue::Array(a) => format!("array of {} elements", a.len()),
            GenericValue::Map(m) => format!("map of {} entries", m.len()),
            GenericValue::Custom(c) => format!("custom {}", c.type_name()),
            other => format!("{} {}", other.kind(), other.to_json()),
        }
    }

    /// Convert the value to a serde_json::Value.
    ///
    /// Bytes and fixed values are rendered as base64 strings.
    pub fn to_json(&self) -> Value {
        use base64::Engine;

        match self {
            GenericValue::Null => Value::Null,
            GenericValue::Boolean(b) => Value::Bool(*b),
            GenericValue::Int(i) => Value::Number((*i).into()),
            GenericValue::Long(l) => Value::Number((*l).into()),
            GenericValue::Float(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            GenericValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            GenericValue::Bytes(b) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            GenericValue::String(s) => Value::String(s.clone()),
            GenericValue::Fixed(f) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(f.bytes()))
            }
            GenericValue::Enum(e) => Value::String(e.symbol().to_string()),
            GenericValue::Array(a) => Value::Array(a.to_vec().iter().map(|v| v.to_json()).collect()),
            GenericValue::Map(m) => {
                let mut map = Map::new();
                for (key, value) in m.entries() {
                    let key = match key {
                        GenericValue::String(s) => s,
                        other => other.to_json().to_string(),
                    };
                    map.insert(key, value.to_json());
                }
                Value::Object(map)
            }
            GenericValue::Record(r) => {
                let mut map = Map::new();
                for (name, value) in r.iter() {
                    map.insert(
                        name.to_string(),
                        value.map(|v| v.to_json()).unwrap_or(Value::Null),
                    );
                }
                Value::Object(map)
            }
            GenericValue::Decimal(d) => Value::String(d.to_string()),
            GenericValue::Uuid(u) => Value::String(u.to_string()),
            GenericValue::Date(d) => Value::String(d.to_string()),
            GenericValue::Time(t) => Value::String(t.to_string()),
            GenericValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
            GenericValue::LocalTimestamp(ts) => Value::String(ts.to_string()),
            GenericValue::Custom(c) => json!({ "custom": c.type_name() }),
        }
    }
}

/// A symbol of an enum schema.
#[derive(Debug, Clone)]
pub struct EnumSymbol {
    schema: Schema,
    symbol: String,
}

impl EnumSymbol {
    pub fn new(schema: &Schema, symbol: impl Into<String>) -> Self {
        Self {
            schema: schema.clone(),
            symbol: symbol.into(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl PartialEq for EnumSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol && self.schema.full_name() == other.schema.full_name()
    }
}

/// Bytes of a fixed schema.
#[derive(Debug, Clone)]
pub struct GenericFixed {
    schema: Schema,
    bytes: Vec<u8>,
}

impl GenericFixed {
    pub fn new(schema: &Schema, bytes: Vec<u8>) -> Self {
        Self {
            schema: schema.clone(),
            bytes,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl PartialEq for GenericFixed {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.schema.full_name() == other.schema.full_name()
    }
}

/// An application-defined value, for logical types with custom conversions.
#[derive(Clone)]
pub struct CustomValue {
    type_name: &'static str,
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomValue({})", self.type_name)
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl From<bool> for GenericValue {
    fn from(v: bool) -> Self {
        GenericValue::Boolean(v)
    }
}

impl From<i32> for GenericValue {
    fn from(v: i32) -> Self {
        GenericValue::Int(v)
    }
}

impl From<i64> for GenericValue {
    fn from(v: i64) -> Self {
        GenericValue::Long(v)
    }
}

impl From<f32> for GenericValue {
    fn from(v: f32) -> Self {
        GenericValue::Float(v)
    }
}

impl From<f64> for GenericValue {
    fn from(v: f64) -> Self {
        GenericValue::Double(v)
    }
}

impl From<Vec<u8>> for GenericValue {
    fn from(v: Vec<u8>) -> Self {
        GenericValue::Bytes(v)
    }
}

impl From<String> for GenericValue {
    fn from(v: String) -> Self {
        GenericValue::String(v)
    }
}

impl From<&str> for GenericValue {
    fn from(v: &str) -> Self {
        GenericValue::String(v.to_string())
    }
}

impl From<GenericRecord> for GenericValue {
    fn from(v: GenericRecord) -> Self {
        GenericValue::Record(v)
    }
}

impl From<GenericArray> for GenericValue {
    fn from(v: GenericArray) -> Self {
        GenericValue::Array(v)
    }
}

impl From<GenericMap> for GenericValue {
    fn from(v: GenericMap) -> Self {
        GenericValue::Map(v)
    }
}

impl From<EnumSymbol> for GenericValue {
    fn from(v: EnumSymbol) -> Self {
        GenericValue::Enum(v)
    }
}

impl From<GenericFixed> for GenericValue {
    fn from(v: GenericFixed) -> Self {
        GenericValue::Fixed(v)
    }
}

impl From<Decimal> for GenericValue {
    fn from(v: Decimal) -> Self {
        GenericValue::Decimal(v)
    }
}

impl From<Uuid> for GenericValue {
    fn from(v: Uuid) -> Self {
        GenericValue::Uuid(v)
    }
}

impl From<NaiveDate> for GenericValue {
    fn from(v: NaiveDate) -> Self {
        GenericValue::Date(v)
    }
}

impl From<NaiveTime> for GenericValue {
    fn from(v: NaiveTime) -> Self {
        GenericValue::Time(v)
    }
}

impl From<DateTime<Utc>> for GenericValue {
    fn from(v: DateTime<Utc>) -> Self {
        GenericValue::Timestamp(v)
    }
}

impl From<NaiveDateTime> for GenericValue {
    fn from(v: NaiveDateTime) -> Self {
        GenericValue::LocalTimestamp(v)
    }
}

impl From<CustomValue> for GenericValue {
    fn from(v: CustomValue) -> Self {
        GenericValue::Custom(v)
    }
}

impl<T: Into<GenericValue>> From<Option<T>> for GenericValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(GenericValue::Null)
    }
}
