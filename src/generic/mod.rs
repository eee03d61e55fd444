//! Generic values: data conforming to a schema without a compiled-in type.
//!
//! Containers carry the schema they were built against. Arrays and maps are
//! shared handles with interior mutability so that a writer can observe a
//! structural change made through another handle while it is iterating.

mod array;
mod decimal;
mod map;
mod record;
mod value;

pub use array::GenericArray;
pub use decimal::Decimal;
pub use map::GenericMap;
pub use record::GenericRecord;
pub use value::{CustomValue, EnumSymbol, GenericFixed, GenericValue, ValueKind};

use crate::schema::{Schema, SchemaKind};

/// Check whether `value` conforms to `schema`, without writing anything.
///
/// Logical representations (decimals, timestamps, custom values) are
/// accepted wherever the schema carries a logical type; whether a
/// conversion for them is registered is the writer's concern.
pub fn validate(schema: &Schema, value: &GenericValue) -> bool {
    let Some(schema) = schema.resolve() else {
        return false;
    };
    if schema.logical_type().is_some() && is_logical_representation(value) {
        return true;
    }
    match (schema.kind(), value) {
        (SchemaKind::Null, GenericValue::Null) => true,
        (SchemaKind::Boolean, GenericValue::Boolean(_)) => true,
        (SchemaKind::Int, GenericValue::Int(_)) => true,
        (SchemaKind::Long, GenericValue::Long(_) | GenericValue::Int(_)) => true,
        (SchemaKind::Float, GenericValue::Float(_)) => true,
        (SchemaKind::Double, GenericValue::Double(_) | GenericValue::Float(_)) => true,
        (SchemaKind::Bytes, GenericValue::Bytes(_)) => true,
        (SchemaKind::String, GenericValue::String(_)) => true,
        (SchemaKind::Fixed(f), GenericValue::Fixed(v)) => v.bytes().len() == f.size(),
        (SchemaKind::Fixed(f), GenericValue::Bytes(b)) => b.len() == f.size(),
        (SchemaKind::Enum(e), GenericValue::Enum(s)) => e.symbol_index(s.symbol()).is_some(),
        (SchemaKind::Enum(e), GenericValue::String(s)) => e.symbol_index(s).is_some(),
        (SchemaKind::Array(items), GenericValue::Array(a)) => {
            a.to_vec().iter().all(|v| validate(items, v))
        }
        (SchemaKind::Map(values), GenericValue::Map(m)) => m
            .entries()
            .iter()
            .all(|(k, v)| matches!(k, GenericValue::String(_)) && validate(values, v)),
        (SchemaKind::Union(u), value) => u.members().iter().any(|m| validate(m, value)),
        (SchemaKind::Record(r), GenericValue::Record(record)) => {
            let Some(fields) = r.fields() else {
                return false;
            };
            fields.iter().enumerate().all(|(i, field)| {
                match record.get_at(i) {
                    Some(v) => validate(field.schema(), v),
                    None => field.default().is_some() || field.schema().is_nullable(),
                }
            })
        }
        _ => false,
    }
}

fn is_logical_representation(value: &GenericValue) -> bool {
    matches!(
        value,
        GenericValue::Decimal(_)
            | GenericValue::Uuid(_)
            | GenericValue::Date(_)
            | GenericValue::Time(_)
            | GenericValue::Timestamp(_)
            | GenericValue::LocalTimestamp(_)
            | GenericValue::Custom(_)
    )
}
