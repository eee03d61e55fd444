//! Field default values.
//!
//! Defaults are stored as JSON on the field and checked against the field's
//! schema when the parser is configured to validate them. The writer turns
//! them into generic values when a record field is left unset.

use serde_json::Value;

use crate::error::DatumError;
use crate::generic::{EnumSymbol, GenericArray, GenericFixed, GenericMap, GenericRecord, GenericValue};

use super::types::{Schema, SchemaKind};

/// Whether `json` is an acceptable default for `schema`.
///
/// A union default may match any member. A record whose fields are not yet
/// assigned accepts any object, since it cannot be checked.
pub fn is_valid_default(schema: &Schema, json: &Value) -> bool {
    let Some(schema) = schema.resolve() else {
        return matches!(json, Value::Object(_));
    };
    match (schema.kind(), json) {
        (SchemaKind::Null, Value::Null) => true,
        (SchemaKind::Boolean, Value::Bool(_)) => true,
        (SchemaKind::Int, Value::Number(n)) => n
            .as_i64()
            .is_some_and(|v| i32::try_from(v).is_ok()),
        (SchemaKind::Long, Value::Number(n)) => n.as_i64().is_some(),
        (SchemaKind::Float | SchemaKind::Double, Value::Number(_)) => true,
        (SchemaKind::Bytes | SchemaKind::String, Value::String(_)) => true,
        (SchemaKind::Fixed(f), Value::String(s)) => {
            latin1_bytes(s).is_some_and(|b| b.len() == f.size())
        }
        (SchemaKind::Enum(e), Value::String(s)) => e.symbol_index(s).is_some(),
        (SchemaKind::Array(items), Value::Array(values)) => {
            values.iter().all(|v| is_valid_default(items, v))
        }
        (SchemaKind::Map(values), Value::Object(entries)) => {
            entries.values().all(|v| is_valid_default(values, v))
        }
        (SchemaKind::Union(u), json) => u.members().iter().any(|m| is_valid_default(m, json)),
        (SchemaKind::Record(r), Value::Object(obj)) => match r.fields() {
            None => true,
            Some(fields) => fields.iter().all(|field| match obj.get(field.name()) {
                Some(v) => is_valid_default(field.schema(), v),
                None => field.default().is_some(),
            }),
        },
        _ => false,
    }
}

/// Materialize a JSON default as a generic value of `schema`.
pub fn default_value(schema: &Schema, json: &Value) -> Result<GenericValue, DatumError> {
    let invalid = || {
        DatumError::InvalidDefault(format!(
            "{} is not a valid default for {}",
            json,
            schema.to_json()
        ))
    };
    let resolved = schema
        .resolve()
        .ok_or_else(|| DatumError::InvalidDefault(format!("dangling reference {}", schema.full_name())))?;

    match (resolved.kind(), json) {
        (SchemaKind::Null, Value::Null) => Ok(GenericValue::Null),
        (SchemaKind::Boolean, Value::Bool(b)) => Ok(GenericValue::Boolean(*b)),
        (SchemaKind::Int, Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(GenericValue::Int)
            .ok_or_else(invalid),
        (SchemaKind::Long, Value::Number(n)) => {
            n.as_i64().map(GenericValue::Long).ok_or_else(invalid)
        }
        (SchemaKind::Float, Value::Number(n)) => n
            .as_f64()
            .map(|v| GenericValue::Float(v as f32))
            .ok_or_else(invalid),
        (SchemaKind::Double, Value::Number(n)) => {
            n.as_f64().map(GenericValue::Double).ok_or_else(invalid)
        }
        (SchemaKind::String, Value::String(s)) => Ok(GenericValue::String(s.clone())),
        (SchemaKind::Bytes, Value::String(s)) => {
            latin1_bytes(s).map(GenericValue::Bytes).ok_or_else(invalid)
        }
        (SchemaKind::Fixed(f), Value::String(s)) => {
            let bytes = latin1_bytes(s).ok_or_else(invalid)?;
            if bytes.len() != f.size() {
                return Err(invalid());
            }
            Ok(GenericValue::Fixed(GenericFixed::new(&resolved, bytes)))
        }
        (SchemaKind::Enum(e), Value::String(s)) => {
            e.symbol_index(s).ok_or_else(invalid)?;
            Ok(GenericValue::Enum(EnumSymbol::new(&resolved, s.clone())))
        }
        (SchemaKind::Array(items), Value::Array(values)) => {
            let values = values
                .iter()
                .map(|v| default_value(items, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GenericValue::Array(GenericArray::from_values(&resolved, values)?))
        }
        (SchemaKind::Map(values), Value::Object(entries)) => {
            let map = GenericMap::new(&resolved)?;
            for (key, value) in entries {
                map.insert(key.as_str(), default_value(values, value)?);
            }
            Ok(GenericValue::Map(map))
        }
        (SchemaKind::Union(u), json) => u
            .members()
            .iter()
            .find(|m| is_valid_default(m, json))
            .ok_or_else(invalid)
            .and_then(|m| default_value(m, json)),
        (SchemaKind::Record(r), Value::Object(obj)) => {
            let fields = r
                .fields()
                .ok_or_else(|| DatumError::FieldsNotSet(resolved.full_name()))?;
            let mut record = GenericRecord::new(&resolved)?;
            for (index, field) in fields.iter().enumerate() {
                let value = match (obj.get(field.name()), field.default()) {
                    (Some(v), _) | (None, Some(v)) => default_value(field.schema(), v)?,
                    (None, None) => {
                        return Err(DatumError::InvalidDefault(format!(
                            "missing required field '{}' in default for {}",
                            field.name(),
                            resolved.full_name()
                        )))
                    }
                };
                record.put_at(index, value)?;
            }
            Ok(GenericValue::Record(record))
        }
        _ => Err(invalid()),
    }
}

/// Bytes defaults are JSON strings whose code points are the byte values.
fn latin1_bytes(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}
