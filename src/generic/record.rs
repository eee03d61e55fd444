use crate::error::DatumError;
use crate::schema::{Field, Schema};

use super::GenericValue;

/// A record value built against a record schema.
///
/// Fields start out unset. An unset field is distinct from a field set to
/// [`GenericValue::Null`]: the writer falls back to the field's default only
/// for unset fields.
#[derive(Debug, Clone)]
pub struct GenericRecord {
    schema: Schema,
    values: Vec<Option<GenericValue>>,
}

impl GenericRecord {
    /// Create an empty record. The schema must be a record with its fields assigned.
    pub fn new(schema: &Schema) -> Result<Self, DatumError> {
        let schema = schema
            .resolve()
            .ok_or_else(|| DatumError::NotARecord(schema.full_name()))?;
        if schema.as_record().is_none() {
            return Err(DatumError::NotARecord(schema.to_json()));
        }
        let len = schema
            .fields()
            .ok_or_else(|| DatumError::FieldsNotSet(schema.full_name()))?
            .len();
        Ok(Self {
            schema,
            values: vec![None; len],
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn fields(&self) -> &[Field] {
        self.schema.fields().unwrap_or_default()
    }

    fn position(&self, name: &str) -> Result<usize, DatumError> {
        self.schema
            .as_record()
            .and_then(|r| r.field_position(name))
            .ok_or_else(|| DatumError::UnknownField(name.to_string()))
    }

    /// Set a field by name, returning the previous value.
    pub fn put(
        &mut self,
        name: &str,
        value: impl Into<GenericValue>,
    ) -> Result<Option<GenericValue>, DatumError> {
        let index = self.position(name)?;
        Ok(self.values[index].replace(value.into()))
    }

    /// Set a field by position, returning the previous value.
    pub fn put_at(
        &mut self,
        index: usize,
        value: impl Into<GenericValue>,
    ) -> Result<Option<GenericValue>, DatumError> {
        let record = self.schema.full_name();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(DatumError::FieldIndexOutOfRange { record, index })?;
        Ok(slot.replace(value.into()))
    }

    /// Return a field to the unset state.
    pub fn unset(&mut self, name: &str) -> Result<Option<GenericValue>, DatumError> {
        let index = self.position(name)?;
        Ok(self.values[index].take())
    }

    /// A field's value; `None` if the field is unset or unknown.
    pub fn get(&self, name: &str) -> Option<&GenericValue> {
        let index = self.position(name).ok()?;
        self.get_at(index)
    }

    /// A field's value by position.
    pub fn get_at(&self, index: usize) -> Option<&GenericValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Whether the named field has been set.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of fields in the schema.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field names with their values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&GenericValue>)> {
        self.fields()
            .iter()
            .zip(self.values.iter())
            .map(|(field, value)| (field.name(), value.as_ref()))
    }
}

impl PartialEq for GenericRecord {
    fn eq(&self, other: &Self) -> bool {
        let null = GenericValue::Null;
        self.schema.full_name() == other.schema.full_name()
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.as_ref().unwrap_or(&null) == b.as_ref().unwrap_or(&null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_schema;

    fn schema() -> Schema {
        parse_schema(
            r#"{"type": "record", "name": "r", "fields": [
                {"name": "f1", "type": "long"},
                {"name": "f2", "type": "string"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_put_and_get_by_name() {
        let mut record = GenericRecord::new(&schema()).unwrap();
        assert!(!record.is_set("f1"));
        assert_eq!(record.put("f1", 100i64).unwrap(), None);
        assert_eq!(record.get("f1"), Some(&GenericValue::Long(100)));
        assert_eq!(record.get_at(0), Some(&GenericValue::Long(100)));
        assert_eq!(
            record.put("f1", 5i64).unwrap(),
            Some(GenericValue::Long(100))
        );
    }

    #[test]
    fn test_unknown_field_is_usage_error() {
        let mut record = GenericRecord::new(&schema()).unwrap();
        assert_eq!(
            record.put("nope", 1i32).unwrap_err(),
            DatumError::UnknownField("nope".to_string())
        );
        assert!(record.put_at(7, 1i32).is_err());
    }

    #[test]
    fn test_non_record_schema_rejected() {
        let err = GenericRecord::new(&Schema::int()).unwrap_err();
        assert!(matches!(err, DatumError::NotARecord(_)));
    }

    #[test]
    fn test_unset_equals_explicit_null() {
        let mut a = GenericRecord::new(&schema()).unwrap();
        let b = GenericRecord::new(&schema()).unwrap();
        a.put("f1", GenericValue::Null).unwrap();
        assert_eq!(a, b);
    }
}
