//! Logical type conversions.
//!
//! A [`Conversion`] maps between a logical type's in-memory representation
//! (a [`ValueKind`]) and the physical value its schema encodes. The
//! [`ConversionRegistry`] holds conversions keyed by (logical type name,
//! representation kind); the writer looks up the conversion matching the
//! value it is handed, and the reader uses the default conversion
//! registered for a logical type name.

mod standard;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::ConversionError;
use crate::generic::{GenericValue, ValueKind};
use crate::schema::{LogicalType, Schema, SchemaType};

pub use standard::{
    DateConversion, DecimalConversion, LocalTimestampConversion, TimeConversion,
    TimestampConversion, TimeUnit, UuidConversion,
};

/// A bidirectional mapping between a logical representation and a physical value.
pub trait Conversion: Send + Sync {
    /// The logical type this conversion handles, e.g. `"timestamp-millis"`.
    fn logical_type_name(&self) -> &str;

    /// The in-memory representation this conversion produces and accepts.
    fn value_kind(&self) -> ValueKind;

    /// Physical schema types the conversion can encode to.
    fn physical_types(&self) -> &[SchemaType];

    /// Map a logical value to the physical value for `schema`.
    fn to_physical(
        &self,
        value: &GenericValue,
        schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError>;

    /// Map a physical value decoded with `schema` to the logical representation.
    fn from_physical(
        &self,
        value: &GenericValue,
        schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError>;
}

/// Conversions keyed by logical type name and representation kind.
///
/// The registry is populated at setup and then shared read-only, typically
/// behind an `Arc`, by any number of writers and readers.
#[derive(Clone, Default)]
pub struct ConversionRegistry {
    by_kind: HashMap<(String, ValueKind), Arc<dyn Conversion>>,
    /// First conversion registered per logical name, used when reading.
    by_name: HashMap<String, Arc<dyn Conversion>>,
}

impl ConversionRegistry {
    /// An empty registry: every logical type passes through physically.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in conversions for the standard logical types.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(DateConversion);
        registry.register(TimeConversion::new(TimeUnit::Millis));
        registry.register(TimeConversion::new(TimeUnit::Micros));
        registry.register(TimestampConversion::new(TimeUnit::Millis));
        registry.register(TimestampConversion::new(TimeUnit::Micros));
        registry.register(LocalTimestampConversion::new(TimeUnit::Millis));
        registry.register(LocalTimestampConversion::new(TimeUnit::Micros));
        registry.register(UuidConversion);
        registry.register(DecimalConversion);
        registry
    }

    /// Register a conversion, replacing any previous one for the same
    /// (logical type, representation) pair.
    pub fn register<C: Conversion + 'static>(&mut self, conversion: C) {
        self.register_arc(Arc::new(conversion));
    }

    /// Register a shared conversion.
    pub fn register_arc(&mut self, conversion: Arc<dyn Conversion>) {
        let name = conversion.logical_type_name().to_string();
        let kind = conversion.value_kind();
        debug!(logical_type = %name, representation = %kind, "Registered conversion");
        self.by_name
            .entry(name.clone())
            .or_insert_with(|| Arc::clone(&conversion));
        self.by_kind.insert((name, kind), conversion);
    }

    /// The conversion registered for a logical type name and representation.
    pub fn conversion_for(&self, logical_type: &str, kind: ValueKind) -> Option<&Arc<dyn Conversion>> {
        self.by_kind.get(&(logical_type.to_string(), kind))
    }

    /// The default conversion for a logical type name.
    pub fn conversion_by_name(&self, logical_type: &str) -> Option<&Arc<dyn Conversion>> {
        self.by_name.get(logical_type)
    }

    /// The conversion to apply when writing a value of `kind` with `schema`.
    ///
    /// `None` means the value is written as-is: the schema carries no
    /// logical type, or nothing is registered for it.
    pub fn lookup(&self, schema: &Schema, kind: ValueKind) -> Option<&Arc<dyn Conversion>> {
        let logical = schema.logical_type()?;
        self.conversion_for(logical.name(), kind)
    }

    /// The conversion to apply to a value decoded with `schema`.
    pub fn lookup_for_read(&self, schema: &Schema) -> Option<&Arc<dyn Conversion>> {
        let logical = schema.logical_type()?;
        self.conversion_by_name(logical.name())
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .by_kind
            .keys()
            .map(|(name, kind)| format!("{}/{}", name, kind))
            .collect();
        keys.sort();
        f.debug_struct("ConversionRegistry")
            .field("conversions", &keys)
            .finish()
    }
}

fn check_applicable(
    schema: &Schema,
    logical: Option<&LogicalType>,
    conversion: &dyn Conversion,
) -> Result<LogicalType, ConversionError> {
    let logical = logical.ok_or_else(|| {
        ConversionError::IllegalArgument(format!(
            "conversion for '{}' applied to {} which has no logical type",
            conversion.logical_type_name(),
            schema.full_name()
        ))
    })?;
    if logical.name() != conversion.logical_type_name() {
        return Err(ConversionError::IllegalArgument(format!(
            "conversion for '{}' applied to logical type '{}'",
            conversion.logical_type_name(),
            logical.name()
        )));
    }
    let physical = schema.schema_type();
    if !conversion.physical_types().contains(&physical) {
        return Err(ConversionError::IllegalArgument(format!(
            "conversion for '{}' does not support physical type {}",
            conversion.logical_type_name(),
            physical
        )));
    }
    Ok(logical.clone())
}

/// Map a value to its physical form before it is written.
///
/// Without a conversion the value passes through unchanged. A conversion
/// that cannot apply to this schema node is an illegal argument; a value
/// in the wrong representation is an unsupported value.
pub fn convert_to_physical<'a>(
    schema: &Schema,
    logical: Option<&LogicalType>,
    conversion: Option<&dyn Conversion>,
    value: &'a GenericValue,
) -> Result<Cow<'a, GenericValue>, ConversionError> {
    let Some(conversion) = conversion else {
        return Ok(Cow::Borrowed(value));
    };
    let logical = check_applicable(schema, logical, conversion)?;
    if value.kind() != conversion.value_kind() {
        return Err(ConversionError::UnsupportedValue {
            logical_type: logical.name().to_string(),
            found: value.describe(),
        });
    }
    conversion
        .to_physical(value, schema, &logical)
        .map(Cow::Owned)
}

/// Map a decoded physical value to its logical representation.
pub fn convert_from_physical(
    schema: &Schema,
    logical: Option<&LogicalType>,
    conversion: Option<&dyn Conversion>,
    value: GenericValue,
) -> Result<GenericValue, ConversionError> {
    let Some(conversion) = conversion else {
        return Ok(value);
    };
    let logical = check_applicable(schema, logical, conversion)?;
    conversion.from_physical(&value, schema, &logical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_no_conversion_passes_through() {
        let schema = Schema::int();
        let value = GenericValue::Int(5);
        let out = convert_to_physical(&schema, None, None, &value).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_conversion_without_logical_type_is_illegal() {
        let schema = Schema::int();
        let value = GenericValue::Int(5);
        let err = convert_to_physical(&schema, None, Some(&DateConversion), &value).unwrap_err();
        assert!(matches!(err, ConversionError::IllegalArgument(_)));
    }

    #[test]
    fn test_lookup_by_representation() {
        let registry = ConversionRegistry::standard();
        let schema = Schema::int();
        LogicalType::Date.add_to_schema(&schema).unwrap();
        assert!(registry.lookup(&schema, ValueKind::Date).is_some());
        assert!(registry.lookup(&schema, ValueKind::Int).is_none());
        assert!(registry.lookup(&Schema::int(), ValueKind::Date).is_none());
        assert!(ConversionRegistry::new().lookup(&schema, ValueKind::Date).is_none());
    }

    #[test]
    fn test_date_round_trip() {
        let schema = Schema::int();
        LogicalType::Date.add_to_schema(&schema).unwrap();
        let date = NaiveDate::from_ymd_opt(1970, 1, 11).unwrap();
        let value = GenericValue::Date(date);
        let physical =
            convert_to_physical(&schema, schema.logical_type(), Some(&DateConversion), &value)
                .unwrap()
                .into_owned();
        assert_eq!(physical, GenericValue::Int(10));
        let back =
            convert_from_physical(&schema, schema.logical_type(), Some(&DateConversion), physical)
                .unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_first_registration_is_read_default() {
        let registry = ConversionRegistry::standard();
        let conversion = registry.conversion_by_name("timestamp-millis").unwrap();
        assert_eq!(conversion.value_kind(), ValueKind::Timestamp);
        assert_eq!(registry.len(), 9);
    }
}
