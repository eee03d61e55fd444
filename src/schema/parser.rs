//! JSON schema parser for Avro schemas.
//!
//! Parses Avro schema JSON into [`Schema`] nodes. A [`SchemaParser`] keeps
//! the named types it has defined, so one instance can parse several
//! documents that refer to each other's types.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::schema::default::is_valid_default;
use crate::schema::types::{
    EnumSchema, Field, FieldOrder, FixedSchema, LogicalType, Name, RecordSchema, Schema,
    SchemaKind, SchemaType,
};

/// Keys with a fixed meaning on a schema object; anything else is a custom property.
const SCHEMA_RESERVED: &[&str] = &[
    "aliases", "doc", "fields", "items", "name", "namespace", "size", "symbols", "type", "values",
];

const FIELD_RESERVED: &[&str] = &["aliases", "default", "doc", "name", "order", "type"];

/// Parse an Avro schema from a JSON string with a fresh parser.
///
/// # Example
/// ```
/// use avro_generic::schema::parse_schema;
///
/// let schema = parse_schema(r#""string""#).unwrap();
/// assert_eq!(schema.to_json(), r#""string""#);
/// ```
pub fn parse_schema(json: &str) -> Result<Schema, SchemaError> {
    SchemaParser::new().parse_str(json)
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Check type, field and enum symbol names against the Avro naming rules (default: true).
    pub validate_names: bool,
    /// Check field defaults against the field's type (default: true).
    pub validate_defaults: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            validate_names: true,
            validate_defaults: true,
        }
    }
}

impl ParserConfig {
    /// Create a new ParserConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether names are validated.
    pub fn with_validate_names(mut self, validate: bool) -> Self {
        self.validate_names = validate;
        self
    }

    /// Set whether field defaults are validated.
    pub fn with_validate_defaults(mut self, validate: bool) -> Self {
        self.validate_defaults = validate;
        self
    }
}

/// Schema parser with named type resolution context.
///
/// Named types (records, enums, fixed) defined by one `parse_*` call stay
/// registered for later calls. A call that fails leaves the registry as it
/// was before the call.
#[derive(Debug, Default)]
pub struct SchemaParser {
    config: ParserConfig,
    /// Registry of named types by their fully qualified name
    named_types: HashMap<String, Schema>,
    /// Names defined by the call in progress, for rollback
    pending: Vec<String>,
}

impl SchemaParser {
    /// Create a new SchemaParser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with the given configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a schema from JSON text.
    pub fn parse_str(&mut self, json: &str) -> Result<Schema, SchemaError> {
        if json.trim().is_empty() {
            return Err(SchemaError::Parse("Empty schema document".to_string()));
        }
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SchemaError::Parse(format!("Invalid JSON: {}", e)))?;
        self.parse_value(&value)
    }

    /// Parse a schema from an already decoded JSON document.
    pub fn parse_value(&mut self, value: &Value) -> Result<Schema, SchemaError> {
        self.pending.clear();
        let result = self.parse(value, None);
        let defined = std::mem::take(&mut self.pending);
        if result.is_err() {
            for name in defined {
                self.named_types.remove(&name);
            }
        }
        result
    }

    /// Parse a schema from a readable source.
    ///
    /// A missing source is a configuration error, a failing read is an IO
    /// error, and content that is not UTF-8 JSON is a parse error.
    pub fn parse_reader<R: Read>(&mut self, source: Option<R>) -> Result<Schema, SchemaError> {
        let mut source = source.ok_or_else(|| {
            SchemaError::Configuration("No schema source provided".to_string())
        })?;
        let mut raw = Vec::new();
        source.read_to_end(&mut raw)?;
        let json = String::from_utf8(raw)
            .map_err(|e| SchemaError::Parse(format!("Schema source is not valid UTF-8: {}", e)))?;
        self.parse_str(&json)
    }

    /// Parse a schema from a file.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: Option<P>) -> Result<Schema, SchemaError> {
        let path = path.ok_or_else(|| {
            SchemaError::Configuration("No schema file provided".to_string())
        })?;
        let file = File::open(path.as_ref())?;
        self.parse_reader(Some(file))
    }

    /// Get a named type from the registry by full name.
    pub fn named_type(&self, full_name: &str) -> Option<&Schema> {
        self.named_types.get(full_name)
    }

    /// Get all registered named types.
    pub fn named_types(&self) -> &HashMap<String, Schema> {
        &self.named_types
    }

    fn parse(&mut self, value: &Value, namespace: Option<&str>) -> Result<Schema, SchemaError> {
        match value {
            Value::String(s) => self.parse_type_name(s, namespace),
            Value::Object(obj) => self.parse_object(obj, namespace),
            Value::Array(members) => {
                let members = members
                    .iter()
                    .map(|m| self.parse(m, namespace))
                    .collect::<Result<Vec<_>, _>>()?;
                Schema::union(members)
            }
            other => Err(SchemaError::Parse(format!(
                "Schema not yet supported: {}",
                other
            ))),
        }
    }

    /// A primitive type name or a reference to a defined named type.
    fn parse_type_name(&self, name: &str, namespace: Option<&str>) -> Result<Schema, SchemaError> {
        if let Some(ty) = SchemaType::primitive(name) {
            return Schema::primitive(ty);
        }
        self.lookup(name, namespace)
            .ok_or_else(|| SchemaError::Parse(format!("Undefined name: \"{}\"", name)))
    }

    fn lookup(&self, name: &str, namespace: Option<&str>) -> Option<Schema> {
        let found = match namespace {
            Some(ns) if !name.contains('.') => self
                .named_types
                .get(&format!("{}.{}", ns, name))
                .or_else(|| self.named_types.get(name)),
            _ => self.named_types.get(name),
        }?;
        // A record still being parsed is referenced weakly.
        if found.as_record().is_some() && found.fields().is_none() {
            Some(found.reference())
        } else {
            Some(found.clone())
        }
    }

    fn define(&mut self, schema: &Schema) -> Result<(), SchemaError> {
        let full_name = schema.full_name();
        if SchemaType::primitive(&full_name).is_some() || self.named_types.contains_key(&full_name)
        {
            return Err(SchemaError::Parse(format!("Can't redefine: {}", full_name)));
        }
        debug!(name = %full_name, kind = %schema.schema_type(), "Defined named type");
        self.named_types.insert(full_name.clone(), schema.clone());
        self.pending.push(full_name);
        Ok(())
    }

    fn parse_object(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> Result<Schema, SchemaError> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::Parse(format!("No type: {}", Value::Object(obj.clone()))))?;
        let type_name = match type_value {
            Value::String(s) => s.as_str(),
            // {"type": {...}} and {"type": [...]} wrap another schema
            Value::Object(_) | Value::Array(_) => return self.parse(type_value, namespace),
            other => return Err(SchemaError::Parse(format!("Invalid type: {}", other))),
        };

        match type_name {
            "record" | "error" => self.parse_record(obj, namespace, type_name == "error"),
            "enum" => self.parse_enum(obj, namespace),
            "fixed" => self.parse_fixed(obj, namespace),
            "array" => {
                let items = obj
                    .get("items")
                    .ok_or_else(|| SchemaError::Parse("Array has no items type".to_string()))?;
                let items = self.parse(items, namespace)?;
                self.finish(SchemaKind::Array(items), obj, SchemaType::Array, None, &[])
            }
            "map" => {
                let values = obj
                    .get("values")
                    .ok_or_else(|| SchemaError::Parse("Map has no values type".to_string()))?;
                let values = self.parse(values, namespace)?;
                self.finish(SchemaKind::Map(values), obj, SchemaType::Map, None, &[])
            }
            name => match SchemaType::primitive(name) {
                Some(ty) => {
                    let kind = primitive_kind(ty);
                    self.finish(kind, obj, ty, None, &[])
                }
                None => self.parse_type_name(name, namespace),
            },
        }
    }

    /// Build the node for a non-record schema and attach its logical type.
    fn finish(
        &self,
        kind: SchemaKind,
        obj: &Map<String, Value>,
        ty: SchemaType,
        fixed_size: Option<usize>,
        extra_reserved: &[&str],
    ) -> Result<Schema, SchemaError> {
        let logical = logical_type_of(obj, ty, fixed_size);
        let schema = Schema::with_props(kind, schema_props(obj, logical.as_ref(), extra_reserved));
        if let Some(logical) = logical {
            logical.add_to_schema(&schema)?;
        }
        Ok(schema)
    }

    fn parse_name(
        &self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> Result<Name, SchemaError> {
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::Parse(format!("No name in schema: {}", Value::Object(obj.clone()))))?;
        let namespace = match obj.get("namespace") {
            Some(Value::String(ns)) => Some(ns.as_str()),
            Some(Value::Null) | None => namespace,
            Some(other) => {
                return Err(SchemaError::Parse(format!("Invalid namespace: {}", other)))
            }
        };
        if self.config.validate_names {
            Name::new(name, namespace)
        } else {
            Ok(Name::unchecked(name, namespace))
        }
    }

    fn parse_record(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
        is_error: bool,
    ) -> Result<Schema, SchemaError> {
        let name = self.parse_name(obj, namespace)?;
        let fields_value = obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::Parse(format!("Record has no fields: {}", name)))?;

        let mut record = RecordSchema::new(name.clone())
            .with_aliases(aliases(obj))
            .with_error(is_error);
        if let Some(doc) = obj.get("doc").and_then(Value::as_str) {
            record = record.with_doc(doc);
        }

        let logical = logical_type_of(obj, SchemaType::Record, None);
        let schema = Schema::with_props(
            SchemaKind::Record(record),
            schema_props(obj, logical.as_ref(), &[]),
        );
        // Registered before its fields so they can refer back to it.
        self.define(&schema)?;

        let fields = fields_value
            .iter()
            .map(|f| self.parse_field(f, name.namespace()))
            .collect::<Result<Vec<_>, _>>()?;
        schema
            .set_fields(fields)
            .map_err(|e| SchemaError::Parse(e.to_string()))?;

        if let Some(logical) = logical {
            logical.add_to_schema(&schema)?;
        }
        Ok(schema)
    }

    fn parse_field(&mut self, value: &Value, namespace: Option<&str>) -> Result<Field, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError::Parse(format!("Not a field: {}", value)))?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::Parse(format!("No field name: {}", value)))?;
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::Parse(format!("No field type: {}", value)))?;

        let schema = self.parse(type_value, namespace)?;
        let mut field = if self.config.validate_names {
            Field::new(name, schema)?
        } else {
            Field::unchecked(name, schema)
        };

        if let Some(default) = obj.get("default") {
            if self.config.validate_defaults && !is_valid_default(field.schema(), default) {
                return Err(SchemaError::Parse(format!(
                    "Invalid default for field {}: {} not a {}",
                    name,
                    default,
                    field.schema()
                )));
            }
            field = field.with_default(default.clone());
        }
        if let Some(doc) = obj.get("doc").and_then(Value::as_str) {
            field = field.with_doc(doc);
        }
        if let Some(order) = obj.get("order") {
            field = field.with_order(parse_order(order)?);
        }
        field = field.with_aliases(aliases(obj));
        for (key, value) in obj {
            if !FIELD_RESERVED.contains(&key.as_str()) {
                field = field.with_prop(key.clone(), value.clone());
            }
        }
        Ok(field)
    }

    fn parse_enum(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> Result<Schema, SchemaError> {
        let name = self.parse_name(obj, namespace)?;
        let symbols = obj
            .get("symbols")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::Parse(format!("Enum has no symbols: {}", name)))?
            .iter()
            .map(|s| {
                s.as_str()
                    .map(String::from)
                    .ok_or_else(|| SchemaError::Parse(format!("Enum symbol is not a string: {}", s)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut schema = EnumSchema::new(name, symbols)?.with_aliases(aliases(obj));
        if let Some(doc) = obj.get("doc").and_then(Value::as_str) {
            schema = schema.with_doc(doc);
        }
        if let Some(default) = obj.get("default") {
            let default = default
                .as_str()
                .ok_or_else(|| SchemaError::Parse(format!("Enum default is not a string: {}", default)))?;
            schema = schema.with_default(default)?;
        }

        let schema = self.finish(SchemaKind::Enum(schema), obj, SchemaType::Enum, None, &["default"])?;
        self.define(&schema)?;
        Ok(schema)
    }

    fn parse_fixed(
        &mut self,
        obj: &Map<String, Value>,
        namespace: Option<&str>,
    ) -> Result<Schema, SchemaError> {
        let name = self.parse_name(obj, namespace)?;
        let size = obj
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|s| usize::try_from(s).ok())
            .ok_or_else(|| SchemaError::Parse(format!("Invalid or no size: {}", name)))?;

        let mut fixed = FixedSchema::new(name, size).with_aliases(aliases(obj));
        if let Some(doc) = obj.get("doc").and_then(Value::as_str) {
            fixed = fixed.with_doc(doc);
        }

        let schema = self.finish(SchemaKind::Fixed(fixed), obj, SchemaType::Fixed, Some(size), &[])?;
        self.define(&schema)?;
        Ok(schema)
    }
}

fn primitive_kind(ty: SchemaType) -> SchemaKind {
    match ty {
        SchemaType::Null => SchemaKind::Null,
        SchemaType::Boolean => SchemaKind::Boolean,
        SchemaType::Int => SchemaKind::Int,
        SchemaType::Long => SchemaKind::Long,
        SchemaType::Float => SchemaKind::Float,
        SchemaType::Double => SchemaKind::Double,
        SchemaType::Bytes => SchemaKind::Bytes,
        _ => SchemaKind::String,
    }
}

fn aliases(obj: &Map<String, Value>) -> Vec<String> {
    obj.get("aliases")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_order(value: &Value) -> Result<FieldOrder, SchemaError> {
    match value.as_str() {
        Some("ascending") => Ok(FieldOrder::Ascending),
        Some("descending") => Ok(FieldOrder::Descending),
        Some("ignore") => Ok(FieldOrder::Ignore),
        _ => Err(SchemaError::Parse(format!("Invalid field order: {}", value))),
    }
}

/// The logical type named by `obj`, if it is valid for the physical type.
///
/// An invalid annotation is ignored with a warning and stays on the schema
/// as a plain property.
fn logical_type_of(
    obj: &Map<String, Value>,
    ty: SchemaType,
    fixed_size: Option<usize>,
) -> Option<LogicalType> {
    let name = obj.get("logicalType")?.as_str()?;
    let logical = match name {
        "decimal" => {
            let precision = obj
                .get("precision")
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok());
            let scale = match obj.get("scale") {
                None => Some(0),
                Some(s) => s.as_u64().and_then(|s| u32::try_from(s).ok()),
            };
            match (precision, scale) {
                (Some(precision), Some(scale)) => LogicalType::Decimal { precision, scale },
                _ => {
                    warn!(logical_type = name, "Ignoring decimal without a valid precision and scale");
                    return None;
                }
            }
        }
        "uuid" => LogicalType::Uuid,
        "date" => LogicalType::Date,
        "time-millis" => LogicalType::TimeMillis,
        "time-micros" => LogicalType::TimeMicros,
        "timestamp-millis" => LogicalType::TimestampMillis,
        "timestamp-micros" => LogicalType::TimestampMicros,
        "local-timestamp-millis" => LogicalType::LocalTimestampMillis,
        "local-timestamp-micros" => LogicalType::LocalTimestampMicros,
        "duration" => LogicalType::Duration,
        other => LogicalType::custom(other),
    };
    match logical.check(ty, fixed_size) {
        Ok(()) => Some(logical),
        Err(e) => {
            warn!(logical_type = name, error = %e, "Ignoring invalid logical type");
            None
        }
    }
}

fn schema_props(
    obj: &Map<String, Value>,
    logical: Option<&LogicalType>,
    extra_reserved: &[&str],
) -> BTreeMap<String, Value> {
    let logical_keys: &[&str] = match logical {
        Some(LogicalType::Decimal { .. }) => &["logicalType", "precision", "scale"],
        Some(_) => &["logicalType"],
        None => &[],
    };
    obj.iter()
        .filter(|(key, _)| {
            let key = key.as_str();
            !SCHEMA_RESERVED.contains(&key)
                && !logical_keys.contains(&key)
                && !extra_reserved.contains(&key)
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_primitives() {
        for name in ["null", "boolean", "int", "long", "float", "double", "bytes", "string"] {
            let schema = parse_schema(&format!("\"{}\"", name)).unwrap();
            assert_eq!(schema.schema_type().name(), name);
        }
    }

    #[test]
    fn test_namespace_inheritance() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "Outer", "namespace": "com.example", "fields": [
                {"name": "inner", "type": {"type": "fixed", "name": "Hash", "size": 4}},
                {"name": "other", "type": "Hash"},
                {"name": "top", "type": {"type": "enum", "name": "E", "namespace": "", "symbols": ["A"]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(schema.full_name(), "com.example.Outer");
        assert_eq!(schema.field("inner").unwrap().schema().full_name(), "com.example.Hash");
        assert_eq!(schema.field("other").unwrap().schema().full_name(), "com.example.Hash");
        assert_eq!(schema.field("top").unwrap().schema().full_name(), "E");
    }

    #[test]
    fn test_recursive_record() {
        let schema = parse_schema(
            r#"{"type": "record", "name": "Node", "fields": [
                {"name": "value", "type": "int"},
                {"name": "next", "type": ["null", "Node"]}
            ]}"#,
        )
        .unwrap();
        let next = schema.field("next").unwrap().schema();
        let member = &next.members().unwrap()[1];
        assert!(matches!(member.kind(), SchemaKind::Reference(_)));
        assert!(member.resolve().unwrap().ptr_eq(&schema));
        assert_eq!(member.schema_type(), SchemaType::Record);
    }

    #[test]
    fn test_redefinition_rejected() {
        let mut parser = SchemaParser::new();
        parser
            .parse_str(r#"{"type": "fixed", "name": "F", "size": 1}"#)
            .unwrap();
        let err = parser
            .parse_str(r#"{"type": "fixed", "name": "F", "size": 2}"#)
            .unwrap_err();
        assert!(err.is_parse_error());
        let err = parser
            .parse_str(r#"{"type": "fixed", "name": "int", "size": 2}"#)
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_failed_parse_rolls_back_names() {
        let mut parser = SchemaParser::new();
        let err = parser
            .parse_str(
                r#"{"type": "record", "name": "R", "fields": [
                    {"name": "e", "type": {"type": "enum", "name": "E", "symbols": ["A"]}},
                    {"name": "bad", "type": "Missing"}
                ]}"#,
            )
            .unwrap_err();
        assert!(err.is_parse_error());
        assert!(parser.named_type("R").is_none());
        assert!(parser.named_type("E").is_none());
        parser
            .parse_str(r#"{"type": "enum", "name": "E", "symbols": ["B"]}"#)
            .unwrap();
    }

    #[test]
    fn test_duplicate_field_is_parse_error() {
        let err = parse_schema(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "a", "type": "long"}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_invalid_logical_type_kept_as_property() {
        let schema = parse_schema(r#"{"type": "string", "logicalType": "date"}"#).unwrap();
        assert!(schema.logical_type().is_none());
        assert_eq!(schema.prop("logicalType"), Some(&json!("date")));

        let schema = parse_schema(
            r#"{"type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2}"#,
        )
        .unwrap();
        assert_eq!(
            schema.logical_type(),
            Some(&LogicalType::Decimal {
                precision: 9,
                scale: 2
            })
        );
        assert!(schema.props().is_empty());
    }

    #[test]
    fn test_default_validation_is_configurable() {
        let json = r#"{"type": "record", "name": "R", "fields": [
            {"name": "a", "type": "int", "default": "nope"}
        ]}"#;
        assert!(parse_schema(json).unwrap_err().is_parse_error());
        let lenient = ParserConfig::new().with_validate_defaults(false);
        assert!(SchemaParser::with_config(lenient).parse_str(json).is_ok());
    }

    #[test]
    fn test_name_validation_is_configurable() {
        let json = r#"{"type": "fixed", "name": "no-dash", "size": 1}"#;
        assert!(parse_schema(json).unwrap_err().is_parse_error());
        let lenient = ParserConfig::new().with_validate_names(false);
        assert!(SchemaParser::with_config(lenient).parse_str(json).is_ok());
    }
}
