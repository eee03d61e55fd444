//! Error types for schema parsing, generic data and datum writing

use std::fmt;
use std::io;
use thiserror::Error;

/// Errors that can occur while building or parsing schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema content is present but violates the schema grammar or its invariants
    #[error("Schema parse error: {0}")]
    Parse(String),
    /// The caller supplied a missing or unusable input
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A record's field list was assigned a second time
    #[error("Fields are already set for record '{0}'")]
    FieldsAlreadySet(String),
    /// A record's field list contains the same name twice
    #[error("Duplicate field '{field}' in record '{record}'")]
    DuplicateField { record: String, field: String },
    /// A logical type cannot annotate the given physical type
    #[error("Invalid logical type '{name}': {message}")]
    InvalidLogicalType { name: String, message: String },
    /// IO error while reading a schema source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SchemaError {
    /// Whether this error reports malformed or invalid schema content.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, SchemaError::Parse(_))
    }

    /// Whether this error reports API misuse rather than bad schema content.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SchemaError::Configuration(_)
                | SchemaError::FieldsAlreadySet(_)
                | SchemaError::DuplicateField { .. }
        )
    }
}

/// Misuse of a generic container
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatumError {
    #[error("Not a record schema: {0}")]
    NotARecord(String),
    #[error("Record schema '{0}' has no fields assigned yet")]
    FieldsNotSet(String),
    #[error("Not a valid schema field: {0}")]
    UnknownField(String),
    #[error("Field index {index} out of range for record '{record}'")]
    FieldIndexOutOfRange { record: String, index: usize },
    #[error("Not an array schema: {0}")]
    NotAnArray(String),
    #[error("Not a map schema: {0}")]
    NotAMap(String),
    #[error("Invalid default value: {0}")]
    InvalidDefault(String),
}

/// Errors raised by logical type conversions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    /// The conversion cannot be applied to this schema node at all
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
    /// The value does not have the representation the conversion expects
    #[error("Cannot convert {found} with logical type '{logical_type}'")]
    UnsupportedValue { logical_type: String, found: String },
    /// The value does not fit the physical encoding
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

/// Errors surfaced by an encoder implementation
#[derive(Debug, Error)]
pub enum EncodeError {
    /// IO error on the underlying sink
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The call sequence is not valid for this encoder
    #[error("Invalid encoder state: {0}")]
    InvalidState(String),
}

/// Errors that can occur during decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Schema cannot drive decoding
    #[error("Schema error: {0}")]
    Schema(String),
    /// Logical type conversion failed on read
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
    /// Generic container construction failed
    #[error("Datum error: {0}")]
    Datum(#[from] DatumError),
}

/// One step on the path from the root of a write to a nested position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathElement {
    /// Record field by name
    Field(String),
    /// Array element by position
    Index(usize),
    /// Map entry by key
    Key(String),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Field(name) => write!(f, ".{}", name),
            PathElement::Index(index) => write!(f, "[{}]", index),
            PathElement::Key(key) => write!(f, "{{{}}}", key),
        }
    }
}

/// A required value was absent, with the position where it was found missing.
///
/// Path elements are appended innermost first while the error travels up
/// the writer's call stack; [`NullValueError::path`] returns them root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullValueError {
    expected: String,
    root: Option<String>,
    path: Vec<PathElement>,
}

impl NullValueError {
    /// Create an error for a null found where `expected` was required.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            root: None,
            path: Vec::new(),
        }
    }

    /// Append the next enclosing path element.
    pub fn with_element(mut self, element: PathElement) -> Self {
        self.path.push(element);
        self
    }

    /// Label the root of the path (set once, at the top-level write).
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        if self.root.is_none() {
            self.root = Some(root.into());
        }
        self
    }

    /// The schema type that could not accept a null.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// The root label, if the error has reached the top-level write.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Path elements from the root down to the offending position.
    pub fn path(&self) -> impl Iterator<Item = &PathElement> {
        self.path.iter().rev()
    }

    /// Dotted/bracketed path, e.g. `r.items[2].name`.
    pub fn path_string(&self) -> String {
        let mut out = self.root.clone().unwrap_or_default();
        for element in self.path() {
            out.push_str(&element.to_string());
        }
        out
    }

    /// Human readable summary including the full path.
    pub fn summarize(&self) -> String {
        let path = self.path_string();
        if path.is_empty() {
            format!("null value for (non-nullable) {}", self.expected)
        } else {
            format!("null value for (non-nullable) {} at {}", self.expected, path)
        }
    }
}

impl fmt::Display for NullValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summarize())
    }
}

impl std::error::Error for NullValueError {}

/// Errors that abort a datum write
#[derive(Debug, Error)]
pub enum WriteError {
    /// Required value absent
    #[error("{0}")]
    NullValue(#[from] NullValueError),
    /// Value does not have the shape its schema requires
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    /// Enum symbol not declared by the schema
    #[error("Unknown symbol '{symbol}' for enum '{enum_name}'")]
    UnknownSymbol { enum_name: String, symbol: String },
    /// Fixed value has the wrong byte length
    #[error("Fixed '{name}' expects {expected} bytes, found {found}")]
    FixedSizeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// No union member accepts the value
    #[error("Not in union {options}: {found}")]
    UnresolvedUnion { options: String, found: String },
    /// Map key is not a string
    #[error("Map key must be a string, found {0}")]
    InvalidMapKey(String),
    /// Map key is null
    #[error("Map key cannot be null")]
    NullMapKey,
    /// A container was structurally modified while being written
    #[error("Concurrent modification of {container}: modification count changed from {expected} to {observed} ({written} of {size} elements written)")]
    ConcurrentModification {
        container: &'static str,
        expected: u64,
        observed: u64,
        size: usize,
        written: usize,
    },
    /// A conversion was used where it cannot apply
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
    /// A conversion failed on the value
    #[error("Conversion error: {0}")]
    Conversion(ConversionError),
    /// A generic container or field default could not be built
    #[error("Datum error: {0}")]
    Datum(#[from] DatumError),
    /// A recursive schema reference no longer points to a live schema
    #[error("Unresolved schema reference '{0}'")]
    UnresolvedReference(String),
    /// The encoder failed
    #[error("Encoder error: {0}")]
    Encode(#[from] EncodeError),
}

impl WriteError {
    /// Append a path element if this is a path-traced error.
    pub fn with_path_element(self, element: PathElement) -> Self {
        match self {
            WriteError::NullValue(err) => WriteError::NullValue(err.with_element(element)),
            other => other,
        }
    }

    /// Errors of the illegal-argument class.
    pub fn is_illegal_argument(&self) -> bool {
        matches!(
            self,
            WriteError::IllegalArgument(_) | WriteError::UnknownSymbol { .. }
        )
    }

    /// The path-traced null error, if that is what this is.
    pub fn as_null_value(&self) -> Option<&NullValueError> {
        match self {
            WriteError::NullValue(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConversionError> for WriteError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::IllegalArgument(message) => WriteError::IllegalArgument(message),
            other => WriteError::Conversion(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_path_is_rendered_root_first() {
        let err = NullValueError::new("long")
            .with_element(PathElement::Field("f1".into()))
            .with_element(PathElement::Index(3))
            .with_element(PathElement::Field("items".into()))
            .with_root("r");
        assert_eq!(err.path_string(), "r.items[3].f1");
        assert_eq!(
            err.to_string(),
            "null value for (non-nullable) long at r.items[3].f1"
        );
    }

    #[test]
    fn test_root_is_set_once() {
        let err = NullValueError::new("int")
            .with_element(PathElement::Key("k".into()))
            .with_root("map")
            .with_root("outer");
        assert_eq!(err.path_string(), "map{k}");
    }

    #[test]
    fn test_path_element_only_applies_to_null_errors() {
        let err = WriteError::NullMapKey.with_path_element(PathElement::Index(0));
        assert!(matches!(err, WriteError::NullMapKey));
    }

    #[test]
    fn test_schema_error_classes() {
        assert!(SchemaError::Parse("x".into()).is_parse_error());
        assert!(SchemaError::FieldsAlreadySet("r".into()).is_configuration_error());
        assert!(!SchemaError::Parse("x".into()).is_configuration_error());
    }
}
