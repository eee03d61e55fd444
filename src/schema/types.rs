//! Avro schema types and representations.
//!
//! A [`Schema`] is a cheap, shareable handle onto an immutable schema node.
//! The only mutation a node ever sees is the one-time assignment of a
//! record's field list and of its logical type annotation, both of which
//! are guarded by `OnceLock` so that concurrent readers never observe a
//! half-built node.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use serde_json::{json, Map, Value};

use crate::error::SchemaError;

/// The physical kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
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
    Union,
    Record,
}

impl SchemaType {
    /// The type name used in schema JSON.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Boolean => "boolean",
            SchemaType::Int => "int",
            SchemaType::Long => "long",
            SchemaType::Float => "float",
            SchemaType::Double => "double",
            SchemaType::Bytes => "bytes",
            SchemaType::String => "string",
            SchemaType::Fixed => "fixed",
            SchemaType::Enum => "enum",
            SchemaType::Array => "array",
            SchemaType::Map => "map",
            SchemaType::Union => "union",
            SchemaType::Record => "record",
        }
    }

    /// Look up a primitive type by its JSON name.
    pub fn primitive(name: &str) -> Option<Self> {
        match name {
            "null" => Some(SchemaType::Null),
            "boolean" => Some(SchemaType::Boolean),
            "int" => Some(SchemaType::Int),
            "long" => Some(SchemaType::Long),
            "float" => Some(SchemaType::Float),
            "double" => Some(SchemaType::Double),
            "bytes" => Some(SchemaType::Bytes),
            "string" => Some(SchemaType::String),
            _ => None,
        }
    }

    /// Check if this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            SchemaType::Null
                | SchemaType::Boolean
                | SchemaType::Int
                | SchemaType::Long
                | SchemaType::Float
                | SchemaType::Double
                | SchemaType::Bytes
                | SchemaType::String
        )
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validate that an identifier follows Avro naming rules.
///
/// Avro names must:
/// - Start with [A-Za-z_]
/// - Contain only [A-Za-z0-9_]
pub(crate) fn validate_identifier(name: &str, context: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => {
            return Err(SchemaError::Parse(format!(
                "{} name cannot be empty",
                context
            )))
        }
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(SchemaError::Parse(format!(
            "{} name '{}' must start with a letter or underscore",
            context, name
        )));
    }

    if let Some(ch) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(SchemaError::Parse(format!(
            "{} name '{}' contains invalid character '{}'",
            context, name, ch
        )));
    }

    Ok(())
}

/// A namespace-qualified name for records, enums and fixed types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    name: String,
    namespace: Option<String>,
}

impl Name {
    /// Create a validated name.
    ///
    /// An empty namespace is the same as no namespace. A dotted `name`
    /// carries its own namespace and overrides `namespace`.
    ///
    /// # Example
    /// ```
    /// use avro_generic::schema::Name;
    ///
    /// let name = Name::new("User", Some("com.example")).unwrap();
    /// assert_eq!(name.full_name(), "com.example.User");
    /// assert_eq!(Name::new("name", Some("")).unwrap().to_string(), "name");
    /// assert!(Name::new("1nome", None).is_err());
    /// ```
    pub fn new(name: &str, namespace: Option<&str>) -> Result<Self, SchemaError> {
        let parsed = Self::unchecked(name, namespace);
        validate_identifier(&parsed.name, "Type")?;
        if let Some(ns) = &parsed.namespace {
            for part in ns.split('.') {
                validate_identifier(part, "Namespace")?;
            }
        }
        Ok(parsed)
    }

    /// Split a possibly dotted name without validating it.
    pub(crate) fn unchecked(name: &str, namespace: Option<&str>) -> Self {
        match name.rsplit_once('.') {
            Some((ns, simple)) => Self {
                name: simple.to_string(),
                namespace: Some(ns.to_string()).filter(|ns| !ns.is_empty()),
            },
            None => Self {
                name: name.to_string(),
                namespace: namespace.filter(|ns| !ns.is_empty()).map(String::from),
            },
        }
    }

    /// The simple (unqualified) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The fully qualified name.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Name as it should be written inside `enclosing` namespace.
    fn qualified_in(&self, enclosing: Option<&str>) -> String {
        if self.namespace.as_deref() == enclosing {
            self.name.clone()
        } else {
            self.full_name()
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Field ordering for record comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    #[default]
    Ascending,
    Descending,
    Ignore,
}

impl FieldOrder {
    fn as_str(&self) -> &'static str {
        match self {
            FieldOrder::Ascending => "ascending",
            FieldOrder::Descending => "descending",
            FieldOrder::Ignore => "ignore",
        }
    }
}

/// A field within a record.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    schema: Schema,
    default: Option<Value>,
    doc: Option<String>,
    order: FieldOrder,
    aliases: Vec<String>,
    props: BTreeMap<String, Value>,
    position: Option<usize>,
}

impl Field {
    /// Create a field with a validated name.
    pub fn new(name: &str, schema: Schema) -> Result<Self, SchemaError> {
        validate_identifier(name, "Field")?;
        Ok(Self::unchecked(name, schema))
    }

    pub(crate) fn unchecked(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            default: None,
            doc: None,
            order: FieldOrder::Ascending,
            aliases: Vec::new(),
            props: BTreeMap::new(),
            position: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the sort order.
    pub fn with_order(mut self, order: FieldOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Attach a custom property.
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn order(&self) -> FieldOrder {
        self.order
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Position within the owning record, once the field list is assigned.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    fn to_json_value(&self, names: &mut HashSet<String>, enclosing: Option<&str>) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(&self.name));
        obj.insert(
            "type".to_string(),
            self.schema.json_with_names(names, enclosing),
        );

        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        if let Some(default) = &self.default {
            obj.insert("default".to_string(), default.clone());
        }

        if self.order != FieldOrder::Ascending {
            obj.insert("order".to_string(), json!(self.order.as_str()));
        }

        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }

        for (key, value) in &self.props {
            obj.insert(key.clone(), value.clone());
        }

        Value::Object(obj)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.schema == other.schema
            && self.default == other.default
            && self.order == other.order
            && self.props == other.props
    }
}

#[derive(Debug)]
struct RecordFields {
    fields: Vec<Field>,
    positions: HashMap<String, usize>,
}

/// Schema for a record type.
///
/// The field list starts out unset and can be assigned exactly once, which
/// is what lets a record refer to itself while it is being defined.
#[derive(Debug)]
pub struct RecordSchema {
    name: Name,
    doc: Option<String>,
    aliases: Vec<String>,
    is_error: bool,
    fields: OnceLock<RecordFields>,
}

impl RecordSchema {
    /// Create a record with no fields assigned yet.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            doc: None,
            aliases: Vec::new(),
            is_error: false,
            fields: OnceLock::new(),
        }
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Mark the record as an error type.
    pub fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// The field list, or `None` if it has not been assigned.
    pub fn fields(&self) -> Option<&[Field]> {
        self.fields.get().map(|f| f.fields.as_slice())
    }

    /// Position of a field by name.
    pub fn field_position(&self, name: &str) -> Option<usize> {
        self.fields.get()?.positions.get(name).copied()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        let fields = self.fields.get()?;
        fields.positions.get(name).map(|&i| &fields.fields[i])
    }

    /// Assign the field list. Fails if fields were already assigned or if
    /// two fields share a name.
    pub fn set_fields(&self, mut fields: Vec<Field>) -> Result<(), SchemaError> {
        let full_name = self.name.full_name();
        if self.fields.get().is_some() {
            return Err(SchemaError::FieldsAlreadySet(full_name));
        }

        let mut positions = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter_mut().enumerate() {
            if positions.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    record: full_name,
                    field: field.name.clone(),
                });
            }
            field.position = Some(i);
        }

        self.fields
            .set(RecordFields { fields, positions })
            .map_err(|_| SchemaError::FieldsAlreadySet(full_name))
    }
}

/// Schema for an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    name: Name,
    doc: Option<String>,
    aliases: Vec<String>,
    symbols: Vec<String>,
    default: Option<String>,
}

impl EnumSchema {
    /// Create an enum. Symbols must be valid, distinct identifiers.
    pub fn new(name: Name, symbols: Vec<String>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            validate_identifier(symbol, "Enum symbol")?;
            if !seen.insert(symbol.as_str()) {
                return Err(SchemaError::Parse(format!(
                    "Duplicate enum symbol '{}' in '{}'",
                    symbol, name
                )));
            }
        }
        Ok(Self {
            name,
            doc: None,
            aliases: Vec::new(),
            symbols,
            default: None,
        })
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the default symbol, which must be one of the symbols.
    pub fn with_default(mut self, default: impl Into<String>) -> Result<Self, SchemaError> {
        let default = default.into();
        if self.symbol_index(&default).is_none() {
            return Err(SchemaError::Parse(format!(
                "Enum default '{}' is not a symbol of '{}'",
                default, self.name
            )));
        }
        self.default = Some(default);
        Ok(self)
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn default_symbol(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Get the index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }
}

/// Schema for a fixed-size byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    name: Name,
    doc: Option<String>,
    aliases: Vec<String>,
    size: usize,
}

impl FixedSchema {
    /// Create a fixed type with the given size in bytes.
    pub fn new(name: Name, size: usize) -> Self {
        Self {
            name,
            doc: None,
            aliases: Vec::new(),
            size,
        }
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Schema for a union of member types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSchema {
    members: Vec<Schema>,
}

impl UnionSchema {
    /// Create a union, enforcing Avro union rules:
    /// - no nested unions
    /// - at most one member per unnamed type (so at most one `null`)
    /// - no two named members with the same full name
    pub fn new(members: Vec<Schema>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            if member.schema_type() == SchemaType::Union {
                return Err(SchemaError::Parse(format!(
                    "Union contains nested union at position {} (unions cannot be nested)",
                    i
                )));
            }
            let key = member.full_name();
            if !seen.insert(key.clone()) {
                return Err(SchemaError::Parse(format!(
                    "Union contains duplicate type '{}' at position {}",
                    key, i
                )));
            }
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Schema] {
        &self.members
    }

    /// Index of the member with the given full name (type name for unnamed members).
    pub fn index_of(&self, full_name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.full_name() == full_name)
    }
}

/// A weak reference to a record that was still being defined when it was
/// referenced (a recursive type).
#[derive(Debug, Clone)]
pub struct SchemaRef {
    name: Name,
    target: Weak<SchemaNode>,
}

impl SchemaRef {
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The referenced schema, if it is still alive.
    pub fn upgrade(&self) -> Option<Schema> {
        self.target.upgrade().map(Schema)
    }
}

/// The shape of a schema node.
#[derive(Debug)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Fixed(FixedSchema),
    Enum(EnumSchema),
    Array(Schema),
    Map(Schema),
    Union(UnionSchema),
    Record(RecordSchema),
    /// Recursive reference to an enclosing record.
    Reference(SchemaRef),
}

#[derive(Debug)]
pub struct SchemaNode {
    kind: SchemaKind,
    logical_type: OnceLock<LogicalType>,
    props: BTreeMap<String, Value>,
}

/// Represents an Avro schema.
///
/// Cloning a `Schema` is cheap and shares the underlying node, so one parsed
/// schema can back any number of values, writers and threads.
#[derive(Clone)]
pub struct Schema(Arc<SchemaNode>);

impl Schema {
    /// Wrap a schema kind in a new node.
    pub fn new(kind: SchemaKind) -> Self {
        Self::with_props(kind, BTreeMap::new())
    }

    /// Wrap a schema kind in a new node carrying custom properties.
    pub fn with_props(kind: SchemaKind, props: BTreeMap<String, Value>) -> Self {
        Schema(Arc::new(SchemaNode {
            kind,
            logical_type: OnceLock::new(),
            props,
        }))
    }

    /// Create a primitive schema.
    pub fn primitive(ty: SchemaType) -> Result<Self, SchemaError> {
        let kind = match ty {
            SchemaType::Null => SchemaKind::Null,
            SchemaType::Boolean => SchemaKind::Boolean,
            SchemaType::Int => SchemaKind::Int,
            SchemaType::Long => SchemaKind::Long,
            SchemaType::Float => SchemaKind::Float,
            SchemaType::Double => SchemaKind::Double,
            SchemaType::Bytes => SchemaKind::Bytes,
            SchemaType::String => SchemaKind::String,
            other => {
                return Err(SchemaError::Configuration(format!(
                    "Can't create a {} schema without its definition",
                    other
                )))
            }
        };
        Ok(Self::new(kind))
    }

    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn int() -> Self {
        Self::new(SchemaKind::Int)
    }

    pub fn long() -> Self {
        Self::new(SchemaKind::Long)
    }

    pub fn float() -> Self {
        Self::new(SchemaKind::Float)
    }

    pub fn double() -> Self {
        Self::new(SchemaKind::Double)
    }

    pub fn bytes() -> Self {
        Self::new(SchemaKind::Bytes)
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    /// Create an array schema.
    pub fn array(items: Schema) -> Self {
        Self::new(SchemaKind::Array(items))
    }

    /// Create a map schema (keys are always strings).
    pub fn map(values: Schema) -> Self {
        Self::new(SchemaKind::Map(values))
    }

    /// Create a union schema.
    pub fn union(members: Vec<Schema>) -> Result<Self, SchemaError> {
        Ok(Self::new(SchemaKind::Union(UnionSchema::new(members)?)))
    }

    /// Create a record schema whose fields are assigned later with [`Schema::set_fields`].
    pub fn record(name: Name) -> Self {
        Self::new(SchemaKind::Record(RecordSchema::new(name)))
    }

    /// Create a record schema and assign its fields.
    pub fn record_with_fields(name: Name, fields: Vec<Field>) -> Result<Self, SchemaError> {
        let schema = Self::record(name);
        schema.set_fields(fields)?;
        Ok(schema)
    }

    /// Create an enum schema.
    pub fn enumeration(name: Name, symbols: Vec<String>) -> Result<Self, SchemaError> {
        Ok(Self::new(SchemaKind::Enum(EnumSchema::new(name, symbols)?)))
    }

    /// Create a fixed schema.
    pub fn fixed(name: Name, size: usize) -> Self {
        Self::new(SchemaKind::Fixed(FixedSchema::new(name, size)))
    }

    /// A weak reference to this schema, used for recursive definitions.
    pub(crate) fn reference(&self) -> Self {
        let name = self
            .name()
            .cloned()
            .unwrap_or_else(|| Name::unchecked(self.schema_type().name(), None));
        Self::new(SchemaKind::Reference(SchemaRef {
            name,
            target: Arc::downgrade(&self.0),
        }))
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.0.kind
    }

    /// The physical type. A recursive reference reports the type of its target.
    pub fn schema_type(&self) -> SchemaType {
        match &self.0.kind {
            SchemaKind::Null => SchemaType::Null,
            SchemaKind::Boolean => SchemaType::Boolean,
            SchemaKind::Int => SchemaType::Int,
            SchemaKind::Long => SchemaType::Long,
            SchemaKind::Float => SchemaType::Float,
            SchemaKind::Double => SchemaType::Double,
            SchemaKind::Bytes => SchemaType::Bytes,
            SchemaKind::String => SchemaType::String,
            SchemaKind::Fixed(_) => SchemaType::Fixed,
            SchemaKind::Enum(_) => SchemaType::Enum,
            SchemaKind::Array(_) => SchemaType::Array,
            SchemaKind::Map(_) => SchemaType::Map,
            SchemaKind::Union(_) => SchemaType::Union,
            SchemaKind::Record(_) => SchemaType::Record,
            SchemaKind::Reference(r) => r
                .upgrade()
                .map(|s| s.schema_type())
                .unwrap_or(SchemaType::Record),
        }
    }

    /// Follow a recursive reference to its target. Non-reference schemas
    /// resolve to themselves; a dangling reference resolves to `None`.
    pub fn resolve(&self) -> Option<Schema> {
        match &self.0.kind {
            SchemaKind::Reference(r) => r.upgrade(),
            _ => Some(self.clone()),
        }
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The logical type annotation, if any.
    pub fn logical_type(&self) -> Option<&LogicalType> {
        self.0.logical_type.get()
    }

    /// Attach a logical type annotation once.
    pub(crate) fn set_logical_type(&self, logical: LogicalType) -> Result<(), SchemaError> {
        if let Some(existing) = self.0.logical_type.get() {
            if *existing == logical {
                return Ok(());
            }
            return Err(SchemaError::Configuration(format!(
                "Logical type '{}' is already set on {}",
                existing.name(),
                self.full_name()
            )));
        }
        self.0.logical_type.set(logical).map_err(|l| {
            SchemaError::Configuration(format!(
                "Logical type '{}' lost a race to annotate {}",
                l.name(),
                self.full_name()
            ))
        })
    }

    /// A custom property.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.0.props.get(key)
    }

    /// All custom properties.
    pub fn props(&self) -> &BTreeMap<String, Value> {
        &self.0.props
    }

    /// The name of a named type (record, enum, fixed, or a reference to one).
    pub fn name(&self) -> Option<&Name> {
        match &self.0.kind {
            SchemaKind::Record(r) => Some(&r.name),
            SchemaKind::Enum(e) => Some(&e.name),
            SchemaKind::Fixed(f) => Some(&f.name),
            SchemaKind::Reference(r) => Some(&r.name),
            _ => None,
        }
    }

    /// Full name for named types, the type name otherwise.
    pub fn full_name(&self) -> String {
        match self.name() {
            Some(name) => name.full_name(),
            None => self.schema_type().name().to_string(),
        }
    }

    /// Check if this schema is a named type (record, enum, or fixed).
    pub fn is_named(&self) -> bool {
        self.name().is_some()
    }

    /// Whether a null value is acceptable: `null` itself or a union containing it.
    pub fn is_nullable(&self) -> bool {
        match &self.0.kind {
            SchemaKind::Null => true,
            SchemaKind::Union(u) => u
                .members
                .iter()
                .any(|m| m.schema_type() == SchemaType::Null),
            _ => false,
        }
    }

    /// The record definition, if this is a record.
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match &self.0.kind {
            SchemaKind::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The record's fields, or `None` for non-records and unassigned records.
    pub fn fields(&self) -> Option<&[Field]> {
        self.as_record().and_then(|r| r.fields())
    }

    /// Look up a record field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.as_record().and_then(|r| r.field(name))
    }

    /// Assign a record's fields. Only allowed once.
    pub fn set_fields(&self, fields: Vec<Field>) -> Result<(), SchemaError> {
        match &self.0.kind {
            SchemaKind::Record(r) => r.set_fields(fields),
            _ => Err(SchemaError::Configuration(format!(
                "Not a record: {}",
                self.full_name()
            ))),
        }
    }

    /// Element type of an array.
    pub fn element_type(&self) -> Option<&Schema> {
        match &self.0.kind {
            SchemaKind::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Value type of a map.
    pub fn value_type(&self) -> Option<&Schema> {
        match &self.0.kind {
            SchemaKind::Map(values) => Some(values),
            _ => None,
        }
    }

    /// Members of a union.
    pub fn members(&self) -> Option<&[Schema]> {
        match &self.0.kind {
            SchemaKind::Union(u) => Some(u.members()),
            _ => None,
        }
    }

    /// Symbols of an enum.
    pub fn symbols(&self) -> Option<&[String]> {
        match &self.0.kind {
            SchemaKind::Enum(e) => Some(e.symbols()),
            _ => None,
        }
    }

    /// Size of a fixed type.
    pub fn fixed_size(&self) -> Option<usize> {
        match &self.0.kind {
            SchemaKind::Fixed(f) => Some(f.size()),
            _ => None,
        }
    }

    /// Serialize the schema to a JSON string.
    ///
    /// # Example
    /// ```
    /// use avro_generic::schema::Schema;
    ///
    /// assert_eq!(Schema::string().to_json(), r#""string""#);
    /// ```
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.to_json_value()).unwrap_or_else(|_| "null".to_string())
    }

    /// Serialize the schema to a JSON Value.
    ///
    /// Each named type is written out in full the first time it appears and
    /// by name afterwards, so the output parses back to an equivalent schema.
    pub fn to_json_value(&self) -> Value {
        let mut names = HashSet::new();
        self.json_with_names(&mut names, None)
    }

    fn json_with_names(&self, names: &mut HashSet<String>, enclosing: Option<&str>) -> Value {
        let node = &self.0;
        let mut obj = match &node.kind {
            SchemaKind::Null
            | SchemaKind::Boolean
            | SchemaKind::Int
            | SchemaKind::Long
            | SchemaKind::Float
            | SchemaKind::Double
            | SchemaKind::Bytes
            | SchemaKind::String => {
                let type_name = self.schema_type().name();
                if node.props.is_empty() && node.logical_type.get().is_none() {
                    return json!(type_name);
                }
                let mut m = Map::new();
                m.insert("type".to_string(), json!(type_name));
                m
            }
            SchemaKind::Reference(r) => return json!(r.name.qualified_in(enclosing)),
            SchemaKind::Record(_) | SchemaKind::Enum(_) | SchemaKind::Fixed(_) => {
                // is_named() holds for these three kinds
                let name = match self.name() {
                    Some(name) => name,
                    None => return Value::Null,
                };
                if !names.insert(name.full_name()) {
                    return json!(name.qualified_in(enclosing));
                }
                self.named_json(name, names, enclosing)
            }
            SchemaKind::Array(items) => {
                let mut m = Map::new();
                m.insert("type".to_string(), json!("array"));
                m.insert("items".to_string(), items.json_with_names(names, enclosing));
                m
            }
            SchemaKind::Map(values) => {
                let mut m = Map::new();
                m.insert("type".to_string(), json!("map"));
                m.insert("values".to_string(), values.json_with_names(names, enclosing));
                m
            }
            SchemaKind::Union(u) => {
                return Value::Array(
                    u.members
                        .iter()
                        .map(|m| m.json_with_names(names, enclosing))
                        .collect(),
                )
            }
        };

        if let Some(logical) = node.logical_type.get() {
            logical.write_json(&mut obj);
        }

        for (key, value) in &node.props {
            obj.insert(key.clone(), value.clone());
        }

        Value::Object(obj)
    }

    fn named_json(
        &self,
        name: &Name,
        names: &mut HashSet<String>,
        enclosing: Option<&str>,
    ) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!(self.schema_type().name()));
        obj.insert("name".to_string(), json!(name.name()));
        if name.namespace() != enclosing {
            obj.insert("namespace".to_string(), json!(name.namespace().unwrap_or("")));
        }

        let (doc, aliases) = match &self.0.kind {
            SchemaKind::Record(r) => (r.doc.as_ref(), &r.aliases),
            SchemaKind::Enum(e) => (e.doc.as_ref(), &e.aliases),
            SchemaKind::Fixed(f) => (f.doc.as_ref(), &f.aliases),
            _ => return obj,
        };
        if let Some(doc) = doc {
            obj.insert("doc".to_string(), json!(doc));
        }
        if !aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(aliases));
        }

        match &self.0.kind {
            SchemaKind::Record(r) => {
                let fields: Vec<Value> = r
                    .fields()
                    .unwrap_or_default()
                    .iter()
                    .map(|f| f.to_json_value(names, name.namespace()))
                    .collect();
                obj.insert("fields".to_string(), Value::Array(fields));
            }
            SchemaKind::Enum(e) => {
                obj.insert("symbols".to_string(), json!(&e.symbols));
                if let Some(default) = &e.default {
                    obj.insert("default".to_string(), json!(default));
                }
            }
            SchemaKind::Fixed(f) => {
                obj.insert("size".to_string(), json!(f.size));
            }
            _ => {}
        }

        obj
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        let kinds_equal = match (&self.0.kind, &other.0.kind) {
            (SchemaKind::Null, SchemaKind::Null)
            | (SchemaKind::Boolean, SchemaKind::Boolean)
            | (SchemaKind::Int, SchemaKind::Int)
            | (SchemaKind::Long, SchemaKind::Long)
            | (SchemaKind::Float, SchemaKind::Float)
            | (SchemaKind::Double, SchemaKind::Double)
            | (SchemaKind::Bytes, SchemaKind::Bytes)
            | (SchemaKind::String, SchemaKind::String) => true,
            (SchemaKind::Fixed(a), SchemaKind::Fixed(b)) => a.name == b.name && a.size == b.size,
            (SchemaKind::Enum(a), SchemaKind::Enum(b)) => {
                a.name == b.name && a.symbols == b.symbols
            }
            (SchemaKind::Array(a), SchemaKind::Array(b)) => a == b,
            (SchemaKind::Map(a), SchemaKind::Map(b)) => a == b,
            (SchemaKind::Union(a), SchemaKind::Union(b)) => a == b,
            (SchemaKind::Record(a), SchemaKind::Record(b)) => {
                a.name == b.name && a.fields() == b.fields()
            }
            // References compare by name, which keeps recursive schemas finite.
            (SchemaKind::Reference(a), SchemaKind::Reference(b)) => a.name == b.name,
            (SchemaKind::Reference(a), SchemaKind::Record(b))
            | (SchemaKind::Record(b), SchemaKind::Reference(a)) => a.name == b.name,
            _ => false,
        };
        kinds_equal
            && self.0.logical_type.get() == other.0.logical_type.get()
            && self.0.props == other.0.props
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            SchemaKind::Reference(r) => write!(f, "Reference({})", r.name),
            kind => {
                let mut dbg = f.debug_struct("Schema");
                dbg.field("kind", kind);
                if let Some(logical) = self.0.logical_type.get() {
                    dbg.field("logical_type", logical);
                }
                if !self.0.props.is_empty() {
                    dbg.field("props", &self.0.props);
                }
                dbg.finish()
            }
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// Logical type annotations.
///
/// A logical type never changes how a value is encoded; it tells the
/// conversion registry which in-memory representation to map to and from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Decimal with precision and scale, on bytes or fixed.
    Decimal { precision: u32, scale: u32 },
    /// UUID on string or fixed(16).
    Uuid,
    /// Days since the Unix epoch, on int.
    Date,
    /// Milliseconds after midnight, on int.
    TimeMillis,
    /// Microseconds after midnight, on long.
    TimeMicros,
    /// Milliseconds since the Unix epoch, on long.
    TimestampMillis,
    /// Microseconds since the Unix epoch, on long.
    TimestampMicros,
    /// Local timestamp in milliseconds (no timezone), on long.
    LocalTimestampMillis,
    /// Local timestamp in microseconds (no timezone), on long.
    LocalTimestampMicros,
    /// Months, days and milliseconds, on fixed(12).
    Duration,
    /// Any other name; valid on every physical type.
    Custom(String),
}

impl LogicalType {
    /// A user-defined logical type.
    pub fn custom(name: impl Into<String>) -> Self {
        LogicalType::Custom(name.into())
    }

    /// Get the string name of the logical type.
    pub fn name(&self) -> &str {
        match self {
            LogicalType::Decimal { .. } => "decimal",
            LogicalType::Uuid => "uuid",
            LogicalType::Date => "date",
            LogicalType::TimeMillis => "time-millis",
            LogicalType::TimeMicros => "time-micros",
            LogicalType::TimestampMillis => "timestamp-millis",
            LogicalType::TimestampMicros => "timestamp-micros",
            LogicalType::LocalTimestampMillis => "local-timestamp-millis",
            LogicalType::LocalTimestampMicros => "local-timestamp-micros",
            LogicalType::Duration => "duration",
            LogicalType::Custom(name) => name,
        }
    }

    /// Check that this logical type can annotate `schema`.
    pub fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        self.check(schema.schema_type(), schema.fixed_size())
    }

    /// Check against a physical type and fixed size before the schema node exists.
    pub(crate) fn check(&self, ty: SchemaType, fixed_size: Option<usize>) -> Result<(), SchemaError> {
        let fail = |message: String| SchemaError::InvalidLogicalType {
            name: self.name().to_string(),
            message,
        };
        let require = |allowed: &[SchemaType]| {
            if allowed.contains(&ty) {
                Ok(())
            } else {
                Err(fail(format!("can only be used with {:?}, not {}", allowed, ty)))
            }
        };

        match self {
            LogicalType::Decimal { precision, scale } => {
                require(&[SchemaType::Bytes, SchemaType::Fixed])?;
                if *precision == 0 {
                    return Err(fail("precision must be positive".to_string()));
                }
                if scale > precision {
                    return Err(fail(format!(
                        "scale {} cannot be greater than precision {}",
                        scale, precision
                    )));
                }
                if let Some(size) = fixed_size {
                    let max = max_decimal_precision(size);
                    if u64::from(*precision) > max {
                        return Err(fail(format!(
                            "fixed({}) cannot store {} digits (max {})",
                            size, precision, max
                        )));
                    }
                }
                Ok(())
            }
            LogicalType::Uuid => {
                require(&[SchemaType::String, SchemaType::Fixed])?;
                match fixed_size {
                    Some(size) if size != 16 => {
                        Err(fail(format!("fixed size must be 16, found {}", size)))
                    }
                    _ => Ok(()),
                }
            }
            LogicalType::Date | LogicalType::TimeMillis => require(&[SchemaType::Int]),
            LogicalType::TimeMicros
            | LogicalType::TimestampMillis
            | LogicalType::TimestampMicros
            | LogicalType::LocalTimestampMillis
            | LogicalType::LocalTimestampMicros => require(&[SchemaType::Long]),
            LogicalType::Duration => {
                require(&[SchemaType::Fixed])?;
                match fixed_size {
                    Some(12) => Ok(()),
                    size => Err(fail(format!("fixed size must be 12, found {:?}", size))),
                }
            }
            LogicalType::Custom(_) => Ok(()),
        }
    }

    /// Validate and attach this logical type to `schema`.
    pub fn add_to_schema(&self, schema: &Schema) -> Result<(), SchemaError> {
        self.validate(schema)?;
        schema.set_logical_type(self.clone())
    }

    fn write_json(&self, obj: &mut Map<String, Value>) {
        obj.insert("logicalType".to_string(), json!(self.name()));
        if let LogicalType::Decimal { precision, scale } = self {
            obj.insert("precision".to_string(), json!(precision));
            obj.insert("scale".to_string(), json!(scale));
        }
    }
}

/// Largest decimal precision a two's complement fixed of `size` bytes holds.
fn max_decimal_precision(size: usize) -> u64 {
    if size == 0 {
        return 0;
    }
    let bits = (8 * size - 1) as f64;
    (bits * 2f64.log10()).floor() as u64
}
