//! Avro schema types and parsing.
//!
//! This module defines the Avro schema type system (primitives, complex
//! types, logical types), JSON parsing with named type resolution, and
//! field default handling.

pub mod default;
mod parser;
mod types;

pub use default::{default_value, is_valid_default};
pub use parser::{parse_schema, ParserConfig, SchemaParser};
pub use types::*;
