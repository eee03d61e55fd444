use crate::generic::GenericValue;
use crate::schema::{Schema, SchemaKind, SchemaType};

use super::GenericDatumWriter;

impl GenericDatumWriter {
    /// Index of the union member `value` is written as.
    ///
    /// Members are tried in declaration order, first for an exact match and
    /// then allowing numeric promotion (int to long, float to double). A
    /// logical representation matches a member whose logical type has a
    /// conversion registered for it.
    pub(super) fn resolve_union(&self, members: &[Schema], value: &GenericValue) -> Option<usize> {
        members
            .iter()
            .position(|member| self.matches_exactly(member, value))
            .or_else(|| {
                members
                    .iter()
                    .position(|member| matches_promoted(member, value))
            })
    }

    fn matches_exactly(&self, member: &Schema, value: &GenericValue) -> bool {
        let Some(member) = member.resolve() else {
            return false;
        };
        if member.logical_type().is_some()
            && self.registry.lookup(&member, value.kind()).is_some()
        {
            return true;
        }
        match (member.kind(), value) {
            (SchemaKind::Null, GenericValue::Null) => true,
            (SchemaKind::Boolean, GenericValue::Boolean(_)) => true,
            (SchemaKind::Int, GenericValue::Int(_)) => true,
            (SchemaKind::Long, GenericValue::Long(_)) => true,
            (SchemaKind::Float, GenericValue::Float(_)) => true,
            (SchemaKind::Double, GenericValue::Double(_)) => true,
            (SchemaKind::Bytes, GenericValue::Bytes(_)) => true,
            (SchemaKind::String, GenericValue::String(_)) => true,
            (SchemaKind::Array(_), GenericValue::Array(_)) => true,
            (SchemaKind::Map(_), GenericValue::Map(_)) => true,
            (SchemaKind::Fixed(_), GenericValue::Fixed(f)) => same_name(&member, f.schema()),
            (SchemaKind::Enum(_), GenericValue::Enum(e)) => same_name(&member, e.schema()),
            (SchemaKind::Record(_), GenericValue::Record(r)) => same_name(&member, r.schema()),
            _ => false,
        }
    }
}

fn matches_promoted(member: &Schema, value: &GenericValue) -> bool {
    matches!(
        (member.schema_type(), value),
        (SchemaType::Long, GenericValue::Int(_))
            | (SchemaType::Double, GenericValue::Float(_))
    )
}

fn same_name(member: &Schema, value_schema: &Schema) -> bool {
    member.ptr_eq(value_schema) || member.full_name() == value_schema.full_name()
}
