use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::DatumError;
use crate::schema::{Schema, SchemaType};

use super::GenericValue;

/// An array value built against an array schema.
///
/// `GenericArray` is a handle: clones share the same elements, and every
/// mutator takes `&self`. Each structural change (push, pop, remove, clear)
/// bumps a modification counter that writers check to detect a concurrent
/// change while they iterate. Replacing an element in place with
/// [`GenericArray::set`] is not a structural change.
///
/// The counter is a fail-fast debugging aid, not a synchronization
/// primitive.
#[derive(Clone)]
pub struct GenericArray {
    inner: Arc<ArrayInner>,
}

struct ArrayInner {
    schema: Schema,
    items: RwLock<Vec<GenericValue>>,
    mod_count: AtomicU64,
}

impl GenericArray {
    /// Create an empty array. The schema must be an array schema.
    pub fn new(schema: &Schema) -> Result<Self, DatumError> {
        Self::with_capacity(0, schema)
    }

    /// Create an empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize, schema: &Schema) -> Result<Self, DatumError> {
        Self::from_values(schema, Vec::with_capacity(capacity))
    }

    /// Create an array holding `items`.
    pub fn from_values(schema: &Schema, items: Vec<GenericValue>) -> Result<Self, DatumError> {
        if schema.schema_type() != SchemaType::Array {
            return Err(DatumError::NotAnArray(schema.to_json()));
        }
        Ok(Self {
            inner: Arc::new(ArrayInner {
                schema: schema.clone(),
                items: RwLock::new(items),
                mod_count: AtomicU64::new(0),
            }),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// The element schema.
    pub fn element_schema(&self) -> Option<&Schema> {
        self.inner.schema.element_type()
    }

    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    /// Number of structural modifications so far.
    pub fn modification_count(&self) -> u64 {
        self.inner.mod_count.load(Ordering::Acquire)
    }

    fn modified(&self) {
        self.inner.mod_count.fetch_add(1, Ordering::AcqRel);
    }

    /// A copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<GenericValue> {
        self.inner.items.read().get(index).cloned()
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&self, index: usize, value: impl Into<GenericValue>) -> Option<GenericValue> {
        let mut items = self.inner.items.write();
        items
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value.into()))
    }

    /// Append an element.
    pub fn push(&self, value: impl Into<GenericValue>) {
        let mut items = self.inner.items.write();
        items.push(value.into());
        self.modified();
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<GenericValue> {
        let mut items = self.inner.items.write();
        let value = items.pop();
        if value.is_some() {
            self.modified();
        }
        value
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize) -> Option<GenericValue> {
        let mut items = self.inner.items.write();
        if index >= items.len() {
            return None;
        }
        let value = items.remove(index);
        self.modified();
        Some(value)
    }

    /// Remove every element.
    pub fn clear(&self) {
        let mut items = self.inner.items.write();
        items.clear();
        self.modified();
    }

    /// A snapshot of the elements.
    pub fn to_vec(&self) -> Vec<GenericValue> {
        self.inner.items.read().clone()
    }

    /// A new array with its own copy of the elements.
    pub fn detached(&self) -> Self {
        Self {
            inner: Arc::new(ArrayInner {
                schema: self.inner.schema.clone(),
                items: RwLock::new(self.to_vec()),
                mod_count: AtomicU64::new(0),
            }),
        }
    }

    /// Whether both handles share the same elements.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for GenericArray {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let ours = self.to_vec();
        let theirs = other.to_vec();
        ours == theirs
    }
}

impl fmt::Debug for GenericArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_array() -> GenericArray {
        GenericArray::new(&Schema::array(Schema::int())).unwrap()
    }

    #[test]
    fn test_structural_changes_bump_counter() {
        let array = int_array();
        assert_eq!(array.modification_count(), 0);
        array.push(1);
        array.push(2);
        assert_eq!(array.modification_count(), 2);
        assert_eq!(array.remove(0), Some(GenericValue::Int(1)));
        assert_eq!(array.modification_count(), 3);
        array.clear();
        assert_eq!(array.modification_count(), 4);
        assert_eq!(array.pop(), None);
        assert_eq!(array.modification_count(), 4);
    }

    #[test]
    fn test_replacement_is_not_structural() {
        let array = int_array();
        array.push(1);
        assert_eq!(array.set(0, 9), Some(GenericValue::Int(1)));
        assert_eq!(array.set(3, 9), None);
        assert_eq!(array.modification_count(), 1);
        assert_eq!(array.get(0), Some(GenericValue::Int(9)));
    }

    #[test]
    fn test_clones_share_storage() {
        let array = int_array();
        let handle = array.clone();
        handle.push(7);
        assert_eq!(array.len(), 1);
        let copy = array.detached();
        copy.push(8);
        assert_eq!(array.len(), 1);
        assert!(!copy.ptr_eq(&array));
    }

    #[test]
    fn test_non_array_schema_rejected() {
        let err = GenericArray::new(&Schema::map(Schema::int())).unwrap_err();
        assert!(matches!(err, DatumError::NotAnArray(_)));
    }
}
