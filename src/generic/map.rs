use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::DatumError;
use crate::schema::{Schema, SchemaType};

use super::GenericValue;

/// A map value built against a map schema.
///
/// Entries keep insertion order. Keys are generic values so that a map
/// holding a non-string or null key can be represented; the writer rejects
/// such keys when it reaches them. String keys are found through a hash
/// index, other keys by scanning.
///
/// Like [`GenericArray`](super::GenericArray), this is a shared handle with
/// a modification counter bumped on insertion of a new key, removal and
/// clear. Overwriting the value of an existing key is not structural.
#[derive(Clone)]
pub struct GenericMap {
    inner: Arc<MapInner>,
}

type Entries = Vec<(GenericValue, GenericValue)>;

struct MapInner {
    schema: Schema,
    entries: RwLock<IndexedEntries>,
    mod_count: AtomicU64,
}

/// Entries in insertion order plus the position of every string key.
#[derive(Default)]
struct IndexedEntries {
    entries: Entries,
    positions: HashMap<String, usize>,
}

impl IndexedEntries {
    fn position(&self, key: &GenericValue) -> Option<usize> {
        match key {
            GenericValue::String(s) => self.positions.get(s.as_str()).copied(),
            other => self.entries.iter().position(|(k, _)| k == other),
        }
    }

    fn get(&self, key: &GenericValue) -> Option<&GenericValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    fn remove(&mut self, index: usize) -> GenericValue {
        let (key, value) = self.entries.remove(index);
        if let GenericValue::String(s) = &key {
            self.positions.remove(s.as_str());
        }
        for position in self.positions.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        value
    }
}

impl GenericMap {
    /// Create an empty map. The schema must be a map schema.
    pub fn new(schema: &Schema) -> Result<Self, DatumError> {
        if schema.schema_type() != SchemaType::Map {
            return Err(DatumError::NotAMap(schema.to_json()));
        }
        Ok(Self {
            inner: Arc::new(MapInner {
                schema: schema.clone(),
                entries: RwLock::new(IndexedEntries::default()),
                mod_count: AtomicU64::new(0),
            }),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().entries.is_empty()
    }

    /// Number of structural modifications so far.
    pub fn modification_count(&self) -> u64 {
        self.inner.mod_count.load(Ordering::Acquire)
    }

    fn modified(&self) {
        self.inner.mod_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Insert or overwrite an entry, returning the previous value for the key.
    pub fn insert(
        &self,
        key: impl Into<GenericValue>,
        value: impl Into<GenericValue>,
    ) -> Option<GenericValue> {
        let key = key.into();
        let value = value.into();
        let mut indexed = self.inner.entries.write();
        if let Some(index) = indexed.position(&key) {
            return Some(std::mem::replace(&mut indexed.entries[index].1, value));
        }
        if let GenericValue::String(s) = &key {
            let next = indexed.entries.len();
            indexed.positions.insert(s.clone(), next);
        }
        indexed.entries.push((key, value));
        self.modified();
        None
    }

    /// A copy of the value stored under `key`.
    pub fn get(&self, key: &GenericValue) -> Option<GenericValue> {
        self.inner.entries.read().get(key).cloned()
    }

    /// A copy of the value stored under a string key.
    pub fn get_str(&self, key: &str) -> Option<GenericValue> {
        let indexed = self.inner.entries.read();
        indexed
            .positions
            .get(key)
            .map(|&i| indexed.entries[i].1.clone())
    }

    /// Remove an entry, returning its value.
    pub fn remove(&self, key: &GenericValue) -> Option<GenericValue> {
        let mut indexed = self.inner.entries.write();
        let index = indexed.position(key)?;
        let value = indexed.remove(index);
        self.modified();
        Some(value)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut indexed = self.inner.entries.write();
        indexed.entries.clear();
        indexed.positions.clear();
        self.modified();
    }

    /// A copy of the entry at insertion position `index`.
    pub fn entry_at(&self, index: usize) -> Option<(GenericValue, GenericValue)> {
        self.inner.entries.read().entries.get(index).cloned()
    }

    /// A snapshot of all entries in insertion order.
    pub fn entries(&self) -> Entries {
        self.inner.entries.read().entries.clone()
    }

    /// Whether both handles share the same entries.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for GenericMap {
    /// Maps are equal when they hold the same entries, in any order.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let ours = self.inner.entries.read();
        let theirs = other.inner.entries.read();
        ours.entries.len() == theirs.entries.len()
            && ours
                .entries
                .iter()
                .all(|(k, v)| theirs.get(k) == Some(v))
    }
}

impl fmt::Debug for GenericMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.entries.read().entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
