//! Object store collaborator
//!
//! The engine does not know how objects are persisted; it only asks a store for
//! bytes by id. `MemoryObjectStore` is an arena keyed by content hash, used by
//! tests and by embedders that materialize a ledger in memory.

use super::object::{Object, ObjectId};
use crate::error::{PolicyError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Source of objects addressed by content id
pub trait ObjectStore: Send + Sync {
    /// Fetch an object by id
    fn get(&self, oid: &ObjectId) -> Result<Object>;

    /// Store an object, returning its id
    fn put(&self, object: Object) -> Result<ObjectId>;

    fn contains(&self, oid: &ObjectId) -> bool {
        self.get(oid).is_ok()
    }
}

/// In-memory arena of objects keyed by id
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, oid: &ObjectId) -> Result<Object> {
        let bytes = self
            .objects
            .read()
            .get(oid)
            .cloned()
            .ok_or_else(|| PolicyError::ObjectNotFound(oid.to_string()))?;
        let object = Object::from_bytes(bytes)?;
        if object.oid() != oid {
            return Err(PolicyError::InvalidObject(format!(
                "object {} does not match its content hash",
                oid
            )));
        }
        Ok(object)
    }

    fn put(&self, object: Object) -> Result<ObjectId> {
        let oid = object.oid().clone();
        self.objects
            .write()
            .entry(oid.clone())
            .or_insert_with(|| object.content().to_vec());
        Ok(oid)
    }

    fn contains(&self, oid: &ObjectId) -> bool {
        self.objects.read().contains_key(oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object::ObjectKind;

    #[test]
    fn test_put_get() {
        let store = MemoryObjectStore::new();
        let obj = Object::frame(ObjectKind::Blob, b"payload").unwrap();

        let oid = store.put(obj.clone()).unwrap();
        assert_eq!(&oid, obj.oid());
        assert!(store.contains(&oid));
        assert_eq!(store.get(&oid).unwrap(), obj);

        // Idempotent for identical content
        store.put(obj).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_object() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            store.get(&ObjectId::zero()),
            Err(PolicyError::ObjectNotFound(_))
        ));
    }
}
