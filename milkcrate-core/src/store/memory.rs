//! In-memory `ObjectStore` used by tests and local demos.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ObjectEntry, ObjectStore, StoreError};

struct StoredObject {
    data: Vec<u8>,
    last_modified: Option<DateTime<Utc>>,
}

/// BTreeMap-backed store double. Listing order is key order, which keeps
/// catalog compiles deterministic in tests.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object with an explicit timestamp (test setup).
    pub fn insert(&self, key: &str, data: Vec<u8>, last_modified: Option<DateTime<Utc>>) {
        self.objects
            .write()
            .expect("memory store lock poisoned")
            .insert(key.to_string(), StoredObject { data, last_modified });
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        let objects = self.objects.read().expect("memory store lock poisoned");
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| ObjectEntry {
                key: key.clone(),
                last_modified: obj.last_modified,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let objects = self.objects.read().expect("memory store lock poisoned");
        objects
            .get(key)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
        self.objects
            .write()
            .expect("memory store lock poisoned")
            .insert(
                key.to_string(),
                StoredObject {
                    data,
                    last_modified: Some(Utc::now()),
                },
            );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let objects = self.objects.read().expect("memory store lock poisoned");
        Ok(objects.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let store = MemoryStore::new();
        store.insert("a/b/1__t.mp3", vec![1], None);
        store.insert("c/d/1__t.mp3", vec![2], None);

        let all = store.list("").await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = store.list("a/").await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].key, "a/b/1__t.mp3");
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let store = MemoryStore::new();
        match store.get("nope").await {
            Err(StoreError::NotFound(key)) => assert_eq!(key, "nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn put_then_exists_and_get() {
        let store = MemoryStore::new();
        store.put("a/b/1__t.mp3", vec![42]).await.unwrap();
        assert!(store.exists("a/b/1__t.mp3").await.unwrap());
        assert_eq!(store.get("a/b/1__t.mp3").await.unwrap(), vec![42]);
    }
}
