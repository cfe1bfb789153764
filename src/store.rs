//! Remote configuration store abstraction.
//!
//! [`ConfigStore`] is the seam between the resource lifecycle and the
//! directory server's configuration API. Documents crossing it are JSON
//! objects keyed by external (kebab-case) attribute names, and updates are
//! carried as an [`UpdateRequest`].
//!
//! [`MemoryStore`] keeps objects in memory and applies update requests with
//! the same semantics as the server. It backs the test harness.

use crate::error::ProviderError;
use crate::operations::{apply_operations, UpdateRequest};
use crate::schema::{ProviderSchema, ResourceSchema};
use crate::types::Record;
use crate::validation::{parse_remote, to_remote_document};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// The remote configuration store.
#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    /// Fetch an object. Fails with [`ProviderError::NotFound`] if it does not exist.
    async fn fetch(&self, resource_type: &str, id: &str) -> Result<Value, ProviderError>;

    /// Create an object and return it as stored.
    async fn create(
        &self,
        resource_type: &str,
        id: &str,
        document: Value,
    ) -> Result<Value, ProviderError>;

    /// Apply an update request and return the updated object.
    async fn apply_operations(
        &self,
        resource_type: &str,
        id: &str,
        request: UpdateRequest,
    ) -> Result<Value, ProviderError>;

    /// Delete an object. Fails with [`ProviderError::NotFound`] if it does not exist.
    async fn delete(&self, resource_type: &str, id: &str) -> Result<(), ProviderError>;
}

type ObjectKey = (String, String);

fn key(resource_type: &str, id: &str) -> ObjectKey {
    (resource_type.to_string(), id.to_string())
}

fn describe(resource_type: &str, id: &str) -> String {
    format!("{}/{}", resource_type, id)
}

/// An in-memory [`ConfigStore`].
#[derive(Debug)]
pub struct MemoryStore {
    schemas: HashMap<String, ResourceSchema>,
    objects: RwLock<HashMap<ObjectKey, Record>>,
    conflicts: RwLock<HashSet<ObjectKey>>,
    update_calls: AtomicUsize,
}

impl MemoryStore {
    /// Create a store that understands every resource and data source in `schema`.
    pub fn new(schema: &ProviderSchema) -> Self {
        let mut schemas = schema.data_sources.clone();
        schemas.extend(schema.resources.clone());
        Self {
            schemas,
            objects: RwLock::new(HashMap::new()),
            conflicts: RwLock::new(HashSet::new()),
            update_calls: AtomicUsize::new(0),
        }
    }

    fn schema(&self, resource_type: &str) -> Result<&ResourceSchema, ProviderError> {
        self.schemas
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    /// Seed an object, bypassing create semantics. Used for objects the
    /// server ships with.
    pub async fn insert(
        &self,
        resource_type: &str,
        id: &str,
        document: Value,
    ) -> Result<(), ProviderError> {
        let record = parse_remote(self.schema(resource_type)?, &document)?;
        self.objects.write().await.insert(key(resource_type, id), record);
        Ok(())
    }

    /// Make the next updates of an object fail with [`ProviderError::Conflict`].
    pub async fn set_conflict(&self, resource_type: &str, id: &str, conflicted: bool) {
        let mut conflicts = self.conflicts.write().await;
        if conflicted {
            conflicts.insert(key(resource_type, id));
        } else {
            conflicts.remove(&key(resource_type, id));
        }
    }

    /// Whether an object exists.
    pub async fn contains(&self, resource_type: &str, id: &str) -> bool {
        self.objects.read().await.contains_key(&key(resource_type, id))
    }

    /// Number of update requests received so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn fetch(&self, resource_type: &str, id: &str) -> Result<Value, ProviderError> {
        let schema = self.schema(resource_type)?;
        let objects = self.objects.read().await;
        let record = objects
            .get(&key(resource_type, id))
            .ok_or_else(|| ProviderError::NotFound(describe(resource_type, id)))?;
        Ok(to_remote_document(schema, record))
    }

    async fn create(
        &self,
        resource_type: &str,
        id: &str,
        document: Value,
    ) -> Result<Value, ProviderError> {
        let schema = self.schema(resource_type)?;
        let record = parse_remote(schema, &document)?;

        let mut objects = self.objects.write().await;
        let object_key = key(resource_type, id);
        if objects.contains_key(&object_key) {
            return Err(ProviderError::AlreadyExists(describe(resource_type, id)));
        }
        debug!(resource_type, id, "Creating object");
        let stored = to_remote_document(schema, &record);
        objects.insert(object_key, record);
        Ok(stored)
    }

    async fn apply_operations(
        &self,
        resource_type: &str,
        id: &str,
        request: UpdateRequest,
    ) -> Result<Value, ProviderError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let schema = self.schema(resource_type)?;
        let object_key = key(resource_type, id);

        if self.conflicts.read().await.contains(&object_key) {
            return Err(ProviderError::Conflict(describe(resource_type, id)));
        }

        let mut objects = self.objects.write().await;
        let current = objects
            .get(&object_key)
            .ok_or_else(|| ProviderError::NotFound(describe(resource_type, id)))?;
        let updated = apply_operations(schema, current, &request.operations)?;
        debug!(
            resource_type,
            id,
            operations = request.operations.len(),
            "Applied update request"
        );
        let stored = to_remote_document(schema, &updated);
        objects.insert(object_key, updated);
        Ok(stored)
    }

    async fn delete(&self, resource_type: &str, id: &str) -> Result<(), ProviderError> {
        self.schema(resource_type)?;
        self.objects
            .write()
            .await
            .remove(&key(resource_type, id))
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(describe(resource_type, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::UpdateOperation;
    use crate::schema::FieldDescriptor;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(
            &ProviderSchema::new().with_resource(
                "location",
                ResourceSchema::v0()
                    .with_field(FieldDescriptor::optional_string("description"))
                    .with_field(FieldDescriptor::optional_string_set("tags")),
            ),
        )
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let store = store();
        let created = store
            .create("location", "east", json!({"description": "East DC"}))
            .await
            .unwrap();
        assert_eq!(created, json!({"description": "East DC"}));

        let fetched = store.fetch("location", "east").await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let store = store();
        store.create("location", "east", json!({})).await.unwrap();
        let err = store.create("location", "east", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_apply_operations() {
        let store = store();
        store
            .insert("location", "east", json!({"tags": ["a", "b"]}))
            .await
            .unwrap();

        let request = UpdateRequest::new(vec![
            UpdateOperation::replace("description", vec!["East".into()]),
            UpdateOperation::add("tags", vec!["c".into()]),
            UpdateOperation::remove_members("tags", vec!["a".into()]),
        ]);
        let updated = store.apply_operations("location", "east", request).await.unwrap();

        assert_eq!(updated, json!({"description": "East", "tags": ["b", "c"]}));
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_apply_operations_conflict_and_missing() {
        let store = store();
        store.insert("location", "east", json!({})).await.unwrap();
        store.set_conflict("location", "east", true).await;

        let err = store
            .apply_operations("location", "east", UpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));

        let err = store
            .apply_operations("location", "west", UpdateRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store();
        store.insert("location", "east", json!({})).await.unwrap();
        store.delete("location", "east").await.unwrap();
        assert!(!store.contains("location", "east").await);

        let err = store.delete("location", "east").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let err = store().fetch("printer", "x").await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }
}
