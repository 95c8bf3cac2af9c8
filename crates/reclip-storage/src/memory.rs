//! In-memory object store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::{object_key, ObjectStore};

/// Process-local object store backed by a hash map.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        owner: &str,
        path: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<()> {
        let key = object_key(owner, path);
        debug!("Storing {} bytes at {}", data.len(), key);
        self.objects.write().await.insert(key, data);
        Ok(())
    }

    async fn download(&self, owner: &str, path: &str) -> StorageResult<Vec<u8>> {
        let key = object_key(owner, path);
        self.objects
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
