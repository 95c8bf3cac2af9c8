//! Binary object store for source media.
//!
//! This crate provides:
//! - The `ObjectStore` boundary used by the pipeline to fetch uploaded videos
//! - A Cloudflare R2 backend (S3 API)
//! - An in-memory backend for tests and local development

pub mod client;
pub mod error;
pub mod memory;

use async_trait::async_trait;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryObjectStore;

/// Object key for an owner-scoped path.
pub fn object_key(owner: &str, path: &str) -> String {
    format!("{}/{}", owner, path.trim_start_matches('/'))
}

/// Upload/download of arbitrarily large media by owner + path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `owner/path`.
    async fn upload(
        &self,
        owner: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Fetch the bytes stored under `owner/path`.
    async fn download(&self, owner: &str, path: &str) -> StorageResult<Vec<u8>>;

    /// Cheap reachability probe for readiness checks.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
