//! Object store abstraction.
//!
//! The bucket is a black box with four operations: list, get, put, exists.
//! No path-layout knowledge lives here; key-schema semantics belong to
//! `keys`/`catalog`. Store failures propagate as-is to callers; retry and
//! backoff are a client-navigation concern, never a storage concern.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use s3::S3ObjectStore;

/// Errors from raw object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One listed object: its key and, when the backend reports it, the last
/// modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Raw object storage over a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List all objects under a prefix. An empty bucket lists to an empty
    /// vec, never an error.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError>;

    /// Read the full contents of a key.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write bytes to a key, creating or overwriting.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
}
