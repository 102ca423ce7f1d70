//! Durable object storage behind the local cache tier.
//!
//! The [`ObjectStore`] trait is the narrow blob interface the cache manager
//! needs: `put`, `get`, and the two bucket calls used once at startup.
//! A missing object is a normal miss (`Ok(None)`), never an error.
//!
//! Implementations:
//! - [`S3ObjectStore`]: `aws-sdk-s3`, any S3-compatible endpoint
//! - [`MemoryObjectStore`]: process-local map, for development and tests

mod memory;
mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object store request failed: {0}")]
    Request(String),
    #[error("Failed to read object body: {0}")]
    Body(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Read the object at `key`. `Ok(None)` when it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn bucket_exists(&self, name: &str) -> Result<bool, StoreError>;

    async fn create_bucket(&self, name: &str) -> Result<(), StoreError>;
}

/// Create `bucket` unless it already exists.
pub async fn ensure_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<(), StoreError> {
    if store.bucket_exists(bucket).await? {
        return Ok(());
    }
    store.create_bucket(bucket).await?;
    info!(bucket, "created bucket");
    Ok(())
}
