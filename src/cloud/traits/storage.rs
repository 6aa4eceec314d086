// ABOUTME: Object storage operations trait.
// ABOUTME: Upload, delete and list objects; create buckets and configure static hosting.

use super::shared_types::WebsiteConfig;
use crate::types::BucketName;
use async_trait::async_trait;
use bytes::Bytes;

/// Blob store operations used for build artifacts and static sites.
#[async_trait]
pub trait StorageOps: Send + Sync {
    /// Store `body` as object `name`, replacing any existing object.
    async fn upload_object(
        &self,
        bucket: &BucketName,
        name: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Delete object `name`.
    async fn delete_object(&self, bucket: &BucketName, name: &str) -> Result<(), StorageError>;

    /// Names of every object in the bucket.
    async fn list_objects(&self, bucket: &BucketName) -> Result<Vec<String>, StorageError>;

    /// Create a new bucket in the configured project.
    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), StorageError>;

    /// Grant anonymous read access to every object in the bucket.
    async fn make_bucket_public(&self, bucket: &BucketName) -> Result<(), StorageError>;

    /// Set the index and not-found pages served for the bucket.
    async fn set_website(
        &self,
        bucket: &BucketName,
        website: &WebsiteConfig,
    ) -> Result<(), StorageError>;
}

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object or bucket not found: {0}")]
    NotFound(String),

    #[error("bucket already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("storage request failed: {0}")]
    Request(String),
}
