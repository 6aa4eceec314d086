// ABOUTME: Load balancer networking trait.
// ABOUTME: Network endpoints, backend services and buckets, and the shared URL map.

use super::shared_types::ProviderOperation;
use crate::cloud::RouteTable;
use crate::types::{BucketName, ResourceLink, ServiceName};
use async_trait::async_trait;

/// Load balancer resources that expose services and sites.
#[async_trait]
pub trait NetworkOps: Send + Sync {
    /// Create a serverless network endpoint group pointing at service `name`.
    async fn create_endpoint(&self, name: &ServiceName) -> Result<ProviderOperation, ComputeError>;

    /// Create a backend service named `name` with `endpoint` as its only backend.
    async fn create_backend_service(
        &self,
        name: &ServiceName,
        endpoint: &ResourceLink,
    ) -> Result<ProviderOperation, ComputeError>;

    /// Create a backend bucket named `name` serving `bucket`.
    async fn create_backend_bucket(
        &self,
        name: &ServiceName,
        bucket: &BucketName,
    ) -> Result<ProviderOperation, ComputeError>;

    /// Read the URL map of `load_balancer`.
    async fn get_route_table(&self, load_balancer: &str) -> Result<RouteTable, ComputeError>;

    /// Replace the matchers and host rules of `load_balancer` with `table`.
    ///
    /// Fails with [`ComputeError::Conflict`] when `table.fingerprint` no longer
    /// matches the stored map.
    async fn patch_route_table(
        &self,
        load_balancer: &str,
        table: &RouteTable,
    ) -> Result<ProviderOperation, ComputeError>;
}

/// Errors from networking operations.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("resource changed concurrently: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("compute request failed: {0}")]
    Request(String),
}
