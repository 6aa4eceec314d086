// ABOUTME: Managed compute service trait.
// ABOUTME: Create or update a service from an image and grant public invocation.

use super::shared_types::{OperationHandle, ServiceSpec};
use crate::types::ServiceName;
use async_trait::async_trait;

/// Managed container service operations.
#[async_trait]
pub trait ServiceOps: Send + Sync {
    /// Create a new service. The returned operation completes once the first
    /// revision is serving.
    async fn create_service(&self, spec: &ServiceSpec) -> Result<OperationHandle, ServiceError>;

    /// Replace the running revision of an existing service.
    async fn update_service(&self, spec: &ServiceSpec) -> Result<OperationHandle, ServiceError>;

    /// Allow unauthenticated invocation of the service.
    async fn allow_public_access(&self, name: &ServiceName) -> Result<(), ServiceError>;
}

/// Errors from service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service not found: {0}")]
    NotFound(String),

    #[error("service already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("service request failed: {0}")]
    Request(String),
}
