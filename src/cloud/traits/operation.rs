// ABOUTME: Long-running operation polling trait.
// ABOUTME: One status read per call; waiting policy lives in the deploy waiter.

use super::shared_types::{OperationHandle, OperationState};
use async_trait::async_trait;

/// Status reads for asynchronous provider operations.
#[async_trait]
pub trait OperationOps: Send + Sync {
    /// Read the current state of `handle` once.
    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationState, OperationError>;
}

/// Errors from reading an operation's status.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("operation not found: {0}")]
    NotFound(String),

    #[error("operation request failed: {0}")]
    Request(String),
}
