// ABOUTME: Remote image build trait.
// ABOUTME: Submits a build that turns an uploaded source archive into a container image.

use super::shared_types::{BuildRequest, OperationHandle};
use async_trait::async_trait;

/// Remote container image builds.
#[async_trait]
pub trait BuildOps: Send + Sync {
    /// Submit a build of `request.source` tagged as `request.image`.
    ///
    /// Returns as soon as the build is queued; the handle is polled through
    /// [`OperationOps`](super::OperationOps) until the build finishes.
    async fn submit_build(&self, request: &BuildRequest) -> Result<OperationHandle, BuildError>;
}

/// Errors from build submission.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build rejected: {0}")]
    Rejected(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("build request failed: {0}")]
    Request(String),
}
