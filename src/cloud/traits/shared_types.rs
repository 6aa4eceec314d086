// ABOUTME: Shared types used across cloud trait definitions.
// ABOUTME: Operation handles and states, build and service specs, website configuration.

use crate::types::{
    BucketName, EnvVar, ImageRef, ObjectName, OperationId, ResourceLink, ServiceName,
};
use serde::Serialize;
use std::fmt;

/// Which provider API an operation belongs to; each is polled differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Project-wide compute operation (backend services, URL maps).
    Global,
    /// Compute operation scoped to the configured region (network endpoints).
    Regional,
    /// Image build.
    Build,
    /// Managed service rollout.
    Run,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Global => write!(f, "global"),
            OperationKind::Regional => write!(f, "regional"),
            OperationKind::Build => write!(f, "build"),
            OperationKind::Run => write!(f, "run"),
        }
    }
}

/// Reference to an asynchronous provider operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle {
    pub kind: OperationKind,
    pub id: OperationId,
}

impl OperationHandle {
    pub fn new(kind: OperationKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: OperationId::new(id),
        }
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation {}", self.kind, self.id)
    }
}

/// State of an operation as reported by a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Running,
    Done,
    Failed { message: String },
}

impl OperationState {
    /// Whether the operation has stopped changing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Done | OperationState::Failed { .. })
    }
}

/// An accepted insert: the operation to wait on and the resource it creates.
#[derive(Debug, Clone)]
pub struct ProviderOperation {
    pub handle: OperationHandle,
    pub target: ResourceLink,
}

/// Location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: BucketName,
    pub name: ObjectName,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.name)
    }
}

/// A build of an uploaded source archive into `image`.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source: ObjectRef,
    pub image: ImageRef,
}

/// Desired state of a managed service.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub name: ServiceName,
    pub image: ImageRef,
    pub env: Vec<EnvVar>,
}

/// Static website behaviour of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteConfig {
    pub main_page_suffix: String,
    pub not_found_page: String,
}

impl WebsiteConfig {
    /// Single-page application: every unknown path serves the index page.
    pub fn single_page(index: &str) -> Self {
        Self {
            main_page_suffix: index.to_string(),
            not_found_page: index.to_string(),
        }
    }
}
