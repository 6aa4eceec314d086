// ABOUTME: OperationOps over the long-running operation endpoints of each API.
// ABOUTME: Decodes build, run and compute operation documents into OperationState.

use super::client::{BUILD_API, GcpClient, RUN_API};
use super::error::map_operation_error;
use crate::cloud::traits::{
    OperationError, OperationHandle, OperationKind, OperationOps, OperationState,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// `google.longrunning.Operation`, returned by Cloud Build and Cloud Run.
#[derive(Debug, Deserialize)]
pub(super) struct LongRunningOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<RpcStatus>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

const FAILED_BUILD_STATUSES: &[&str] = &[
    "FAILURE",
    "INTERNAL_ERROR",
    "TIMEOUT",
    "CANCELLED",
    "EXPIRED",
];

impl LongRunningOperation {
    pub fn state(&self) -> OperationState {
        if let Some(error) = &self.error {
            return OperationState::Failed {
                message: format!("{} (code {})", error.message, error.code),
            };
        }
        if !self.done {
            return OperationState::Running;
        }
        match self.build_status() {
            Some(status) if FAILED_BUILD_STATUSES.contains(&status) => OperationState::Failed {
                message: format!("build finished with status {status}"),
            },
            _ => OperationState::Done,
        }
    }

    fn build_status(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("build")?.get("status")?.as_str()
    }
}

/// Compute Engine `Operation` resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ComputeOperation {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub target_link: Option<String>,
    #[serde(default)]
    pub error: Option<ComputeOperationErrors>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ComputeOperationErrors {
    #[serde(default)]
    pub errors: Vec<ComputeOperationError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ComputeOperationError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ComputeOperation {
    pub fn state(&self) -> OperationState {
        if let Some(error) = &self.error {
            let message = error
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return OperationState::Failed { message };
        }
        match self.status.as_str() {
            "DONE" => OperationState::Done,
            "RUNNING" => OperationState::Running,
            _ => OperationState::Pending,
        }
    }
}

#[async_trait]
impl OperationOps for GcpClient {
    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationState, OperationError> {
        let id = handle.id.as_str();
        let map_err = |e| map_operation_error(e, id);

        let state = match handle.kind {
            OperationKind::Build | OperationKind::Run => {
                let base = if handle.kind == OperationKind::Build {
                    BUILD_API
                } else {
                    RUN_API
                };
                let operation: LongRunningOperation = self
                    .send_json(self.http.get(format!("{base}/{id}")))
                    .await
                    .map_err(map_err)?;
                operation.state()
            }
            OperationKind::Global | OperationKind::Regional => {
                let base = if handle.kind == OperationKind::Global {
                    self.compute_global()
                } else {
                    self.compute_regional()
                };
                let operation: ComputeOperation = self
                    .send_json(self.http.get(format!("{base}/operations/{id}")))
                    .await
                    .map_err(map_err)?;
                operation.state()
            }
        };

        debug!(operation = %handle, state = ?state, "polled operation");
        Ok(state)
    }
}
