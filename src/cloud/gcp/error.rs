// ABOUTME: Decoding of Google API error responses and mapping to trait errors.
// ABOUTME: Status codes pick the variant; the envelope message becomes the detail.

use crate::cloud::traits::{BuildError, ComputeError, OperationError, ServiceError, StorageError};
use serde::Deserialize;

/// A failed call to a Google REST API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe(.status, .message))]
pub struct ApiError {
    /// HTTP status, absent when the request never got a response.
    pub status: Option<u16>,
    pub message: String,
}

fn describe(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {code}: {message}"),
        None => message.to_string(),
    }
}

#[derive(Deserialize)]
struct Envelope {
    error: EnvelopeBody,
}

#[derive(Deserialize)]
struct EnvelopeBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ApiError {
    /// Decode an error response body, falling back to the raw text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => match envelope.error.status {
                Some(kind) if !envelope.error.message.is_empty() => {
                    format!("{kind}: {}", envelope.error.message)
                }
                Some(kind) => kind,
                None => envelope.error.message,
            },
            Err(_) if body.trim().is_empty() => "empty response body".to_string(),
            Err(_) => body.trim().to_string(),
        };
        Self {
            status: Some(status),
            message,
        }
    }

    pub fn transport(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    fn is(&self, code: u16) -> bool {
        self.status == Some(code)
    }

    fn is_denied(&self) -> bool {
        self.is(401) || self.is(403)
    }
}

pub(crate) fn map_storage_error(e: ApiError, what: &str) -> StorageError {
    let detail = format!("{what}: {}", e.message);
    match e.status {
        Some(404) => StorageError::NotFound(detail),
        Some(409) => StorageError::AlreadyExists(detail),
        _ if e.is_denied() => StorageError::PermissionDenied(detail),
        _ => StorageError::Request(format!("{what}: {e}")),
    }
}

pub(crate) fn map_build_error(e: ApiError) -> BuildError {
    match e.status {
        Some(400) => BuildError::Rejected(e.message),
        _ if e.is_denied() => BuildError::PermissionDenied(e.message),
        _ => BuildError::Request(e.to_string()),
    }
}

pub(crate) fn map_service_error(e: ApiError, service: &str) -> ServiceError {
    let detail = format!("{service}: {}", e.message);
    match e.status {
        Some(404) => ServiceError::NotFound(detail),
        Some(409) => ServiceError::AlreadyExists(detail),
        _ if e.is_denied() => ServiceError::PermissionDenied(detail),
        _ => ServiceError::Request(format!("{service}: {e}")),
    }
}

pub(crate) fn map_compute_error(e: ApiError, resource: &str) -> ComputeError {
    let detail = format!("{resource}: {}", e.message);
    match e.status {
        Some(404) => ComputeError::NotFound(detail),
        Some(409) => ComputeError::AlreadyExists(detail),
        Some(412) => ComputeError::Conflict(detail),
        _ if e.is_denied() => ComputeError::PermissionDenied(detail),
        _ => ComputeError::Request(format!("{resource}: {e}")),
    }
}

pub(crate) fn map_operation_error(e: ApiError, operation: &str) -> OperationError {
    if e.is(404) {
        OperationError::NotFound(operation.to_string())
    } else {
        OperationError::Request(format!("{operation}: {e}"))
    }
}
