// ABOUTME: Application-wide error types for rollout.
// ABOUTME: Separates configuration failures from failed pipeline steps.

use thiserror::Error;

use crate::deploy::PipelineError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to create cloud client: {0}")]
    Client(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed invocation, settings or env file.
    ConfigFailure,
    /// A named pipeline step failed.
    StepFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Pipeline(_) => ErrorKind::StepFailure,
            _ => ErrorKind::ConfigFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
