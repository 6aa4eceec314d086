// ABOUTME: Error types for pipeline steps and whole workflow runs.
// ABOUTME: StepError unifies collaborator errors; PipelineError names the failed step.

use snafu::Snafu;

use super::routing::RouteError;
use super::step::Step;
use super::waiter::WaitError;
use crate::cloud::{BuildError, ComputeError, ServiceError, StorageError};
use crate::files::{ArchiveError, BulkError};
use crate::types::{BucketNameError, ParseImageRefError};

/// Why a single step failed.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Bulk(#[from] BulkError),

    #[error("failed to list source files: {0}")]
    Listing(#[source] std::io::Error),

    #[error("invalid image reference: {0}")]
    Image(#[from] ParseImageRefError),

    #[error("invalid site bucket: {0}")]
    Bucket(#[from] BucketNameError),

    /// An earlier step did not leave the output this step consumes.
    #[error("missing {0} from an earlier step")]
    MissingInput(&'static str),
}

/// A workflow run that stopped at a failed step.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    #[snafu(display("STEP {index} of {total} ({step}) failed: {source}"))]
    StepFailed {
        step: Step,
        index: usize,
        total: usize,
        source: StepError,
    },
}

impl PipelineError {
    /// The step that failed.
    pub fn step(&self) -> Step {
        match self {
            PipelineError::StepFailed { step, .. } => *step,
        }
    }

    /// One-based position of the failed step.
    pub fn index(&self) -> usize {
        match self {
            PipelineError::StepFailed { index, .. } => *index,
        }
    }

    /// The underlying step error.
    pub fn reason(&self) -> &StepError {
        match self {
            PipelineError::StepFailed { source, .. } => source,
        }
    }
}
