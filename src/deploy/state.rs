// ABOUTME: Outputs of completed steps, consumed by later steps of the same run.
// ABOUTME: A missing output becomes StepError::MissingInput instead of a panic.

use super::error::StepError;
use crate::cloud::{ObjectRef, ProviderOperation};
use crate::files::Archive;
use crate::types::{BucketName, ImageRef, ResourceLink};

/// Per-run scratch space filled in step by step.
#[derive(Debug, Default)]
pub struct RunState {
    pub archive: Option<Archive>,
    /// The uploaded source archive. Cleared once deleted.
    pub artifact: Option<ObjectRef>,
    pub image: Option<ImageRef>,
    pub endpoint: Option<ResourceLink>,
    /// The most recently created backend service or backend bucket.
    pub backend: Option<ProviderOperation>,
    pub site_bucket: Option<BucketName>,
    pub existing_objects: Option<Vec<String>>,
}

/// Borrow a step output, or report which one is missing.
pub fn required<'a, T>(slot: &'a Option<T>, what: &'static str) -> Result<&'a T, StepError> {
    slot.as_ref().ok_or(StepError::MissingInput(what))
}

/// Take ownership of a step output, or report which one is missing.
pub fn take<T>(slot: &mut Option<T>, what: &'static str) -> Result<T, StepError> {
    slot.take().ok_or(StepError::MissingInput(what))
}
