// ABOUTME: The named units of work a workflow is made of.
// ABOUTME: Each step has a stable identifier and a progress description.

use serde::Serialize;
use std::fmt;

/// A single unit of work in a deployment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    /// Pack the source directory into a compressed archive.
    Archive,
    /// Store the archive in the artifact bucket.
    UploadArtifact,
    /// Build a container image from the uploaded archive and wait for it.
    BuildImage,
    /// Create the service from the built image and wait for its rollout.
    CreateService,
    /// Roll the existing service to the built image and wait.
    UpdateService,
    /// Allow anonymous invocation of the service.
    MakeServicePublic,
    /// Create the serverless endpoint for the service and wait for it.
    CreateEndpoint,
    /// Create the backend service bound to the endpoint.
    CreateBackendService,
    /// Create the site bucket.
    CreateBucket,
    /// Create the backend bucket serving the site bucket.
    CreateBackendBucket,
    /// Wait for the backend created by the previous step.
    AwaitBackend,
    /// Add the host and path matcher to the shared route table.
    CreateRoute,
    /// Read the names of the objects already in the site bucket.
    ListObjects,
    /// Delete every object found by the listing.
    DeleteObjects,
    /// Upload every file of the source directory.
    UploadSite,
    /// Make the site bucket publicly readable.
    MakeSitePublic,
    /// Set the index and not-found pages of the site bucket.
    SetWebsite,
    /// Delete the uploaded source archive.
    DeleteArtifact,
}

impl Step {
    /// Stable identifier used in logs and JSON output.
    pub fn id(&self) -> &'static str {
        match self {
            Step::Archive => "archive",
            Step::UploadArtifact => "upload-artifact",
            Step::BuildImage => "build-image",
            Step::CreateService => "create-service",
            Step::UpdateService => "update-service",
            Step::MakeServicePublic => "make-service-public",
            Step::CreateEndpoint => "create-endpoint",
            Step::CreateBackendService => "create-backend-service",
            Step::CreateBucket => "create-bucket",
            Step::CreateBackendBucket => "create-backend-bucket",
            Step::AwaitBackend => "await-backend",
            Step::CreateRoute => "create-route",
            Step::ListObjects => "list-objects",
            Step::DeleteObjects => "delete-objects",
            Step::UploadSite => "upload-site",
            Step::MakeSitePublic => "make-site-public",
            Step::SetWebsite => "set-website",
            Step::DeleteArtifact => "delete-artifact",
        }
    }

    /// Progress line shown before the step runs.
    pub fn description(&self) -> &'static str {
        match self {
            Step::Archive => "Beginning archive...",
            Step::UploadArtifact => "Beginning artifact upload...",
            Step::BuildImage => "Beginning image build... (long-running)",
            Step::CreateService => "Beginning service creation... (long-running)",
            Step::UpdateService => "Beginning service update... (long-running)",
            Step::MakeServicePublic => "Beginning public access...",
            Step::CreateEndpoint => "Beginning endpoint creation...",
            Step::CreateBackendService => "Beginning backend service creation...",
            Step::CreateBucket => "Beginning bucket creation...",
            Step::CreateBackendBucket => "Beginning backend bucket creation...",
            Step::AwaitBackend => "Tracking backend creation... (long-running)",
            Step::CreateRoute => "Beginning mapping creation...",
            Step::ListObjects => "Beginning file retrieval...",
            Step::DeleteObjects => "Beginning file clean-up...",
            Step::UploadSite => "Beginning file upload...",
            Step::MakeSitePublic => "Beginning public access...",
            Step::SetWebsite => "Beginning metadata set...",
            Step::DeleteArtifact => "Beginning artifact clean-up...",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
