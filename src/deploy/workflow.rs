// ABOUTME: The four deployment workflows as one parameterized definition.
// ABOUTME: Target and action select a fixed, ordered step list.

use super::step::Step;
use serde::Serialize;
use std::fmt;

/// What is being deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// A container service built from source.
    Backend,
    /// A static site served from a bucket.
    Frontend,
}

/// Whether the deployment provisions new resources or replaces content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
}

const CREATE_BACKEND: &[Step] = &[
    Step::Archive,
    Step::UploadArtifact,
    Step::BuildImage,
    Step::CreateService,
    Step::MakeServicePublic,
    Step::CreateEndpoint,
    Step::CreateBackendService,
    Step::AwaitBackend,
    Step::CreateRoute,
    Step::DeleteArtifact,
];

const UPDATE_BACKEND: &[Step] = &[
    Step::Archive,
    Step::UploadArtifact,
    Step::BuildImage,
    Step::UpdateService,
    Step::DeleteArtifact,
];

const CREATE_FRONTEND: &[Step] = &[
    Step::CreateBucket,
    Step::CreateBackendBucket,
    Step::AwaitBackend,
    Step::CreateRoute,
    Step::ListObjects,
    Step::DeleteObjects,
    Step::UploadSite,
    Step::MakeSitePublic,
    Step::SetWebsite,
];

const UPDATE_FRONTEND: &[Step] = &[
    Step::ListObjects,
    Step::DeleteObjects,
    Step::UploadSite,
    Step::SetWebsite,
];

/// One of the four deployment workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Workflow {
    pub target: Target,
    pub action: Action,
}

impl Workflow {
    pub const fn new(target: Target, action: Action) -> Self {
        Self { target, action }
    }

    /// Every workflow, in a fixed order.
    pub const ALL: [Workflow; 4] = [
        Workflow::new(Target::Backend, Action::Create),
        Workflow::new(Target::Backend, Action::Update),
        Workflow::new(Target::Frontend, Action::Create),
        Workflow::new(Target::Frontend, Action::Update),
    ];

    /// The ordered steps of this workflow.
    pub fn steps(&self) -> &'static [Step] {
        match (self.target, self.action) {
            (Target::Backend, Action::Create) => CREATE_BACKEND,
            (Target::Backend, Action::Update) => UPDATE_BACKEND,
            (Target::Frontend, Action::Create) => CREATE_FRONTEND,
            (Target::Frontend, Action::Update) => UPDATE_FRONTEND,
        }
    }

    pub fn name(&self) -> &'static str {
        match (self.target, self.action) {
            (Target::Backend, Action::Create) => "create-backend",
            (Target::Backend, Action::Update) => "update-backend",
            (Target::Frontend, Action::Create) => "create-frontend",
            (Target::Frontend, Action::Update) => "update-frontend",
        }
    }

    /// Past-tense summary printed after a successful run.
    pub fn outcome(&self) -> &'static str {
        match (self.target, self.action) {
            (Target::Backend, Action::Create) => "Backend successfully created",
            (Target::Backend, Action::Update) => "Backend successfully updated",
            (Target::Frontend, Action::Create) => "Frontend successfully created",
            (Target::Frontend, Action::Update) => "Frontend successfully updated",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
