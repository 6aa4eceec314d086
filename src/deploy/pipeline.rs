// ABOUTME: Runs a workflow step by step against the cloud provider.
// ABOUTME: Stops at the first failed step and always releases the uploaded artifact.

use std::time::{Duration, Instant};

use snafu::ResultExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::deployment::DeploymentRequest;
use super::error::{PipelineError, StepError, StepFailedSnafu};
use super::routing::create_mapping;
use super::state::{RunState, required, take};
use super::step::Step;
use super::waiter::OperationWaiter;
use super::workflow::Workflow;
use crate::cloud::{
    BuildRequest, CloudProvider, ObjectRef, OperationHandle, RouteEntry, ServiceSpec,
    WebsiteConfig,
};
use crate::config::{Settings, WaitPolicy};
use crate::diagnostics::{Diagnostics, Warning};
use crate::files::{
    ExcludePattern, archive_directory, delete_files, deploy_files, list_folder, retain_included,
};
use crate::output::Output;
use crate::types::{BucketName, ImageRef, ObjectName};

const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";
const INDEX_PAGE: &str = "index.html";

/// Summary of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub workflow: Workflow,
    pub steps_completed: usize,
    pub elapsed: Duration,
    pub warnings: Vec<Warning>,
}

/// Executes workflows against one provider with one set of settings.
pub struct Pipeline<'a, P: CloudProvider + ?Sized> {
    provider: &'a P,
    settings: &'a Settings,
    output: &'a Output,
}

impl<'a, P: CloudProvider + ?Sized> Pipeline<'a, P> {
    pub fn new(provider: &'a P, settings: &'a Settings, output: &'a Output) -> Self {
        Self {
            provider,
            settings,
            output,
        }
    }

    /// Run `workflow` and report success as a boolean.
    ///
    /// Progress and the failure line are printed through the output handle.
    pub async fn run(&self, workflow: Workflow, request: &DeploymentRequest) -> bool {
        match self.execute(workflow, request).await {
            Ok(report) => {
                self.report_success(&report, request);
                true
            }
            Err(_) => false,
        }
    }

    /// Print the warnings of a successful run and its outcome line.
    pub fn report_success(&self, report: &RunReport, request: &DeploymentRequest) {
        for warning in &report.warnings {
            self.output.warning(&warning.message);
        }
        self.output.success(&format!(
            "{}: {}",
            report.workflow.outcome(),
            request.name
        ));
    }

    /// Run `workflow`, stopping at the first failed step.
    ///
    /// Steps after a failure never run. An artifact uploaded before the
    /// failure is still deleted, best-effort.
    pub async fn execute(
        &self,
        workflow: Workflow,
        request: &DeploymentRequest,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let steps = workflow.steps();
        let total = steps.len();
        let mut state = RunState::default();
        let mut diagnostics = Diagnostics::default();

        info!(workflow = %workflow, name = %request.name, source = %request.source_dir.display(), "starting workflow");

        for (position, &step) in steps.iter().enumerate() {
            let index = position + 1;
            self.output.step(index, total, step);

            let step_started = Instant::now();
            let outcome = self
                .run_step(step, request, &mut state, &mut diagnostics)
                .await
                .context(StepFailedSnafu { step, index, total });

            if let Err(error) = outcome {
                self.output
                    .step_failed(index, total, step, &error.reason().to_string());
                self.release_artifact(&mut state, &mut diagnostics).await;
                for warning in diagnostics.warnings() {
                    self.output.warning(&warning.message);
                }
                return Err(error);
            }

            info!(
                step = %step,
                index,
                total,
                elapsed_ms = step_started.elapsed().as_millis() as u64,
                "step completed"
            );
        }

        Ok(RunReport {
            workflow,
            steps_completed: total,
            elapsed: started.elapsed(),
            warnings: diagnostics.into_warnings(),
        })
    }

    async fn run_step(
        &self,
        step: Step,
        request: &DeploymentRequest,
        state: &mut RunState,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), StepError> {
        let provider = self.provider;
        let settings = self.settings;

        match step {
            Step::Archive => {
                let archive =
                    archive_directory(&request.source_dir, &settings.archive_excludes()).await?;
                debug!(files = archive.files, bytes = archive.bytes.len(), "archived source");
                state.archive = Some(archive);
            }

            Step::UploadArtifact => {
                let archive = take(&mut state.archive, "source archive")?;
                let name = settings.artifact_object(&Uuid::new_v4().simple().to_string());
                provider
                    .upload_object(
                        &settings.artifact_bucket,
                        &name,
                        archive.bytes,
                        ARCHIVE_CONTENT_TYPE,
                    )
                    .await?;
                let artifact = ObjectRef {
                    bucket: settings.artifact_bucket.clone(),
                    name: ObjectName::new(name),
                };
                debug!(artifact = %artifact, "uploaded source archive");
                state.artifact = Some(artifact);
            }

            Step::BuildImage => {
                let source = required(&state.artifact, "uploaded artifact")?.clone();
                let image = ImageRef::in_repository(
                    &settings.image_repository,
                    &Uuid::new_v4().simple().to_string(),
                )?;
                let handle = provider
                    .submit_build(&BuildRequest {
                        source,
                        image: image.clone(),
                    })
                    .await?;
                self.wait(&handle, settings.build_wait).await?;
                state.image = Some(image);
            }

            Step::CreateService | Step::UpdateService => {
                let spec = ServiceSpec {
                    name: request.name.clone(),
                    image: required(&state.image, "built image")?.clone(),
                    env: request.env.clone(),
                };
                let handle = if step == Step::CreateService {
                    provider.create_service(&spec).await?
                } else {
                    provider.update_service(&spec).await?
                };
                self.wait(&handle, settings.build_wait).await?;
            }

            Step::MakeServicePublic => {
                provider.allow_public_access(&request.name).await?;
            }

            Step::CreateEndpoint => {
                let operation = provider.create_endpoint(&request.name).await?;
                self.wait(&operation.handle, settings.operation_wait).await?;
                state.endpoint = Some(operation.target);
            }

            Step::CreateBackendService => {
                let endpoint = required(&state.endpoint, "network endpoint")?;
                let operation = provider
                    .create_backend_service(&request.name, endpoint)
                    .await?;
                state.backend = Some(operation);
            }

            Step::CreateBucket => {
                let bucket = self.site_bucket(request, state)?;
                provider.create_bucket(&bucket).await?;
            }

            Step::CreateBackendBucket => {
                let bucket = self.site_bucket(request, state)?;
                let operation = provider
                    .create_backend_bucket(&request.name, &bucket)
                    .await?;
                state.backend = Some(operation);
            }

            Step::AwaitBackend => {
                let backend = required(&state.backend, "backend operation")?;
                self.wait(&backend.handle, settings.operation_wait).await?;
            }

            Step::CreateRoute => {
                let backend = required(&state.backend, "backend operation")?;
                let route =
                    RouteEntry::for_service(&request.name, &settings.domain, backend.target.clone());
                let mapping = create_mapping(
                    provider,
                    &settings.load_balancer,
                    &route,
                    settings.route_attempts,
                )
                .await?;
                if mapping.attempts > 1 {
                    diagnostics.warn(Warning::route_conflict(format!(
                        "route table {} changed during update; {} succeeded on attempt {}",
                        settings.load_balancer, route.matcher, mapping.attempts
                    )));
                }
                self.wait(&mapping.operation.handle, settings.operation_wait)
                    .await?;
            }

            Step::ListObjects => {
                let bucket = self.site_bucket(request, state)?;
                let names = provider.list_objects(&bucket).await?;
                debug!(bucket = %bucket, count = names.len(), "found existing objects");
                state.existing_objects = Some(names);
            }

            Step::DeleteObjects => {
                let bucket = self.site_bucket(request, state)?;
                let names = take(&mut state.existing_objects, "object listing")?;
                let deleted =
                    delete_files(provider, &names, &bucket, settings.upload_concurrency).await?;
                debug!(bucket = %bucket, deleted, "deleted existing objects");
            }

            Step::UploadSite => {
                let bucket = self.site_bucket(request, state)?;
                let listed = list_folder(&request.source_dir)
                    .await
                    .map_err(StepError::Listing)?;
                let private: Vec<ExcludePattern> = settings
                    .private_files()
                    .iter()
                    .map(|p| ExcludePattern::new(p))
                    .collect();
                let files = retain_included(&request.source_dir, listed, &private);
                let uploaded = deploy_files(
                    provider,
                    &request.source_dir,
                    &files,
                    &bucket,
                    settings.upload_concurrency,
                )
                .await?;
                debug!(bucket = %bucket, uploaded, "uploaded site files");
            }

            Step::MakeSitePublic => {
                let bucket = self.site_bucket(request, state)?;
                provider.make_bucket_public(&bucket).await?;
            }

            Step::SetWebsite => {
                let bucket = self.site_bucket(request, state)?;
                provider
                    .set_website(&bucket, &WebsiteConfig::single_page(INDEX_PAGE))
                    .await?;
            }

            Step::DeleteArtifact => {
                let artifact = take(&mut state.artifact, "uploaded artifact")?;
                provider
                    .delete_object(&artifact.bucket, artifact.name.as_str())
                    .await?;
                debug!(artifact = %artifact, "deleted source archive");
            }
        }

        Ok(())
    }

    async fn wait(&self, handle: &OperationHandle, policy: WaitPolicy) -> Result<(), StepError> {
        let completion = OperationWaiter::new(policy)
            .wait(self.provider, handle)
            .await?;
        debug!(operation = %handle, rounds = completion.rounds, "operation finished");
        Ok(())
    }

    /// The site bucket for this run, derived once from the site name.
    fn site_bucket(
        &self,
        request: &DeploymentRequest,
        state: &mut RunState,
    ) -> Result<BucketName, StepError> {
        if let Some(bucket) = &state.site_bucket {
            return Ok(bucket.clone());
        }
        let bucket = self.settings.site_bucket(&request.name)?;
        state.site_bucket = Some(bucket.clone());
        Ok(bucket)
    }

    /// Delete the uploaded artifact if the run still owns one.
    async fn release_artifact(&self, state: &mut RunState, diagnostics: &mut Diagnostics) {
        let Some(artifact) = state.artifact.take() else {
            return;
        };

        match self
            .provider
            .delete_object(&artifact.bucket, artifact.name.as_str())
            .await
        {
            Ok(()) => info!(artifact = %artifact, "released source archive after failure"),
            Err(e) => diagnostics.warn(Warning::artifact_cleanup(format!(
                "failed to delete {artifact}: {e}"
            ))),
        }
    }
}
