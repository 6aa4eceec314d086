// ABOUTME: Integration tests for the four deployment workflows.
// ABOUTME: Runs each workflow against the in-memory cloud fake, including failures at every step.

mod support;

use std::path::Path;

use rollout::cloud::{OperationKind, ServiceSpec, WebsiteConfig};
use rollout::config::Settings;
use rollout::deploy::{
    Action, DeploymentRequest, Pipeline, PipelineError, Step, StepError, Target, Workflow,
};
use rollout::diagnostics::WarningKind;
use rollout::output::{Output, OutputMode};
use rollout::types::{EnvVar, ImageRef, ServiceName};
use support::fake_cloud::{ARTIFACT_BUCKET, FakeCloud};
use tempfile::TempDir;

const SITE_BUCKET: &str = "site-mysite";

fn name(value: &str) -> ServiceName {
    ServiceName::new(value).unwrap()
}

fn quiet() -> Output {
    Output::new(OutputMode::Quiet)
}

/// A source tree with a page and a nested asset.
fn source_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    support::write_tree(
        dir.path(),
        &[
            ("index.html", "<html></html>"),
            ("assets/app.js", "console.log(1)"),
        ],
    );
    dir
}

fn existing_service(service: &str) -> ServiceSpec {
    ServiceSpec {
        name: name(service),
        image: ImageRef::parse("us-docker.pkg.dev/acme/deployments/previous").unwrap(),
        env: Vec::new(),
    }
}

/// Seed whatever a workflow expects to already exist.
fn prepare(cloud: &FakeCloud, workflow: Workflow) {
    match (workflow.target, workflow.action) {
        (Target::Backend, Action::Update) => cloud.seed_service(existing_service("mysite")),
        (Target::Frontend, Action::Update) => cloud.seed_bucket(SITE_BUCKET, &["old.js"]),
        _ => {}
    }
}

async fn execute(
    cloud: &FakeCloud,
    settings: &Settings,
    workflow: Workflow,
    source: &Path,
) -> Result<rollout::deploy::RunReport, PipelineError> {
    let output = quiet();
    let request = DeploymentRequest::new(source, name("mysite"));
    Pipeline::new(cloud, settings, &output)
        .execute(workflow, &request)
        .await
}

/// The call that only `step` makes, if it has one.
fn signature(step: Step) -> Option<&'static str> {
    match step {
        Step::Archive => None,
        Step::UploadArtifact | Step::UploadSite => Some("upload_object"),
        Step::BuildImage => Some("submit_build"),
        Step::CreateService => Some("create_service"),
        Step::UpdateService => Some("update_service"),
        Step::MakeServicePublic => Some("allow_public_access"),
        Step::CreateEndpoint => Some("create_endpoint"),
        Step::CreateBackendService => Some("create_backend_service"),
        Step::CreateBucket => Some("create_bucket"),
        Step::CreateBackendBucket => Some("create_backend_bucket"),
        Step::AwaitBackend => Some("poll:global"),
        Step::CreateRoute => Some("get_route_table"),
        Step::ListObjects => Some("list_objects"),
        Step::DeleteObjects => Some("delete_object"),
        Step::MakeSitePublic => Some("make_bucket_public"),
        Step::SetWebsite => Some("set_website"),
        // Failure cleanup also deletes objects.
        Step::DeleteArtifact => None,
    }
}

mod short_circuit {
    use super::*;

    /// Make `step` fail. Returns the source directory to deploy from.
    fn break_step(cloud: &FakeCloud, step: Step, source: &TempDir) -> std::path::PathBuf {
        match step {
            Step::Archive => return source.path().join("missing"),
            Step::UploadArtifact | Step::UploadSite => cloud.fail_on("upload_object"),
            Step::BuildImage => cloud.fail_on("submit_build"),
            Step::CreateService => cloud.fail_on("create_service"),
            Step::UpdateService => cloud.fail_on("update_service"),
            Step::MakeServicePublic => cloud.fail_on("allow_public_access"),
            Step::CreateEndpoint => cloud.fail_on("create_endpoint"),
            Step::CreateBackendService => cloud.fail_on("create_backend_service"),
            Step::CreateBucket => cloud.fail_on("create_bucket"),
            Step::CreateBackendBucket => cloud.fail_on("create_backend_bucket"),
            Step::AwaitBackend => cloud.fail_operations(OperationKind::Global),
            Step::CreateRoute => cloud.fail_on("get_route_table"),
            Step::ListObjects => cloud.fail_on("list_objects"),
            Step::DeleteObjects | Step::DeleteArtifact => cloud.fail_on("delete_object"),
            Step::MakeSitePublic => cloud.fail_on("make_bucket_public"),
            Step::SetWebsite => cloud.fail_on("set_website"),
        }
        source.path().to_path_buf()
    }

    async fn assert_stops_at_every_step(workflow: Workflow) {
        support::init_tracing();
        let settings = support::settings();
        let steps = workflow.steps();

        for (position, &step) in steps.iter().enumerate() {
            // A freshly created bucket has nothing for DeleteObjects to delete.
            if workflow == Workflow::new(Target::Frontend, Action::Create)
                && step == Step::DeleteObjects
            {
                continue;
            }

            let cloud = FakeCloud::new();
            prepare(&cloud, workflow);
            let source = source_tree();
            let dir = break_step(&cloud, step, &source);

            let err = execute(&cloud, &settings, workflow, &dir)
                .await
                .expect_err("workflow should fail");
            assert_eq!(err.step(), step, "{workflow}: wrong failed step");
            assert_eq!(err.index(), position + 1, "{workflow}: wrong index for {step}");

            let calls = cloud.calls();
            for &later in &steps[position + 1..] {
                if let Some(method) = signature(later) {
                    assert!(
                        !calls.iter().any(|c| c == method),
                        "{workflow}: {later} ran after {step} failed: {calls:?}"
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn create_backend_stops_at_failed_step() {
        assert_stops_at_every_step(Workflow::new(Target::Backend, Action::Create)).await;
    }

    #[tokio::test]
    async fn update_backend_stops_at_failed_step() {
        assert_stops_at_every_step(Workflow::new(Target::Backend, Action::Update)).await;
    }

    #[tokio::test]
    async fn create_frontend_stops_at_failed_step() {
        assert_stops_at_every_step(Workflow::new(Target::Frontend, Action::Create)).await;
    }

    #[tokio::test]
    async fn update_frontend_stops_at_failed_step() {
        assert_stops_at_every_step(Workflow::new(Target::Frontend, Action::Update)).await;
    }

    #[tokio::test]
    async fn failure_message_names_step_position() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.fail_on("submit_build");
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        let message = err.to_string();
        assert!(
            message.starts_with("STEP 3 of 10 (build-image) failed:"),
            "unexpected message: {message}"
        );
        assert!(matches!(err.reason(), StepError::Build(_)));

        let app_error = rollout::error::Error::from(err);
        assert_eq!(app_error.kind(), rollout::error::ErrorKind::StepFailure);
        assert_eq!(app_error.to_string(), message);
    }
}

mod backend {
    use super::*;

    #[tokio::test]
    async fn create_backend_provisions_service_and_route() {
        support::init_tracing();
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = source_tree();
        let output = quiet();
        let request = DeploymentRequest::new(source.path(), name("mysite"))
            .with_env(vec![EnvVar::new("MODE", "prod")]);

        let report = Pipeline::new(&cloud, &settings, &output)
            .execute(Workflow::new(Target::Backend, Action::Create), &request)
            .await
            .unwrap();

        assert_eq!(report.steps_completed, 10);
        assert!(report.warnings.is_empty());

        let state = cloud.state();
        let service = &state.services["mysite"];
        assert_eq!(service.env, vec![EnvVar::new("MODE", "prod")]);
        assert!(
            service
                .image
                .to_string()
                .starts_with("us-docker.pkg.dev/acme/deployments/")
        );
        assert_eq!(state.builds.len(), 1);
        assert_eq!(state.builds[0].image, service.image);
        assert!(state.public_services.contains("mysite"));

        let rule = state.route_table.host_rules.last().unwrap();
        assert_eq!(rule.hosts, vec!["mysite.example.app".to_string()]);
        assert_eq!(rule.path_matcher, "mysite-path");
        let matcher = state.route_table.path_matchers.last().unwrap();
        assert_eq!(
            matcher.default_service.as_deref(),
            Some("https://compute/global/backendServices/mysite")
        );

        assert!(
            state.buckets[ARTIFACT_BUCKET].is_empty(),
            "source archive should be deleted"
        );
    }

    #[tokio::test]
    async fn create_backend_runs_steps_in_order() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = source_tree();

        execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap();

        assert_eq!(
            cloud.calls(),
            vec![
                "upload_object",
                "submit_build",
                "poll:build",
                "create_service",
                "poll:run",
                "allow_public_access",
                "create_endpoint",
                "poll:regional",
                "create_backend_service",
                "poll:global",
                "get_route_table",
                "patch_route_table",
                "poll:global",
                "delete_object",
            ]
        );
    }

    #[tokio::test]
    async fn update_backend_rolls_existing_service() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.seed_service(existing_service("mysite"));
        let source = source_tree();

        let report = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Update),
            source.path(),
        )
        .await
        .unwrap();

        assert_eq!(report.steps_completed, 5);
        assert!(!cloud.called("create_service"));
        assert!(!cloud.called("get_route_table"));

        let state = cloud.state();
        let service = &state.services["mysite"];
        assert_ne!(
            service.image.to_string(),
            "us-docker.pkg.dev/acme/deployments/previous"
        );
        assert!(state.buckets[ARTIFACT_BUCKET].is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_service_fails() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Update),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::UpdateService);
    }

    #[tokio::test]
    async fn excluded_directories_are_not_required() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = tempfile::tempdir().unwrap();
        support::write_tree(
            source.path(),
            &[("main.py", "print(1)"), ("node_modules/dep/index.js", "x")],
        );

        execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap();
    }
}

mod artifact_cleanup {
    use super::*;

    #[tokio::test]
    async fn failed_build_deletes_uploaded_archive() {
        support::init_tracing();
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.fail_on("submit_build");
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::BuildImage);
        assert_eq!(cloud.call_count("upload_object"), 1);
        assert_eq!(cloud.call_count("delete_object"), 1);
        assert!(cloud.objects(ARTIFACT_BUCKET).is_empty());
    }

    #[tokio::test]
    async fn failed_service_rollout_deletes_uploaded_archive() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.fail_operations(OperationKind::Run);
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::CreateService);
        assert!(matches!(err.reason(), StepError::Wait(_)));
        assert!(cloud.objects(ARTIFACT_BUCKET).is_empty());
    }

    #[tokio::test]
    async fn failure_before_upload_deletes_nothing() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.fail_on("upload_object");
        let source = source_tree();

        execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        assert!(!cloud.called("delete_object"));
    }

    #[tokio::test]
    async fn failed_artifact_delete_is_reported_once() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.seed_service(existing_service("mysite"));
        cloud.fail_on("delete_object");
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Update),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::DeleteArtifact);
        assert_eq!(err.index(), 5);
        assert_eq!(cloud.call_count("delete_object"), 1);
    }

    #[tokio::test]
    async fn cleanup_failure_keeps_original_error() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.fail_on("create_service");
        cloud.fail_on("delete_object");
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::CreateService);
        assert!(matches!(err.reason(), StepError::Service(_)));
        assert_eq!(cloud.objects(ARTIFACT_BUCKET).len(), 1);
    }
}

mod private_files {
    use super::*;
    use std::io::Read;

    /// A site tree that also holds credentials and rollout's own settings.
    fn tree_with_secrets() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        support::write_tree(
            dir.path(),
            &[
                ("index.html", "<html></html>"),
                (".env", "GOOGLE_OAUTH_ACCESS_TOKEN=secret"),
                (".prod.env", "DATABASE_URL=postgres://db"),
                ("rollout.yml", support::SETTINGS_YAML),
                (".rollout/config.yml", support::SETTINGS_YAML),
            ],
        );
        dir
    }

    #[tokio::test]
    async fn create_frontend_keeps_private_files_out_of_public_bucket() {
        support::init_tracing();
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = tree_with_secrets();

        execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Create),
            source.path(),
        )
        .await
        .unwrap();

        assert_eq!(cloud.objects(SITE_BUCKET), vec!["index.html".to_string()]);
        assert!(cloud.state().public_buckets.contains(SITE_BUCKET));
    }

    #[tokio::test]
    async fn backend_archive_leaves_out_private_files() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.seed_service(existing_service("mysite"));
        // Keep the uploaded archive around so its entries can be read back.
        cloud.fail_on("delete_object");
        let source = tree_with_secrets();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Backend, Action::Update),
            source.path(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.step(), Step::DeleteArtifact);

        let state = cloud.state();
        let artifacts = &state.buckets[ARTIFACT_BUCKET];
        assert_eq!(artifacts.len(), 1);
        let body = &artifacts.values().next().unwrap().body;

        let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(&body[..]));
        let mut entries = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            assert!(!contents.contains("secret"), "{path} leaked the token");
            entries.push(path);
        }
        assert_eq!(entries, vec!["index.html".to_string()]);
    }
}

mod frontend {
    use super::*;

    #[tokio::test]
    async fn create_frontend_publishes_site() {
        support::init_tracing();
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = source_tree();

        let report = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Create),
            source.path(),
        )
        .await
        .unwrap();

        assert_eq!(report.steps_completed, 9);
        assert_eq!(
            cloud.objects(SITE_BUCKET),
            vec!["assets/app.js".to_string(), "index.html".to_string()]
        );

        let state = cloud.state();
        let objects = &state.buckets[SITE_BUCKET];
        assert_eq!(
            objects["index.html"].content_type,
            "text/html; charset=utf-8"
        );
        assert_eq!(&objects["assets/app.js"].body[..], b"console.log(1)");
        assert!(state.public_buckets.contains(SITE_BUCKET));
        assert_eq!(
            state.websites[SITE_BUCKET],
            WebsiteConfig::single_page("index.html")
        );

        let rule = state.route_table.host_rules.last().unwrap();
        assert_eq!(rule.hosts, vec!["mysite.example.app".to_string()]);
        let matcher = state.route_table.path_matchers.last().unwrap();
        assert_eq!(
            matcher.default_service.as_deref(),
            Some("https://compute/global/backendBuckets/mysite")
        );
        assert!(state.builds.is_empty());
    }

    #[tokio::test]
    async fn create_frontend_fails_when_bucket_exists() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.seed_bucket(SITE_BUCKET, &[]);
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::CreateBucket);
        assert_eq!(err.index(), 1);
        assert!(!cloud.called("create_backend_bucket"));
    }

    #[tokio::test]
    async fn update_frontend_replaces_existing_objects() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.seed_bucket(SITE_BUCKET, &["old.js", "stale/page.html"]);
        let source = source_tree();

        let report = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Update),
            source.path(),
        )
        .await
        .unwrap();

        assert_eq!(report.steps_completed, 4);
        assert_eq!(
            cloud.objects(SITE_BUCKET),
            vec!["assets/app.js".to_string(), "index.html".to_string()]
        );
        assert_eq!(cloud.call_count("delete_object"), 2);
        assert!(!cloud.called("make_bucket_public"));
        assert!(!cloud.called("get_route_table"));
        assert!(cloud.state().websites.contains_key(SITE_BUCKET));
    }

    #[tokio::test]
    async fn update_frontend_of_missing_bucket_fails_at_listing() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Update),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::ListObjects);
        assert!(!cloud.called("upload_object"));
    }

    #[tokio::test]
    async fn partial_upload_failure_reports_every_object() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.seed_bucket(SITE_BUCKET, &[]);
        cloud.fail_on("upload_object");
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Update),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::UploadSite);
        match err.reason() {
            StepError::Bulk(bulk) => {
                assert_eq!(bulk.failures.len(), 2);
                assert_eq!(bulk.succeeded, 0);
            }
            other => panic!("expected bulk failure, got {other:?}"),
        }
        assert!(!cloud.called("set_website"));
    }
}

mod routing {
    use super::*;

    #[tokio::test]
    async fn route_conflict_is_retried_with_warning() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.inject_route_conflicts(1);
        let source = source_tree();

        let report = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Create),
            source.path(),
        )
        .await
        .unwrap();

        assert_eq!(cloud.call_count("get_route_table"), 2);
        assert_eq!(cloud.call_count("patch_route_table"), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::RouteConflict);
    }

    #[tokio::test]
    async fn persistent_conflict_fails_route_step() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        cloud.inject_route_conflicts(10);
        let source = source_tree();

        let err = execute(
            &cloud,
            &settings,
            Workflow::new(Target::Frontend, Action::Create),
            source.path(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.step(), Step::CreateRoute);
        assert_eq!(
            cloud.call_count("patch_route_table"),
            settings.route_attempts as usize
        );
        assert!(!cloud.called("list_objects"));
    }
}

mod run {
    use super::*;

    #[tokio::test]
    async fn run_reports_success_as_bool() {
        let settings = support::settings();
        let cloud = FakeCloud::new();
        let source = source_tree();
        let output = quiet();
        let request = DeploymentRequest::new(source.path(), name("mysite"));
        let pipeline = Pipeline::new(&cloud, &settings, &output);

        assert!(
            pipeline
                .run(Workflow::new(Target::Frontend, Action::Create), &request)
                .await
        );
        // The bucket now exists, so a second create fails.
        assert!(
            !pipeline
                .run(Workflow::new(Target::Frontend, Action::Create), &request)
                .await
        );
    }
}
