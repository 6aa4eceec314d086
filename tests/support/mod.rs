// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, shared settings and an in-memory cloud fake.

use std::path::Path;
use std::sync::Once;

use rollout::config::Settings;

// Each test binary only uses some of these items, so allow dead_code.
#[allow(dead_code)]
pub mod fake_cloud;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rollout=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub const SETTINGS_YAML: &str = r#"
project: acme
region: us-central1
artifact_bucket: acme-artifacts
image_repository: us-docker.pkg.dev/acme/deployments
load_balancer: lb
domain: example.app
access_token: test-token
operation_wait:
  interval: 1ms
  max_rounds: 5
build_wait:
  interval: 1ms
  max_rounds: 5
"#;

/// Settings with millisecond polling so waits finish immediately.
#[allow(dead_code)]
pub fn settings() -> Settings {
    Settings::from_yaml(SETTINGS_YAML).unwrap()
}

/// Write `files` (relative path, contents) under `dir`, creating parents.
#[allow(dead_code)]
pub fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (relative, contents) in files {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}
