// ABOUTME: The inputs of one deployment run.
// ABOUTME: Source directory, service or site name, and the service environment.

use crate::types::{EnvVar, ServiceName};
use std::path::PathBuf;

/// What to deploy and where it comes from. Read-only during a run.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    /// Directory that is archived (backend) or uploaded file by file (frontend).
    pub source_dir: PathBuf,
    /// Service or site name.
    pub name: ServiceName,
    /// Environment of the deployed service; unused for sites.
    pub env: Vec<EnvVar>,
}

impl DeploymentRequest {
    pub fn new(source_dir: impl Into<PathBuf>, name: ServiceName) -> Self {
        Self {
            source_dir: source_dir.into(),
            name,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<EnvVar>) -> Self {
        self.env = env;
        self
    }
}
