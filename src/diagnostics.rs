// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning. Users see it through `Output`; tracing gets a debug event.
    pub fn warn(&mut self, warning: Warning) {
        tracing::debug!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The uploaded source archive could not be deleted.
    pub fn artifact_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ArtifactCleanup,
            message: message.into(),
        }
    }

    /// The env file was malformed and no variables were loaded.
    pub fn env_file_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::EnvFileSkipped,
            message: message.into(),
        }
    }

    /// The route table changed under us and the patch was retried.
    pub fn route_conflict(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RouteConflict,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Failed to delete the source archive (object may remain in storage).
    ArtifactCleanup,
    /// Env file could not be parsed; the service got no variables from it.
    EnvFileSkipped,
    /// Route table patch needed more than one read-modify-write cycle.
    RouteConflict,
}
