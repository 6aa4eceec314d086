// ABOUTME: Parser for the KEY=VALUE file holding backend service variables.
// ABOUTME: Any malformed line rejects the whole file.

use std::path::Path;

use thiserror::Error;

use crate::types::EnvVar;

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("line {line}: expected exactly one '=' in {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: variable name is empty")]
    EmptyName { line: usize },

    #[error("line {line}: duplicate variable {name}")]
    Duplicate { line: usize, name: String },

    #[error("failed to read env file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse `KEY=VALUE` lines in order.
///
/// Blank lines and lines starting with `#` are skipped. Values are taken
/// verbatim; only a trailing carriage return is removed.
pub fn parse_env_file(content: &str) -> Result<Vec<EnvVar>, EnvFileError> {
    let mut vars: Vec<EnvVar> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.strip_suffix('\r').unwrap_or(raw);

        if text.trim().is_empty() || text.trim_start().starts_with('#') {
            continue;
        }

        let mut parts = text.split('=');
        let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EnvFileError::Malformed {
                line,
                content: text.to_string(),
            });
        };

        if name.is_empty() {
            return Err(EnvFileError::EmptyName { line });
        }

        if vars.iter().any(|v| v.name == name) {
            return Err(EnvFileError::Duplicate {
                line,
                name: name.to_string(),
            });
        }

        vars.push(EnvVar::new(name, value));
    }

    Ok(vars)
}

/// Read and parse the env file at `path`. A missing file yields no variables.
pub fn load_env_file(path: &Path) -> Result<Vec<EnvVar>, EnvFileError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_env_file(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No env file at {}", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
