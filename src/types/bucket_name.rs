// ABOUTME: Validated storage bucket name.
// ABOUTME: Site buckets are derived deterministically from a prefix and the site name.

use super::ServiceName;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BucketNameError {
    #[error("bucket name must be between 3 and 63 characters: {0}")]
    Length(String),

    #[error("bucket name must start and end with a letter or digit: {0}")]
    Boundary(String),

    #[error("invalid character in bucket name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    pub fn new(value: &str) -> Result<Self, BucketNameError> {
        if !(3..=63).contains(&value.len()) {
            return Err(BucketNameError::Length(value.to_string()));
        }

        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.".contains(*c)))
        {
            return Err(BucketNameError::InvalidChar(c));
        }

        let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        if !value.starts_with(alnum) || !value.ends_with(alnum) {
            return Err(BucketNameError::Boundary(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    /// Bucket that serves the static site `site`.
    pub fn for_site(prefix: &str, site: &ServiceName) -> Result<Self, BucketNameError> {
        Self::new(&format!("{prefix}{site}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
