// ABOUTME: Provider settings: project, region, buckets, load balancer and polling budgets.
// ABOUTME: Loaded from rollout.yml when present, otherwise from environment variables.

mod deserialize;
mod env_file;
mod env_value;
mod wait;

pub use env_file::{EnvFileError, load_env_file, parse_env_file};
pub use env_value::EnvValue;
pub use wait::WaitPolicy;

use crate::error::{Error, Result};
use crate::types::{BucketName, BucketNameError, ServiceName};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "rollout.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollout.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".rollout/config.yml";

/// Dotenv file loaded into the process environment before settings.
pub const DOTENV_FILENAME: &str = ".env";

/// Variables read by [`Settings::from_env`].
pub mod vars {
    pub const PROJECT: &str = "PROJECT_NAME";
    pub const REGION: &str = "DEFAULT_LOCATION";
    pub const ARTIFACT_BUCKET: &str = "DEFAULT_BUCKET_NAME";
    pub const ARTIFACT_PREFIX: &str = "DEPLOYMENT_BUCKET_NAME";
    pub const ARTIFACT_PATH: &str = "ARTIFACT_PATH";
    pub const IMAGE_REPOSITORY: &str = "DEPLOYMENT_REPOSITORY";
    pub const LOAD_BALANCER: &str = "DEFAULT_LOAD_BALANCER_NAME";
    pub const DOMAIN: &str = "ROUTE_DOMAIN";
    pub const SERVICE_ACCOUNT: &str = "DEFAULT_SERVICE_ACCOUNT";
    pub const SITE_BUCKET_PREFIX: &str = "SITE_BUCKET_PREFIX";
    pub const ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(deserialize_with = "deserialize::resolved")]
    pub project: String,

    #[serde(deserialize_with = "deserialize::resolved")]
    pub region: String,

    /// Bucket that receives source archives for image builds.
    #[serde(deserialize_with = "deserialize::resolved_bucket")]
    pub artifact_bucket: BucketName,

    #[serde(
        default = "default_artifact_prefix",
        deserialize_with = "deserialize::resolved"
    )]
    pub artifact_prefix: String,

    /// Image repository path, e.g. `us-docker.pkg.dev/project/deployments`.
    #[serde(deserialize_with = "deserialize::resolved")]
    pub image_repository: String,

    /// Name of the URL map every route is added to.
    #[serde(deserialize_with = "deserialize::resolved")]
    pub load_balancer: String,

    /// Services and sites are exposed as `<name>.<domain>`.
    #[serde(deserialize_with = "deserialize::resolved")]
    pub domain: String,

    #[serde(default, deserialize_with = "deserialize::resolved_option")]
    pub service_account: Option<String>,

    #[serde(
        default = "default_site_bucket_prefix",
        deserialize_with = "deserialize::resolved"
    )]
    pub site_bucket_prefix: String,

    #[serde(default = "default_access_token")]
    pub access_token: EnvValue,

    #[serde(default = "default_archive_exclude")]
    pub archive_exclude: Vec<String>,

    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    #[serde(default = "WaitPolicy::operations")]
    pub operation_wait: WaitPolicy,

    #[serde(default = "WaitPolicy::builds")]
    pub build_wait: WaitPolicy,

    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    #[serde(default = "default_route_attempts")]
    pub route_attempts: u32,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_artifact_prefix() -> String {
    "deployments".to_string()
}

fn default_site_bucket_prefix() -> String {
    "site-".to_string()
}

fn default_access_token() -> EnvValue {
    EnvValue::from_env(vars::ACCESS_TOKEN)
}

fn default_archive_exclude() -> Vec<String> {
    vec!["node_modules/**".to_string()]
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".prod.env")
}

fn default_upload_concurrency() -> usize {
    16
}

fn default_route_attempts() -> u32 {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load settings for a deployment run from `dir`.
    ///
    /// The first config file found wins; without one, settings are read from
    /// the process environment.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading settings from {}", path.display());
                return Self::load(path);
            }
        }

        tracing::debug!("No config file in {}, reading environment", dir.display());
        Self::from_env()
    }

    /// Build settings from the variables listed in [`vars`].
    pub fn from_env() -> Result<Self> {
        let artifact_bucket = required(vars::ARTIFACT_BUCKET)?;
        let artifact_bucket = BucketName::new(&artifact_bucket)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let image_repository = format!(
            "{}/{}",
            required(vars::ARTIFACT_PATH)?.trim_end_matches('/'),
            required(vars::IMAGE_REPOSITORY)?
        );

        let settings = Settings {
            project: required(vars::PROJECT)?,
            region: required(vars::REGION)?,
            artifact_bucket,
            artifact_prefix: optional(vars::ARTIFACT_PREFIX)
                .unwrap_or_else(default_artifact_prefix),
            image_repository,
            load_balancer: required(vars::LOAD_BALANCER)?,
            domain: required(vars::DOMAIN)?,
            service_account: optional(vars::SERVICE_ACCOUNT),
            site_bucket_prefix: optional(vars::SITE_BUCKET_PREFIX)
                .unwrap_or_else(default_site_bucket_prefix),
            access_token: default_access_token(),
            archive_exclude: default_archive_exclude(),
            env_file: default_env_file(),
            operation_wait: WaitPolicy::operations(),
            build_wait: WaitPolicy::builds(),
            upload_concurrency: default_upload_concurrency(),
            route_attempts: default_route_attempts(),
            request_timeout: default_request_timeout(),
        };
        settings.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.upload_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "upload_concurrency must be at least 1".to_string(),
            ));
        }
        if self.route_attempts == 0 {
            return Err(Error::InvalidConfig(
                "route_attempts must be at least 1".to_string(),
            ));
        }
        if self.operation_wait.max_rounds == 0 || self.build_wait.max_rounds == 0 {
            return Err(Error::InvalidConfig(
                "wait policies need at least one round".to_string(),
            ));
        }
        Ok(self)
    }

    /// Exclusion patterns for files that configure rollout itself.
    ///
    /// These never leave the machine: they are kept out of source archives
    /// and site uploads. A relative `env_file` is included; an absolute one
    /// lives outside the source tree.
    pub fn private_files(&self) -> Vec<String> {
        let mut patterns = vec![
            DOTENV_FILENAME.to_string(),
            CONFIG_FILENAME.to_string(),
            CONFIG_FILENAME_ALT.to_string(),
            ".rollout/**".to_string(),
        ];
        if self.env_file.is_relative() {
            let env_file: Vec<String> = self
                .env_file
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            if !env_file.is_empty() {
                patterns.push(env_file.join("/"));
            }
        }
        patterns
    }

    /// Exclusion patterns for the backend source archive.
    pub fn archive_excludes(&self) -> Vec<String> {
        let mut patterns = self.archive_exclude.clone();
        patterns.extend(self.private_files());
        patterns
    }

    /// Bucket serving the static site `site`.
    pub fn site_bucket(&self, site: &ServiceName) -> std::result::Result<BucketName, BucketNameError> {
        BucketName::for_site(&self.site_bucket_prefix, site)
    }

    /// Object name for an uploaded source archive with the given unique stem.
    pub fn artifact_object(&self, stem: &str) -> String {
        let prefix = self.artifact_prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{stem}.tar.gz")
        } else {
            format!("{prefix}/{stem}.tar.gz")
        }
    }
}

fn required(var: &str) -> Result<String> {
    EnvValue::from_env(var).resolve()
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
