// ABOUTME: Authenticated HTTP client shared by every Google API implementation.
// ABOUTME: Holds project, region and token; sends requests and decodes error envelopes.

use super::error::ApiError;
use crate::config::Settings;
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

pub(super) const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1";
pub(super) const STORAGE_UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1";
pub(super) const BUILD_API: &str = "https://cloudbuild.googleapis.com/v1";
pub(super) const RUN_API: &str = "https://run.googleapis.com/v2";
pub(super) const COMPUTE_API: &str = "https://compute.googleapis.com/compute/v1";

/// Google Cloud provider speaking the public REST APIs.
///
/// One client implements every cloud trait; construct it once per run.
pub struct GcpClient {
    pub(super) http: Client,
    token: String,
    pub(super) project: String,
    pub(super) region: String,
    pub(super) service_account: Option<String>,
}

impl GcpClient {
    /// Build a client from settings, resolving the access token.
    pub fn new(settings: &Settings) -> Result<Self> {
        let token = settings.access_token.resolve()?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("rollout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            http,
            token,
            project: settings.project.clone(),
            region: settings.region.clone(),
            service_account: settings.service_account.clone(),
        })
    }

    /// Send a request and decode its JSON response.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(ApiError::transport)
    }

    /// Send a request whose response body is not needed.
    pub(super) async fn send_empty(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<(), ApiError> {
        let response = self.send(request).await?;
        // Drain the body so the connection can be reused.
        let _ = response.bytes().await;
        Ok(())
    }

    async fn send(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<reqwest::Response, ApiError> {
        let request = request
            .bearer_auth(&self.token)
            .build()
            .map_err(ApiError::transport)?;
        debug!(method = %request.method(), url = %request.url(), "google api request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(ApiError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status.as_u16(), &body))
    }

    /// `projects/{project}/locations/{region}`, the Cloud Run parent.
    pub(super) fn run_parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.region)
    }

    /// Base URL for global compute resources of the project.
    pub(super) fn compute_global(&self) -> String {
        format!("{COMPUTE_API}/projects/{}/global", self.project)
    }

    /// Base URL for compute resources in the configured region.
    pub(super) fn compute_regional(&self) -> String {
        format!(
            "{COMPUTE_API}/projects/{}/regions/{}",
            self.project, self.region
        )
    }
}
