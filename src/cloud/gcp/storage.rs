// ABOUTME: StorageOps over the Cloud Storage JSON API.
// ABOUTME: Media uploads, paginated listing, bucket creation, public access and website config.

use super::client::{GcpClient, STORAGE_API, STORAGE_UPLOAD_API};
use super::error::map_storage_error;
use super::iam::{ALL_USERS, IamPolicy};
use crate::cloud::traits::{StorageError, StorageOps, WebsiteConfig};
use crate::types::BucketName;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const PUBLIC_READ_ROLE: &str = "roles/storage.objectViewer";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

fn object_url(bucket: &BucketName, name: &str) -> String {
    format!(
        "{STORAGE_API}/b/{}/o/{}",
        bucket,
        urlencoding::encode(name)
    )
}

fn upload_url(bucket: &BucketName, name: &str) -> String {
    format!(
        "{STORAGE_UPLOAD_API}/b/{}/o?uploadType=media&name={}",
        bucket,
        urlencoding::encode(name)
    )
}

#[async_trait]
impl StorageOps for GcpClient {
    async fn upload_object(
        &self,
        bucket: &BucketName,
        name: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let request = self
            .http
            .post(upload_url(bucket, name))
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send_empty(request)
            .await
            .map_err(|e| map_storage_error(e, &format!("upload {bucket}/{name}")))
    }

    async fn delete_object(&self, bucket: &BucketName, name: &str) -> Result<(), StorageError> {
        let request = self.http.delete(object_url(bucket, name));
        self.send_empty(request)
            .await
            .map_err(|e| map_storage_error(e, &format!("delete {bucket}/{name}")))
    }

    async fn list_objects(&self, bucket: &BucketName) -> Result<Vec<String>, StorageError> {
        let url = format!("{STORAGE_API}/b/{bucket}/o");
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("fields", "items(name),nextPageToken")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ObjectList = self
                .send_json(request)
                .await
                .map_err(|e| map_storage_error(e, &format!("list {bucket}")))?;
            names.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(bucket = %bucket, count = names.len(), "listed objects");
        Ok(names)
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), StorageError> {
        let request = self
            .http
            .post(format!("{STORAGE_API}/b"))
            .query(&[("project", &self.project)])
            .json(&json!({ "name": bucket.as_str(), "location": self.region }));
        self.send_empty(request)
            .await
            .map_err(|e| map_storage_error(e, &format!("create bucket {bucket}")))
    }

    async fn make_bucket_public(&self, bucket: &BucketName) -> Result<(), StorageError> {
        let url = format!("{STORAGE_API}/b/{bucket}/iam");
        let what = format!("bucket policy {bucket}");

        let mut policy: IamPolicy = self
            .send_json(self.http.get(&url))
            .await
            .map_err(|e| map_storage_error(e, &what))?;

        if !policy.grant(PUBLIC_READ_ROLE, ALL_USERS) {
            debug!(bucket = %bucket, "bucket already public");
            return Ok(());
        }

        self.send_empty(self.http.put(&url).json(&policy))
            .await
            .map_err(|e| map_storage_error(e, &what))
    }

    async fn set_website(
        &self,
        bucket: &BucketName,
        website: &WebsiteConfig,
    ) -> Result<(), StorageError> {
        let request = self
            .http
            .patch(format!("{STORAGE_API}/b/{bucket}"))
            .json(&json!({ "website": website }));
        self.send_empty(request)
            .await
            .map_err(|e| map_storage_error(e, &format!("website {bucket}")))
    }
}
