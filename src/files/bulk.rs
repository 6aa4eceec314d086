// ABOUTME: Concurrent upload and deletion of many objects in one bucket.
// ABOUTME: Every item is attempted; failures are collected and reported together.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::cloud::StorageOps;
use crate::types::BucketName;

/// One item of a bulk operation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub name: String,
    pub reason: String,
}

impl fmt::Display for BulkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{}", summary(.failures, *.succeeded))]
pub struct BulkError {
    pub failures: Vec<BulkFailure>,
    pub succeeded: usize,
}

fn summary(failures: &[BulkFailure], succeeded: usize) -> String {
    let total = failures.len() + succeeded;
    match failures.first() {
        Some(first) => format!("{} of {total} objects failed (first: {first})", failures.len()),
        None => format!("0 of {total} objects failed"),
    }
}

/// Object key for `file`: its path relative to `base`, `/`-separated, with no
/// leading slash. `None` if `file` does not live under `base`.
pub fn object_key(base: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Content type served for a file, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        Some("gz") => "application/gzip",
        _ => "application/octet-stream",
    }
}

/// Upload every file in `files` to `bucket`, keyed relative to `base`.
///
/// At most `concurrency` uploads are in flight. Returns the number uploaded.
pub async fn deploy_files<S>(
    store: &S,
    base: &Path,
    files: &[PathBuf],
    bucket: &BucketName,
    concurrency: usize,
) -> Result<usize, BulkError>
where
    S: StorageOps + ?Sized,
{
    let results: Vec<Result<String, BulkFailure>> = stream::iter(files)
        .map(|file| upload_one(store, base, file, bucket))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    finish("upload", results)
}

async fn upload_one<S>(
    store: &S,
    base: &Path,
    file: &Path,
    bucket: &BucketName,
) -> Result<String, BulkFailure>
where
    S: StorageOps + ?Sized,
{
    let Some(key) = object_key(base, file) else {
        return Err(BulkFailure {
            name: file.display().to_string(),
            reason: format!("not under {}", base.display()),
        });
    };

    let body = tokio::fs::read(file).await.map_err(|e| BulkFailure {
        name: key.clone(),
        reason: e.to_string(),
    })?;

    store
        .upload_object(bucket, &key, Bytes::from(body), content_type(file))
        .await
        .map_err(|e| BulkFailure {
            name: key.clone(),
            reason: e.to_string(),
        })?;

    debug!(bucket = %bucket, object = %key, "uploaded");
    Ok(key)
}

/// Delete every object in `names` from `bucket`.
///
/// At most `concurrency` deletions are in flight. Returns the number deleted.
pub async fn delete_files<S>(
    store: &S,
    names: &[String],
    bucket: &BucketName,
    concurrency: usize,
) -> Result<usize, BulkError>
where
    S: StorageOps + ?Sized,
{
    let results: Vec<Result<String, BulkFailure>> = stream::iter(names)
        .map(|name| async move {
            store
                .delete_object(bucket, name)
                .await
                .map(|()| name.clone())
                .map_err(|e| BulkFailure {
                    name: name.clone(),
                    reason: e.to_string(),
                })
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    finish("delete", results)
}

fn finish(action: &str, results: Vec<Result<String, BulkFailure>>) -> Result<usize, BulkError> {
    let mut succeeded = 0;
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(_) => succeeded += 1,
            Err(failure) => {
                warn!(object = %failure.name, reason = %failure.reason, "{action} failed");
                failures.push(failure);
            }
        }
    }

    if failures.is_empty() {
        Ok(succeeded)
    } else {
        failures.sort_by(|a, b| a.name.cmp(&b.name));
        Err(BulkError {
            failures,
            succeeded,
        })
    }
}
