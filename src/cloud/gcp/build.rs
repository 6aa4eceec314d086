// ABOUTME: BuildOps over the Cloud Build API.
// ABOUTME: A single buildpacks step turns the uploaded source archive into an image.

use super::client::{BUILD_API, GcpClient};
use super::error::map_build_error;
use super::operations::LongRunningOperation;
use crate::cloud::traits::{
    BuildError, BuildOps, BuildRequest, OperationHandle, OperationKind,
};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

const PACK_IMAGE: &str = "gcr.io/k8s-skaffold/pack";
const BUILDER: &str = "gcr.io/buildpacks/builder";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildBody {
    source: BuildSource,
    steps: Vec<BuildStep>,
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildSource {
    storage_source: StorageSource,
}

#[derive(Debug, Serialize)]
struct StorageSource {
    bucket: String,
    object: String,
}

#[derive(Debug, Serialize)]
struct BuildStep {
    name: String,
    args: Vec<String>,
}

impl BuildBody {
    fn buildpacks(request: &BuildRequest) -> Self {
        let image = request.image.to_string();
        Self {
            source: BuildSource {
                storage_source: StorageSource {
                    bucket: request.source.bucket.to_string(),
                    object: request.source.name.to_string(),
                },
            },
            steps: vec![BuildStep {
                name: PACK_IMAGE.to_string(),
                args: ["pack", "build", image.as_str(), "--builder", BUILDER]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }],
            images: vec![image],
        }
    }
}

#[async_trait]
impl BuildOps for GcpClient {
    async fn submit_build(&self, request: &BuildRequest) -> Result<OperationHandle, BuildError> {
        let url = format!("{BUILD_API}/projects/{}/builds", self.project);
        let body = BuildBody::buildpacks(request);

        let operation: LongRunningOperation = self
            .send_json(self.http.post(url).json(&body))
            .await
            .map_err(map_build_error)?;

        debug!(operation = %operation.name, image = %request.image, "build submitted");
        Ok(OperationHandle::new(OperationKind::Build, operation.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::traits::ObjectRef;
    use crate::types::{BucketName, ImageRef, ObjectName};
    use serde_json::json;

    #[test]
    fn build_body_packs_the_storage_source() {
        let request = BuildRequest {
            source: ObjectRef {
                bucket: BucketName::new("acme-artifacts").unwrap(),
                name: ObjectName::new("deployments/abc.tar.gz"),
            },
            image: ImageRef::parse("us-docker.pkg.dev/acme/deployments/abc").unwrap(),
        };

        let body = serde_json::to_value(BuildBody::buildpacks(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "source": {"storageSource": {"bucket": "acme-artifacts", "object": "deployments/abc.tar.gz"}},
                "steps": [{
                    "name": "gcr.io/k8s-skaffold/pack",
                    "args": ["pack", "build", "us-docker.pkg.dev/acme/deployments/abc", "--builder", "gcr.io/buildpacks/builder"]
                }],
                "images": ["us-docker.pkg.dev/acme/deployments/abc"]
            })
        );
    }
}
