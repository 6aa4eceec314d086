// ABOUTME: NetworkOps over the Compute Engine API.
// ABOUTME: Serverless endpoints, backend services and buckets, and URL map read/patch.

use super::client::GcpClient;
use super::error::map_compute_error;
use super::operations::ComputeOperation;
use crate::cloud::RouteTable;
use crate::cloud::traits::{
    ComputeError, NetworkOps, OperationHandle, OperationKind, ProviderOperation,
};
use crate::types::{BucketName, ResourceLink, ServiceName};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

fn endpoint_body(name: &ServiceName) -> Value {
    json!({
        "name": name.as_str(),
        "networkEndpointType": "SERVERLESS",
        "cloudRun": { "service": name.as_str() },
    })
}

fn backend_service_body(name: &ServiceName, endpoint: &ResourceLink) -> Value {
    json!({
        "name": name.as_str(),
        "loadBalancingScheme": "EXTERNAL_MANAGED",
        "backends": [{ "group": endpoint.as_str() }],
    })
}

fn backend_bucket_body(name: &ServiceName, bucket: &BucketName) -> Value {
    json!({
        "name": name.as_str(),
        "bucketName": bucket.as_str(),
    })
}

/// Pair an insert operation with the resource it creates.
///
/// Inserts normally report `targetLink`; `fallback` is the resource's own URL.
fn accepted(
    operation: ComputeOperation,
    kind: OperationKind,
    fallback: String,
) -> ProviderOperation {
    let target = operation.target_link.unwrap_or(fallback);
    ProviderOperation {
        handle: OperationHandle::new(kind, operation.name),
        target: ResourceLink::new(target),
    }
}

#[async_trait]
impl NetworkOps for GcpClient {
    async fn create_endpoint(&self, name: &ServiceName) -> Result<ProviderOperation, ComputeError> {
        let url = format!("{}/networkEndpointGroups", self.compute_regional());
        let resource = format!("network endpoint group {name}");

        let operation: ComputeOperation = self
            .send_json(self.http.post(&url).json(&endpoint_body(name)))
            .await
            .map_err(|e| map_compute_error(e, &resource))?;

        debug!(endpoint = %name, operation = %operation.name, "endpoint insert accepted");
        Ok(accepted(
            operation,
            OperationKind::Regional,
            format!("{url}/{name}"),
        ))
    }

    async fn create_backend_service(
        &self,
        name: &ServiceName,
        endpoint: &ResourceLink,
    ) -> Result<ProviderOperation, ComputeError> {
        let url = format!("{}/backendServices", self.compute_global());
        let resource = format!("backend service {name}");

        let operation: ComputeOperation = self
            .send_json(self.http.post(&url).json(&backend_service_body(name, endpoint)))
            .await
            .map_err(|e| map_compute_error(e, &resource))?;

        debug!(backend = %name, operation = %operation.name, "backend service insert accepted");
        Ok(accepted(
            operation,
            OperationKind::Global,
            format!("{url}/{name}"),
        ))
    }

    async fn create_backend_bucket(
        &self,
        name: &ServiceName,
        bucket: &BucketName,
    ) -> Result<ProviderOperation, ComputeError> {
        let url = format!("{}/backendBuckets", self.compute_global());
        let resource = format!("backend bucket {name}");

        let operation: ComputeOperation = self
            .send_json(self.http.post(&url).json(&backend_bucket_body(name, bucket)))
            .await
            .map_err(|e| map_compute_error(e, &resource))?;

        debug!(backend = %name, bucket = %bucket, operation = %operation.name, "backend bucket insert accepted");
        Ok(accepted(
            operation,
            OperationKind::Global,
            format!("{url}/{name}"),
        ))
    }

    async fn get_route_table(&self, load_balancer: &str) -> Result<RouteTable, ComputeError> {
        let url = format!("{}/urlMaps/{load_balancer}", self.compute_global());
        let resource = format!("url map {load_balancer}");

        let table: RouteTable = self
            .send_json(self.http.get(url))
            .await
            .map_err(|e| map_compute_error(e, &resource))?;

        debug!(
            load_balancer,
            matchers = table.path_matchers.len(),
            fingerprint = ?table.fingerprint,
            "read url map"
        );
        Ok(table)
    }

    async fn patch_route_table(
        &self,
        load_balancer: &str,
        table: &RouteTable,
    ) -> Result<ProviderOperation, ComputeError> {
        let url = format!("{}/urlMaps/{load_balancer}", self.compute_global());
        let resource = format!("url map {load_balancer}");

        let operation: ComputeOperation = self
            .send_json(self.http.patch(&url).json(table))
            .await
            .map_err(|e| map_compute_error(e, &resource))?;

        Ok(accepted(operation, OperationKind::Global, url))
    }
}
