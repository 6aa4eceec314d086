// ABOUTME: In-memory stand-in for the cloud provider used by pipeline tests.
// ABOUTME: Records every call and fails chosen methods or operation kinds on demand.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};

use rollout::cloud::{
    BuildError, BuildOps, BuildRequest, ComputeError, NetworkOps, OperationError, OperationHandle,
    OperationKind, OperationOps, OperationState, ProviderOperation, RouteTable, ServiceError,
    ServiceOps, ServiceSpec, StorageError, StorageOps, WebsiteConfig,
};
use rollout::types::{BucketName, ResourceLink, ServiceName};

pub const ARTIFACT_BUCKET: &str = "acme-artifacts";

/// A stored object: body and content type.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// Everything the fake has seen and stored.
#[derive(Debug, Default)]
pub struct CloudState {
    pub calls: Vec<String>,
    pub buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    pub public_buckets: BTreeSet<String>,
    pub websites: BTreeMap<String, WebsiteConfig>,
    pub builds: Vec<BuildRequest>,
    pub services: BTreeMap<String, ServiceSpec>,
    pub public_services: BTreeSet<String>,
    pub backends: BTreeMap<String, ResourceLink>,
    pub route_table: RouteTable,
    pub route_version: u32,
    /// Writes by another client to slip in before the next patches.
    pub concurrent_writes: u32,
    failing: HashSet<&'static str>,
    failing_operations: HashSet<OperationKind>,
    next_operation: u32,
}

impl CloudState {
    fn operation(&mut self, kind: OperationKind) -> OperationHandle {
        self.next_operation += 1;
        OperationHandle::new(kind, format!("operation-{}", self.next_operation))
    }
}

/// Provider fake holding all state behind one lock.
#[derive(Debug)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    /// A fake with the artifact bucket already present.
    pub fn new() -> Self {
        let mut state = CloudState::default();
        state
            .buckets
            .insert(ARTIFACT_BUCKET.to_string(), BTreeMap::new());
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock()
    }

    /// Make every call to `method` fail.
    pub fn fail_on(&self, method: &'static str) {
        self.state.lock().failing.insert(method);
    }

    /// Report every operation of `kind` as failed when polled.
    pub fn fail_operations(&self, kind: OperationKind) {
        self.state.lock().failing_operations.insert(kind);
    }

    /// Create `bucket` holding `objects`.
    pub fn seed_bucket(&self, bucket: &str, objects: &[&str]) {
        let contents = objects
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    StoredObject {
                        body: Bytes::from_static(b"old"),
                        content_type: "text/plain".to_string(),
                    },
                )
            })
            .collect();
        self.state.lock().buckets.insert(bucket.to_string(), contents);
    }

    /// Register an already running service.
    pub fn seed_service(&self, spec: ServiceSpec) {
        self.state
            .lock()
            .services
            .insert(spec.name.to_string(), spec);
    }

    /// Make the next `count` route table patches lose a race.
    pub fn inject_route_conflicts(&self, count: u32) {
        self.state.lock().concurrent_writes = count;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.state.lock().calls.iter().any(|c| c == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == method).count()
    }

    /// Object names in `bucket`, sorted. Empty if the bucket does not exist.
    pub fn objects(&self, bucket: &str) -> Vec<String> {
        self.state
            .lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Record the call and report whether it should fail.
    fn enter(&self, method: &'static str) -> (MutexGuard<'_, CloudState>, bool) {
        let mut state = self.state.lock();
        state.calls.push(method.to_string());
        let fail = state.failing.contains(method);
        (state, fail)
    }
}

fn injected(method: &str) -> String {
    format!("injected {method} failure")
}

#[async_trait]
impl StorageOps for FakeCloud {
    async fn upload_object(
        &self,
        bucket: &BucketName,
        name: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let (mut state, fail) = self.enter("upload_object");
        if fail {
            return Err(StorageError::Request(injected("upload_object")));
        }
        let objects = state
            .buckets
            .get_mut(bucket.as_str())
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))?;
        objects.insert(
            name.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &BucketName, name: &str) -> Result<(), StorageError> {
        let (mut state, fail) = self.enter("delete_object");
        if fail {
            return Err(StorageError::Request(injected("delete_object")));
        }
        state
            .buckets
            .get_mut(bucket.as_str())
            .and_then(|objects| objects.remove(name))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("{bucket}/{name}")))
    }

    async fn list_objects(&self, bucket: &BucketName) -> Result<Vec<String>, StorageError> {
        let (state, fail) = self.enter("list_objects");
        if fail {
            return Err(StorageError::Request(injected("list_objects")));
        }
        state
            .buckets
            .get(bucket.as_str())
            .map(|objects| objects.keys().cloned().collect())
            .ok_or_else(|| StorageError::NotFound(bucket.to_string()))
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), StorageError> {
        let (mut state, fail) = self.enter("create_bucket");
        if fail {
            return Err(StorageError::Request(injected("create_bucket")));
        }
        if state.buckets.contains_key(bucket.as_str()) {
            return Err(StorageError::AlreadyExists(bucket.to_string()));
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn make_bucket_public(&self, bucket: &BucketName) -> Result<(), StorageError> {
        let (mut state, fail) = self.enter("make_bucket_public");
        if fail {
            return Err(StorageError::PermissionDenied(injected("make_bucket_public")));
        }
        if !state.buckets.contains_key(bucket.as_str()) {
            return Err(StorageError::NotFound(bucket.to_string()));
        }
        state.public_buckets.insert(bucket.to_string());
        Ok(())
    }

    async fn set_website(
        &self,
        bucket: &BucketName,
        website: &WebsiteConfig,
    ) -> Result<(), StorageError> {
        let (mut state, fail) = self.enter("set_website");
        if fail {
            return Err(StorageError::Request(injected("set_website")));
        }
        if !state.buckets.contains_key(bucket.as_str()) {
            return Err(StorageError::NotFound(bucket.to_string()));
        }
        state.websites.insert(bucket.to_string(), website.clone());
        Ok(())
    }
}

#[async_trait]
impl BuildOps for FakeCloud {
    async fn submit_build(&self, request: &BuildRequest) -> Result<OperationHandle, BuildError> {
        let (mut state, fail) = self.enter("submit_build");
        if fail {
            return Err(BuildError::Rejected(injected("submit_build")));
        }
        let source_exists = state
            .buckets
            .get(request.source.bucket.as_str())
            .is_some_and(|objects| objects.contains_key(request.source.name.as_str()));
        if !source_exists {
            return Err(BuildError::Rejected(format!(
                "source {} not found",
                request.source
            )));
        }
        state.builds.push(request.clone());
        Ok(state.operation(OperationKind::Build))
    }
}

#[async_trait]
impl ServiceOps for FakeCloud {
    async fn create_service(&self, spec: &ServiceSpec) -> Result<OperationHandle, ServiceError> {
        let (mut state, fail) = self.enter("create_service");
        if fail {
            return Err(ServiceError::Request(injected("create_service")));
        }
        if state.services.contains_key(spec.name.as_str()) {
            return Err(ServiceError::AlreadyExists(spec.name.to_string()));
        }
        state.services.insert(spec.name.to_string(), spec.clone());
        Ok(state.operation(OperationKind::Run))
    }

    async fn update_service(&self, spec: &ServiceSpec) -> Result<OperationHandle, ServiceError> {
        let (mut state, fail) = self.enter("update_service");
        if fail {
            return Err(ServiceError::Request(injected("update_service")));
        }
        if !state.services.contains_key(spec.name.as_str()) {
            return Err(ServiceError::NotFound(spec.name.to_string()));
        }
        state.services.insert(spec.name.to_string(), spec.clone());
        Ok(state.operation(OperationKind::Run))
    }

    async fn allow_public_access(&self, name: &ServiceName) -> Result<(), ServiceError> {
        let (mut state, fail) = self.enter("allow_public_access");
        if fail {
            return Err(ServiceError::PermissionDenied(injected("allow_public_access")));
        }
        if !state.services.contains_key(name.as_str()) {
            return Err(ServiceError::NotFound(name.to_string()));
        }
        state.public_services.insert(name.to_string());
        Ok(())
    }
}

#[async_trait]
impl NetworkOps for FakeCloud {
    async fn create_endpoint(&self, name: &ServiceName) -> Result<ProviderOperation, ComputeError> {
        let (mut state, fail) = self.enter("create_endpoint");
        if fail {
            return Err(ComputeError::Request(injected("create_endpoint")));
        }
        Ok(ProviderOperation {
            handle: state.operation(OperationKind::Regional),
            target: ResourceLink::new(format!(
                "https://compute/regions/us-central1/networkEndpointGroups/{name}"
            )),
        })
    }

    async fn create_backend_service(
        &self,
        name: &ServiceName,
        _endpoint: &ResourceLink,
    ) -> Result<ProviderOperation, ComputeError> {
        let (mut state, fail) = self.enter("create_backend_service");
        if fail {
            return Err(ComputeError::Request(injected("create_backend_service")));
        }
        let target = ResourceLink::new(format!("https://compute/global/backendServices/{name}"));
        state.backends.insert(name.to_string(), target.clone());
        Ok(ProviderOperation {
            handle: state.operation(OperationKind::Global),
            target,
        })
    }

    async fn create_backend_bucket(
        &self,
        name: &ServiceName,
        _bucket: &BucketName,
    ) -> Result<ProviderOperation, ComputeError> {
        let (mut state, fail) = self.enter("create_backend_bucket");
        if fail {
            return Err(ComputeError::Request(injected("create_backend_bucket")));
        }
        let target = ResourceLink::new(format!("https://compute/global/backendBuckets/{name}"));
        state.backends.insert(name.to_string(), target.clone());
        Ok(ProviderOperation {
            handle: state.operation(OperationKind::Global),
            target,
        })
    }

    async fn get_route_table(&self, _load_balancer: &str) -> Result<RouteTable, ComputeError> {
        let (state, fail) = self.enter("get_route_table");
        if fail {
            return Err(ComputeError::Request(injected("get_route_table")));
        }
        let mut table = state.route_table.clone();
        table.fingerprint = Some(format!("v{}", state.route_version));
        Ok(table)
    }

    async fn patch_route_table(
        &self,
        load_balancer: &str,
        table: &RouteTable,
    ) -> Result<ProviderOperation, ComputeError> {
        let (mut state, fail) = self.enter("patch_route_table");
        if fail {
            return Err(ComputeError::Request(injected("patch_route_table")));
        }
        if state.concurrent_writes > 0 {
            state.concurrent_writes -= 1;
            state.route_version += 1;
        }
        let current = format!("v{}", state.route_version);
        if table.fingerprint.as_deref() != Some(current.as_str()) {
            return Err(ComputeError::Conflict(format!(
                "fingerprint {:?} is stale",
                table.fingerprint
            )));
        }
        let mut stored = table.clone();
        stored.fingerprint = None;
        state.route_table = stored;
        state.route_version += 1;
        Ok(ProviderOperation {
            handle: state.operation(OperationKind::Global),
            target: ResourceLink::new(format!("https://compute/global/urlMaps/{load_balancer}")),
        })
    }
}

#[async_trait]
impl OperationOps for FakeCloud {
    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationState, OperationError> {
        let mut state = self.state.lock();
        state.calls.push(format!("poll:{}", handle.kind));
        if state.failing_operations.contains(&handle.kind) {
            return Ok(OperationState::Failed {
                message: format!("injected {} operation failure", handle.kind),
            });
        }
        Ok(OperationState::Done)
    }
}
