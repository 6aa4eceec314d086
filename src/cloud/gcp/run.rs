// ABOUTME: ServiceOps over the Cloud Run Admin API v2.
// ABOUTME: Services only accept traffic from the load balancer; invocation is made public via IAM.

use super::client::{GcpClient, RUN_API};
use super::error::map_service_error;
use super::iam::{ALL_USERS, IamPolicy};
use super::operations::LongRunningOperation;
use crate::cloud::traits::{OperationHandle, OperationKind, ServiceError, ServiceOps, ServiceSpec};
use crate::types::{EnvVar, ServiceName};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

const INGRESS: &str = "INGRESS_TRAFFIC_INTERNAL_LOAD_BALANCER";
const INVOKER_ROLE: &str = "roles/run.invoker";

#[derive(Debug, Serialize)]
struct ServiceBody<'a> {
    ingress: &'static str,
    template: RevisionTemplate<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RevisionTemplate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    service_account: Option<&'a str>,
    containers: Vec<Container<'a>>,
}

#[derive(Debug, Serialize)]
struct Container<'a> {
    image: String,
    env: &'a [EnvVar],
}

impl<'a> ServiceBody<'a> {
    fn new(spec: &'a ServiceSpec, service_account: Option<&'a str>) -> Self {
        Self {
            ingress: INGRESS,
            template: RevisionTemplate {
                service_account,
                containers: vec![Container {
                    image: spec.image.to_string(),
                    env: &spec.env,
                }],
            },
        }
    }
}

impl GcpClient {
    fn service_resource(&self, name: &ServiceName) -> String {
        format!("{}/services/{}", self.run_parent(), name)
    }
}

#[async_trait]
impl ServiceOps for GcpClient {
    async fn create_service(&self, spec: &ServiceSpec) -> Result<OperationHandle, ServiceError> {
        let url = format!("{RUN_API}/{}/services", self.run_parent());
        let body = ServiceBody::new(spec, self.service_account.as_deref());
        let request = self
            .http
            .post(url)
            .query(&[("serviceId", spec.name.as_str())])
            .json(&body);

        let operation: LongRunningOperation = self
            .send_json(request)
            .await
            .map_err(|e| map_service_error(e, spec.name.as_str()))?;

        debug!(service = %spec.name, operation = %operation.name, "service creation started");
        Ok(OperationHandle::new(OperationKind::Run, operation.name))
    }

    async fn update_service(&self, spec: &ServiceSpec) -> Result<OperationHandle, ServiceError> {
        let url = format!("{RUN_API}/{}", self.service_resource(&spec.name));
        let body = ServiceBody::new(spec, self.service_account.as_deref());

        let operation: LongRunningOperation = self
            .send_json(self.http.patch(url).json(&body))
            .await
            .map_err(|e| map_service_error(e, spec.name.as_str()))?;

        debug!(service = %spec.name, operation = %operation.name, "service update started");
        Ok(OperationHandle::new(OperationKind::Run, operation.name))
    }

    async fn allow_public_access(&self, name: &ServiceName) -> Result<(), ServiceError> {
        let resource = format!("{RUN_API}/{}", self.service_resource(name));

        let mut policy: IamPolicy = self
            .send_json(self.http.get(format!("{resource}:getIamPolicy")))
            .await
            .map_err(|e| map_service_error(e, name.as_str()))?;

        if !policy.grant(INVOKER_ROLE, ALL_USERS) {
            debug!(service = %name, "service already public");
            return Ok(());
        }

        let request = self
            .http
            .post(format!("{resource}:setIamPolicy"))
            .json(&json!({ "policy": policy }));
        self.send_empty(request)
            .await
            .map_err(|e| map_service_error(e, name.as_str()))
    }
}
