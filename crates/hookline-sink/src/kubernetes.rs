//! Kubernetes job sink.

use async_trait::async_trait;
use hookline_core::run::{GROUP, IntegrationJob, KIND, VERSION};
use hookline_core::{Error, JobSink, Result};
use kube::Client;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, PostParams};
use tracing::info;

/// Creates `IntegrationJob` custom resources through the Kubernetes API.
///
/// The resource definition and the controller that runs the jobs are
/// installed separately.
pub struct KubernetesSink {
    client: Client,
    resource: ApiResource,
}

impl KubernetesSink {
    /// Connect using the ambient kubeconfig or in-cluster service account.
    pub async fn new() -> Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| Error::Sink(format!("failed to connect to Kubernetes: {}", e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            resource: integration_job_resource(),
        }
    }
}

fn integration_job_resource() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(GROUP, VERSION, KIND))
}

/// Custom resource body for `job`.
pub fn to_dynamic_object(job: &IntegrationJob, resource: &ApiResource) -> Result<DynamicObject> {
    let spec = serde_json::to_value(&job.spec)
        .map_err(|e| Error::Internal(format!("failed to encode job spec: {}", e)))?;

    let mut object = DynamicObject::new(&job.metadata.name, resource)
        .within(&job.metadata.namespace)
        .data(serde_json::json!({ "spec": spec }));
    object.metadata.labels = Some(job.metadata.labels.clone());
    Ok(object)
}

fn map_kube_error(job: &IntegrationJob, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => Error::Conflict(format!(
            "integration job {}/{} already exists",
            job.metadata.namespace, job.metadata.name
        )),
        other => Error::Sink(other.to_string()),
    }
}

#[async_trait]
impl JobSink for KubernetesSink {
    fn name(&self) -> &'static str {
        "kubernetes"
    }

    async fn create(&self, job: &IntegrationJob) -> Result<()> {
        let object = to_dynamic_object(job, &self.resource)?;
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &job.metadata.namespace, &self.resource);

        api.create(&PostParams::default(), &object)
            .await
            .map_err(|e| map_kube_error(job, e))?;

        info!(
            namespace = %job.metadata.namespace,
            name = %job.metadata.name,
            "Created IntegrationJob resource"
        );
        Ok(())
    }
}
