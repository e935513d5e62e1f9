use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{PersistentVolumeClaim, Pod, Secret},
};
use kube::{
    Api,
    api::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
};
use snafu::ResultExt;

use crate::cluster::{Cluster, Error, Outcome, PodMetrics, error};

const STATUS_FORBIDDEN: u16 = 403;
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_CONFLICT: u16 = 409;

/// A [`Cluster`] backed by a live API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: kube::Client,
}

impl KubeCluster {
    #[must_use]
    pub const fn new(client: kube::Client) -> Self { Self { client } }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> { Api::namespaced(self.client.clone(), namespace) }

    fn claims(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn status_code(err: &kube::Error) -> Option<u16> {
    match err {
        kube::Error::Api(response) => Some(response.code),
        _ => None,
    }
}

/// Maps 403 responses to [`Error::Forbidden`] so RBAC problems read clearly,
/// leaving every other failure to the caller.
fn forbidden(
    err: kube::Error,
    operation: &'static str,
    namespace: &str,
    name: &str,
) -> Result<Error, kube::Error> {
    match err {
        kube::Error::Api(ref response) if response.code == STATUS_FORBIDDEN => {
            Ok(Error::Forbidden {
                operation,
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: response.message.clone(),
            })
        }
        err => Err(err),
    }
}

fn list_params(label_selector: Option<&str>) -> ListParams {
    ListParams { label_selector: label_selector.map(ToString::to_string), ..ListParams::default() }
}

impl Cluster for KubeCluster {
    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, Error> {
        self.deployments(namespace).get_opt(name).await.with_context(|_| {
            error::GetDeploymentSnafu { namespace: namespace.to_string(), name: name.to_string() }
        })
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Deployment>, Error> {
        let list = self
            .deployments(namespace)
            .list(&list_params(label_selector))
            .await
            .with_context(|_| error::ListDeploymentsSnafu { namespace: namespace.to_string() })?;
        Ok(list.items)
    }

    async fn create_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), Error> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        match self.deployments(namespace).create(&PostParams::default(), deployment).await {
            Ok(_created) => Ok(()),
            Err(err) if status_code(&err) == Some(STATUS_CONFLICT) => {
                error::AlreadyExistsSnafu { kind: "Deployment", namespace, name }.fail()
            }
            Err(err) => Err(forbidden(err, "create deployment", namespace, &name)
                .unwrap_or_else(|source| Error::CreateDeployment {
                    namespace: namespace.to_string(),
                    name,
                    source: Box::new(source),
                })),
        }
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        match self.deployments(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_response) => Ok(Outcome::Applied),
            Err(err) if status_code(&err) == Some(STATUS_NOT_FOUND) => Ok(Outcome::NotFound),
            Err(err) => Err(forbidden(err, "delete deployment", namespace, name).unwrap_or_else(
                |source| Error::DeleteDeployment {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source: Box::new(source),
                },
            )),
        }
    }

    async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<Outcome, Error> {
        let patch = serde_json::json!({ "spec": { "replicas": replicas } });
        let patched = self
            .deployments(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await;
        match patched {
            Ok(_patched) => Ok(Outcome::Applied),
            Err(err) if status_code(&err) == Some(STATUS_NOT_FOUND) => Ok(Outcome::NotFound),
            Err(err) => Err(forbidden(err, "scale deployment", namespace, name).unwrap_or_else(
                |source| Error::ScaleDeployment {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source: Box::new(source),
                },
            )),
        }
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<(), Error> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        match self.secrets(namespace).create(&PostParams::default(), secret).await {
            Ok(_created) => Ok(()),
            Err(err) if status_code(&err) == Some(STATUS_CONFLICT) => {
                error::AlreadyExistsSnafu { kind: "Secret", namespace, name }.fail()
            }
            Err(err) => Err(forbidden(err, "create secret", namespace, &name).unwrap_or_else(
                |source| Error::CreateSecret {
                    namespace: namespace.to_string(),
                    name,
                    source: Box::new(source),
                },
            )),
        }
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        match self.secrets(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_response) => Ok(Outcome::Applied),
            Err(err) if status_code(&err) == Some(STATUS_NOT_FOUND) => Ok(Outcome::NotFound),
            Err(err) => Err(forbidden(err, "delete secret", namespace, name).unwrap_or_else(
                |source| Error::DeleteSecret {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source: Box::new(source),
                },
            )),
        }
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, Error> {
        let list = self
            .pods(namespace)
            .list(&list_params(label_selector))
            .await
            .with_context(|_| error::ListPodsSnafu { namespace: namespace.to_string() })?;
        Ok(list.items)
    }

    async fn list_pod_metrics(&self, namespace: &str) -> Result<Vec<PodMetrics>, Error> {
        let list = Api::<PodMetrics>::namespaced(self.client.clone(), namespace)
            .list(&ListParams::default())
            .await
            .with_context(|_| error::ListPodMetricsSnafu { namespace: namespace.to_string() })?;
        Ok(list.items)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        match self.pods(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_response) => Ok(Outcome::Applied),
            Err(err) if status_code(&err) == Some(STATUS_NOT_FOUND) => Ok(Outcome::NotFound),
            Err(err) => Err(forbidden(err, "delete pod", namespace, name).unwrap_or_else(
                |source| Error::DeletePod {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source: Box::new(source),
                },
            )),
        }
    }

    async fn annotate_pod(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<Outcome, Error> {
        let patch = serde_json::json!({ "metadata": { "annotations": { key: value } } });
        let patched =
            self.pods(namespace).patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await;
        match patched {
            Ok(_patched) => Ok(Outcome::Applied),
            Err(err) if status_code(&err) == Some(STATUS_NOT_FOUND) => Ok(Outcome::NotFound),
            Err(err) => Err(forbidden(err, "annotate pod", namespace, name).unwrap_or_else(
                |source| Error::AnnotatePod {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source: Box::new(source),
                },
            )),
        }
    }

    async fn create_pvc(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> Result<(), Error> {
        let name = claim.metadata.name.clone().unwrap_or_default();
        match self.claims(namespace).create(&PostParams::default(), claim).await {
            Ok(_created) => Ok(()),
            Err(err) if status_code(&err) == Some(STATUS_CONFLICT) => {
                error::AlreadyExistsSnafu { kind: "PersistentVolumeClaim", namespace, name }.fail()
            }
            Err(err) => Err(forbidden(err, "create persistent volume claim", namespace, &name)
                .unwrap_or_else(|source| Error::CreatePvc {
                    namespace: namespace.to_string(),
                    name,
                    source: Box::new(source),
                })),
        }
    }

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>, Error> {
        self.claims(namespace).get_opt(name).await.with_context(|_| error::GetPvcSnafu {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<Outcome, Error> {
        match self.claims(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_response) => Ok(Outcome::Applied),
            Err(err) if status_code(&err) == Some(STATUS_NOT_FOUND) => Ok(Outcome::NotFound),
            Err(err) => Err(forbidden(err, "delete persistent volume claim", namespace, name)
                .unwrap_or_else(|source| Error::DeletePvc {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    source: Box::new(source),
                })),
        }
    }
}
